//! phpIPAM API models
//!
//! Read-only views of the records returned by the phpIPAM `lookup` API
//! application, and the output structures produced by the lookup operations.
//!
//! phpIPAM encodes most scalars as strings ("5", "1"), but not consistently
//! across versions, so identifiers and flags are decoded leniently.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Timestamp layout of `data.expires` in the authentication response
pub const TOKEN_EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Body of a successful `POST /api/lookup/user`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Token and its expiry; absent on malformed answers
    pub data: Option<TokenData>,
}

/// `data` member of the authentication response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenData {
    /// Opaque API token
    pub token: Option<String>,
    /// Expiry in the server's local time, without zone
    pub expires: Option<String>,
}

/// API token held by a session
///
/// phpIPAM reports the expiry as server wall-clock time with no zone, so it
/// is only meaningful relative to the moment the token was issued. The
/// remaining lifetime is taken at receipt and counted down on the monotonic
/// clock. An expiry that already lies in the past at receipt means the two
/// clocks disagree; such a token has no known lifetime and is only replaced
/// when phpIPAM rejects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires: Option<NaiveDateTime>,
    lifetime: Option<Duration>,
    received: Instant,
}

impl Token {
    /// Token received now, issued when the local clock read `issued_at`
    pub fn new(value: impl Into<String>, expires: Option<NaiveDateTime>, issued_at: NaiveDateTime) -> Self {
        let lifetime = expires
            .and_then(|expires| (expires - issued_at).to_std().ok())
            .filter(|lifetime| !lifetime.is_zero());

        Self {
            value: value.into(),
            expires,
            lifetime,
            received: Instant::now(),
        }
    }

    /// Build a token from the `data` object of the authentication response
    ///
    /// An unparseable expiry is treated as unknown.
    pub fn from_data(data: TokenData, issued_at: NaiveDateTime) -> Option<Self> {
        let value = data.token.filter(|t| !t.is_empty())?;
        let expires = data
            .expires
            .and_then(|e| NaiveDateTime::parse_from_str(e.trim(), TOKEN_EXPIRY_FORMAT).ok());
        Some(Self::new(value, expires, issued_at))
    }

    /// Opaque token value, sent verbatim in the `token` header
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Server-reported expiry (server local time), if any
    pub fn expires(&self) -> Option<NaiveDateTime> {
        self.expires
    }

    /// Lifetime left at receipt, if the expiry could be trusted
    pub fn lifetime(&self) -> Option<Duration> {
        self.lifetime
    }

    /// Whether the lifetime measured at receipt has run out
    pub fn is_expired(&self) -> bool {
        self.lifetime
            .is_some_and(|lifetime| self.received.elapsed() >= lifetime)
    }
}

/// Address record as returned by the address search and tag endpoints
///
/// Not every endpoint populates every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddressRecord {
    /// IP address in dotted or colon notation
    pub ip: Option<String>,
    pub hostname: Option<String>,
    /// Identifier of the enclosing subnet
    #[serde(rename = "subnetId", alias = "subnet_id", deserialize_with = "de::opt_id")]
    pub subnet_id: Option<String>,
    /// Whether the address is the subnet's gateway
    #[serde(deserialize_with = "de::opt_flag")]
    pub is_gateway: Option<bool>,
    pub description: Option<String>,
}

/// Subnet record (`GET subnets/<id>`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubnetRecord {
    pub description: Option<String>,
    /// Values phpIPAM derives from the subnet and mask
    pub calculation: Option<SubnetCalculation>,
}

/// Subset of the derived values phpIPAM attaches to a subnet
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SubnetCalculation {
    /// Dotted netmask (e.g. "255.255.255.0")
    #[serde(rename = "Subnet netmask")]
    pub netmask: Option<String>,
}

impl SubnetRecord {
    /// Dotted netmask from the calculated values, if phpIPAM sent one
    pub fn netmask(&self) -> Option<&str> {
        self.calculation.as_ref().and_then(|c| c.netmask.as_deref())
    }
}

/// Address tag (`GET addresses/tags/`)
///
/// `type` is the human readable tag name. Every field, `id` included, is
/// re-emitted exactly as phpIPAM sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag identifier, string or number as sent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    /// Tag name, `type` on the wire
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fields passed through untouched (`showtag`, `bgcolor`, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Tag {
    /// Identifier as a string, whichever encoding phpIPAM used
    pub fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// One address resolved from a hostname, with its subnet details
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostAddress {
    /// Address as found in the search result
    pub ipv4: String,
    /// Netmask of the enclosing subnet
    pub netmask: Option<String>,
    /// Description of the enclosing subnet
    pub description: Option<String>,
    /// Identifier of the enclosing subnet
    pub subnet_id: String,
}

/// Hostname lookup result, keyed by the record's position in the search
/// result ("0", "2", ...; gaps are preserved)
pub type HostAddresses = BTreeMap<String, HostAddress>;

/// Tag name resolved to its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagId {
    /// Tag name as asked for
    pub tag: String,
    /// Identifier of the first tag with that name
    pub tag_id: Option<String>,
}

/// Per-address details in a tag listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedAddress {
    /// Address description
    pub description: Option<String>,
    /// Hostname registered for the address
    pub hostname: Option<String>,
    /// Gateway flag, `null` when phpIPAM did not send one
    pub is_gateway: Option<bool>,
}

/// Addresses carrying a tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaggedAddresses {
    /// Keyed by IP address; the last record wins on duplicates
    pub details: BTreeMap<String, TaggedAddress>,
    /// IP addresses in encounter order, duplicates kept
    pub ip_addrs: Vec<Option<String>>,
    /// Tag name as asked for
    pub tag: String,
}

mod de {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Identifier sent either as a string or as a number
    pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!("invalid identifier: {}", other))),
        }
    }

    /// Boolean sent as a JSON bool, a number or a "0"/"1" string
    pub fn opt_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::Number(n)) => Ok(Some(n.as_f64().is_some_and(|f| f != 0.0))),
            Some(Value::String(s)) => Ok(Some(!matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "" | "0" | "false"
            ))),
            Some(other) => Err(D::Error::custom(format!("invalid flag: {}", other))),
        }
    }
}
