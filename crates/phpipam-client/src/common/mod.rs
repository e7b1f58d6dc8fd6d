//! Common utilities for the phpIPAM API client
//!
//! Transport wrapper, response envelope handling and the CIDR filter used by
//! the hostname lookup.

pub mod cidr;

use crate::config::PhpIpamConfig;
use crate::error::PhpIpamError;
use reqwest::{Certificate, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Path of the phpIPAM `lookup` API application below the base URL
pub const API_PATH: &str = "api/lookup";

/// Envelope wrapped around every phpIPAM response body
///
/// Only `data` and `message` decide the outcome of a query. Other members
/// (`code`, `success`, `time`) vary in encoding across phpIPAM versions and
/// are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiEnvelope {
    /// Query result, object or array
    pub data: Option<Value>,
    /// Explanation sent instead of `data` when nothing was found
    pub message: Option<Value>,
}

/// An empty result: what a query returns when phpIPAM found nothing
pub fn empty_result() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Whether a query result carries nothing (null, false, zero, "", [] or {})
pub fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Decode a collection result; an empty result is an empty collection
pub fn collection<T: for<'de> Deserialize<'de>>(value: Value) -> Result<Vec<T>, PhpIpamError> {
    if is_empty_result(&value) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(value)?)
}

/// HTTP client wrapper bound to one phpIPAM lookup API root
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Build the reqwest client for a configuration
    ///
    /// For https URLs the configured CA bundle is the only trust anchor.
    pub fn new(config: &PhpIpamConfig) -> Result<Self, PhpIpamError> {
        let mut builder = Client::builder().timeout(config.timeout);

        if config.base_url.starts_with("https") {
            builder = builder.tls_built_in_root_certs(false);
            for cert in load_trust_store(&config.trust_store_path)? {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build().map_err(PhpIpamError::Http)?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a resource path relative to the API root
    pub fn build_url(&self, resource: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PATH, resource)
    }

    /// `POST` with HTTP Basic credentials
    pub async fn post_basic_auth(
        &self,
        resource: &str,
        user: &str,
        password: &str,
    ) -> Result<Response, PhpIpamError> {
        let url = self.build_url(resource);
        debug!("POST {}", url);

        self.client
            .post(&url)
            .basic_auth(user, Some(password))
            .send()
            .await
            .map_err(PhpIpamError::Http)
    }

    /// `GET` authenticated with an API token
    pub async fn get_with_token(&self, resource: &str, token: &str) -> Result<Response, PhpIpamError> {
        let url = self.build_url(resource);
        debug!("GET {}", url);

        self.client
            .get(&url)
            .header("token", token)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(PhpIpamError::Http)
    }
}

/// Read a PEM CA bundle from disk
fn load_trust_store(path: &Path) -> Result<Vec<Certificate>, PhpIpamError> {
    let pem = std::fs::read(path).map_err(|e| {
        PhpIpamError::Configuration(format!("Cannot read CA bundle {}: {}", path.display(), e))
    })?;

    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
        PhpIpamError::Configuration(format!("Invalid CA bundle {}: {}", path.display(), e))
    })?;

    if certs.is_empty() {
        return Err(PhpIpamError::Configuration(format!(
            "CA bundle {} contains no certificates",
            path.display()
        )));
    }

    debug!("Loaded {} CA certificates from {}", certs.len(), path.display());
    Ok(certs)
}
