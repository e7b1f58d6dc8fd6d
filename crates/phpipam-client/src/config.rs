//! phpIPAM client configuration
//!
//! The configuration lives in a `phpipam` section of the host's configuration
//! file (by default the Salt master file):
//!
//! ```yaml
//! phpipam:
//!   url: https://ipam.mydomain.com
//!   auth:
//!     user: 'read_api_user'
//!     password: 'xxxxx'
//!   verify: /etc/ssl/certs/ca-certificates.crt   # optional
//!   timeout: 30                                   # optional, seconds
//! ```
//!
//! The section may also live in a drop-in next to the master file
//! (`/etc/salt/master.d/phpipam.conf`). Drop-ins are read in name order after
//! the main file and the last one that defines `phpipam` wins.
//!
//! The same values can be supplied through `PHPIPAM_*` environment variables.

use crate::error::PhpIpamError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// CA bundle used when the configuration does not name one
pub const DEFAULT_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// Configuration file read by [`YamlFileSource::default`]
pub const DEFAULT_CONFIG_FILE: &str = "/etc/salt/master";

/// Drop-in directory read next to the configuration file
pub const INCLUDE_DIR: &str = "master.d";
const INCLUDE_EXTENSION: &str = "conf";

/// Per-request timeout used when the configuration does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// HTTP Basic credentials for the phpIPAM API user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API user name
    pub user: String,
    /// API user password, never logged
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated phpIPAM client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhpIpamConfig {
    /// phpIPAM base URL without trailing slash (e.g. "https://ipam.mydomain.com")
    pub base_url: String,
    /// HTTP Basic credentials for `POST user`
    pub credentials: Credentials,
    /// CA bundle used to verify the server certificate on https URLs
    pub trust_store_path: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl PhpIpamConfig {
    /// Build a configuration from explicit values, applying the same checks as
    /// the file and environment sources
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, PhpIpamError> {
        RawSection {
            url: Some(base_url.into()),
            auth: Some(RawAuth {
                user: Some(user.into()),
                password: Some(password.into()),
            }),
            verify: None,
            timeout: None,
        }
        .validate()
    }

    /// Override the CA bundle path
    #[must_use]
    pub fn with_trust_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.trust_store_path = path.into();
        self
    }

    /// Override the per-request timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse the `phpipam` section out of a YAML document
    pub fn from_yaml_str(text: &str) -> Result<Self, PhpIpamError> {
        let section = phpipam_section(text)?.ok_or_else(not_found)?;
        Self::from_section(section)
    }

    fn from_section(section: serde_yaml::Value) -> Result<Self, PhpIpamError> {
        let raw: RawSection = serde_yaml::from_value(section).map_err(|e| {
            PhpIpamError::Configuration(format!("Invalid phpIPAM configuration: {}", e))
        })?;

        raw.validate()
    }
}

/// The `phpipam` member of a YAML document, if present
fn phpipam_section(text: &str) -> Result<Option<serde_yaml::Value>, PhpIpamError> {
    let document: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| {
        PhpIpamError::Configuration(format!("Failed to parse configuration: {}", e))
    })?;

    Ok(document.get("phpipam").cloned())
}

fn not_found() -> PhpIpamError {
    PhpIpamError::Configuration("Cannot find the phpIPAM configuration!".to_string())
}

/// The `phpipam` section as written by the operator, before validation
#[derive(Debug, Default, Deserialize)]
struct RawSection {
    url: Option<String>,
    auth: Option<RawAuth>,
    verify: Option<PathBuf>,
    timeout: Option<u64>,
}

#[derive(Default, Deserialize)]
struct RawAuth {
    user: Option<String>,
    password: Option<String>,
}

impl fmt::Debug for RawAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawAuth")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn required(value: Option<String>, key: &str) -> Result<String, PhpIpamError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PhpIpamError::Configuration(format!(
            "Cannot find the phpIPAM configuration! Missing `{}`",
            key
        ))),
    }
}

impl RawSection {
    /// Apply the required-field checks and defaults
    fn validate(self) -> Result<PhpIpamConfig, PhpIpamError> {
        let url = required(self.url, "url")?;
        let auth = self.auth.unwrap_or_default();
        let user = required(auth.user, "auth.user")?;
        let password = required(auth.password, "auth.password")?;

        Ok(PhpIpamConfig {
            base_url: url.trim_end_matches('/').to_string(),
            credentials: Credentials { user, password },
            trust_store_path: self
                .verify
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CA_BUNDLE)),
            timeout: Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        })
    }
}

/// Where a session gets its configuration from
///
/// Loaded once per session construction.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Resolve and validate the configuration
    fn load(&self) -> Result<PhpIpamConfig, PhpIpamError>;
}

/// An already-resolved configuration is its own source
impl ConfigSource for PhpIpamConfig {
    fn load(&self) -> Result<PhpIpamConfig, PhpIpamError> {
        Ok(self.clone())
    }
}

/// Reads the `phpipam` section of a YAML configuration file
#[derive(Debug, Clone)]
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    /// Read the main configuration file at `path` and its drop-ins
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Main configuration file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drop-in directory next to the main file
    pub fn include_dir(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(INCLUDE_DIR)
    }

    /// `*.conf` files of the drop-in directory, in name order
    ///
    /// A missing directory has no drop-ins.
    fn includes(&self) -> Vec<PathBuf> {
        let dir = self.include_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No configuration drop-ins in {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == INCLUDE_EXTENSION))
            .collect();
        files.sort();
        files
    }
}

impl Default for YamlFileSource {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}

impl ConfigSource for YamlFileSource {
    fn load(&self) -> Result<PhpIpamConfig, PhpIpamError> {
        debug!("Reading phpIPAM configuration from {}", self.path.display());

        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            PhpIpamError::Configuration(format!(
                "Failed to read configuration for phpIPAM from {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let mut section = phpipam_section(&text)?;

        // Drop-ins override the main file; a broken one is skipped
        for include in self.includes() {
            let found = std::fs::read_to_string(&include)
                .map_err(|e| PhpIpamError::Configuration(e.to_string()))
                .and_then(|text| phpipam_section(&text));

            match found {
                Ok(Some(value)) => {
                    debug!("phpIPAM configuration taken from {}", include.display());
                    section = Some(value);
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring configuration drop-in {}: {}", include.display(), e),
            }
        }

        PhpIpamConfig::from_section(section.ok_or_else(not_found)?)
    }
}

/// Reads `PHPIPAM_URL`, `PHPIPAM_USER`, `PHPIPAM_PASSWORD` and the optional
/// `PHPIPAM_VERIFY` / `PHPIPAM_TIMEOUT` variables
#[derive(Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl fmt::Debug for EnvSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.vars.keys().collect();
        keys.sort();
        f.debug_struct("EnvSource").field("vars", &keys).finish()
    }
}

impl EnvSource {
    /// Snapshot the `PHPIPAM_*` variables of the current process
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Use an explicit set of variables instead of the process environment
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with("PHPIPAM_"))
            .collect();
        Self { vars }
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl ConfigSource for EnvSource {
    fn load(&self) -> Result<PhpIpamConfig, PhpIpamError> {
        let timeout = match self.var("PHPIPAM_TIMEOUT") {
            Some(v) => Some(v.trim().parse::<u64>().map_err(|e| {
                PhpIpamError::Configuration(format!("Invalid PHPIPAM_TIMEOUT {:?}: {}", v, e))
            })?),
            None => None,
        };

        RawSection {
            url: self.var("PHPIPAM_URL"),
            auth: Some(RawAuth {
                user: self.var("PHPIPAM_USER"),
                password: self.var("PHPIPAM_PASSWORD"),
            }),
            verify: self.var("PHPIPAM_VERIFY").map(PathBuf::from),
            timeout,
        }
        .validate()
    }
}
