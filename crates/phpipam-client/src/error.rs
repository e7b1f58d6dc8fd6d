//! phpIPAM client errors

use thiserror::Error;

/// Errors that can occur when talking to the phpIPAM lookup API
///
/// "Not found" is never an error: absent hostnames, tags and subnets resolve
/// to empty results instead.
#[derive(Debug, Error)]
pub enum PhpIpamError {
    /// Configuration missing, unreadable or incomplete
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication failed (bad credentials, malformed token response)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A query was answered with a non-success HTTP status
    #[error("GET {resource} failed: {status} - {body}")]
    Transport {
        /// Resource path relative to the lookup API root
        resource: String,
        /// HTTP status returned by phpIPAM
        status: reqwest::StatusCode,
        /// Response body, possibly empty
        body: String,
    },

    /// HTTP request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON body did not have the expected shape
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid caller input (e.g. a malformed CIDR filter)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PhpIpamError {
    /// HTTP status of a failed query, if this is a transport error
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Transport { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}
