//! PhpIpamClient trait for mocking
//!
//! The lookup operations are written against this trait. `PhpIpamSession`
//! implements it against a live phpIPAM; tests use `MockPhpIpamClient`.

use crate::error::PhpIpamError;
use serde_json::Value;

/// Trait for phpIPAM lookup API access
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait PhpIpamClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Query a resource path relative to `<base_url>/api/lookup/`
    ///
    /// Returns the `data` member of the response, or an empty object when
    /// phpIPAM found nothing.
    async fn query(&self, resource: &str) -> Result<Value, PhpIpamError>;
}
