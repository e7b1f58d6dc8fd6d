//! Mock phpIPAM client for unit testing
//!
//! Serves canned `data` values per resource path so the lookup operations can
//! be exercised without a running phpIPAM instance.

use crate::client_trait::PhpIpamClientTrait;
use crate::common::empty_result;
use crate::error::PhpIpamError;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock phpIPAM client for testing
///
/// Resources without a canned response answer like phpIPAM does for an
/// unknown record: an empty result. Every query is recorded.
#[derive(Debug, Clone)]
pub struct MockPhpIpamClient {
    base_url: String,
    responses: Arc<Mutex<HashMap<String, Value>>>,
    failures: Arc<Mutex<HashMap<String, StatusCode>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockPhpIpamClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answer `resource` with `data` (for test setup)
    pub fn add_response(&self, resource: impl Into<String>, data: Value) {
        self.responses.lock().unwrap().insert(resource.into(), data);
    }

    /// Answer `resource` with a non-success HTTP status (for test setup)
    pub fn fail_with(&self, resource: impl Into<String>, status: StatusCode) {
        self.failures.lock().unwrap().insert(resource.into(), status);
    }

    /// Resource paths queried so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PhpIpamClientTrait for MockPhpIpamClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn query(&self, resource: &str) -> Result<Value, PhpIpamError> {
        self.queries.lock().unwrap().push(resource.to_string());

        if let Some(status) = self.failures.lock().unwrap().get(resource) {
            return Err(PhpIpamError::Transport {
                resource: resource.to_string(),
                status: *status,
                body: String::new(),
            });
        }

        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(resource)
            .cloned()
            .unwrap_or_else(empty_result))
    }
}
