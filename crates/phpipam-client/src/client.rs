//! phpIPAM API session
//!
//! A session authenticates once against `POST <base_url>/api/lookup/user`
//! and then issues token-authenticated `GET` queries against
//! `<base_url>/api/lookup/<resource>`.
//!
//! The token is refreshed in two cases only: the lifetime it had when it was
//! issued has run out, or phpIPAM rejected it (401/403). A rejected query is retried once
//! with the fresh token; a second rejection is returned to the caller.

use crate::common::{empty_result, ApiEnvelope, HttpClient};
use crate::config::{ConfigSource, Credentials, PhpIpamConfig};
use crate::error::PhpIpamError;
use crate::models::{Token, TokenResponse};
use crate::client_trait::PhpIpamClientTrait;
use chrono::{Local, NaiveDateTime};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Resource path of the authentication endpoint
const AUTH_RESOURCE: &str = "user";

/// Authenticated phpIPAM API session
#[derive(Debug)]
pub struct PhpIpamSession {
    http: HttpClient,
    credentials: Credentials,
    token: RwLock<Token>,
}

impl PhpIpamSession {
    /// Authenticate with an already-resolved configuration
    ///
    /// # Returns
    /// * `Ok(PhpIpamSession)` - Session holding a fresh token
    /// * `Err(PhpIpamError::Configuration)` - The CA bundle cannot be loaded
    /// * `Err(PhpIpamError::Authentication)` - phpIPAM refused the credentials
    ///   or answered without `data.token`
    pub async fn connect(config: PhpIpamConfig) -> Result<Self, PhpIpamError> {
        let http = HttpClient::new(&config)?;
        let token = authenticate(&http, &config.credentials).await?;
        info!("Authenticated against phpIPAM at {}", http.base_url());

        Ok(Self {
            http,
            credentials: config.credentials,
            token: RwLock::new(token),
        })
    }

    /// Resolve the configuration from `source`, then authenticate
    pub async fn from_source(source: &dyn ConfigSource) -> Result<Self, PhpIpamError> {
        let config = source.load()?;
        Self::connect(config).await
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Current API token
    pub async fn token(&self) -> String {
        self.token.read().await.value().to_string()
    }

    /// Server-reported expiry of the current token
    pub async fn token_expires(&self) -> Option<NaiveDateTime> {
        self.token.read().await.expires()
    }

    /// Query a resource path relative to `<base_url>/api/lookup/`
    ///
    /// The path is used as given: no leading slash, identifiers already
    /// URL-safe.
    ///
    /// # Returns
    /// * `Ok(Value)` - The `data` member of the response (object or array), or
    ///   an empty object when phpIPAM answered with a `message` or nothing
    /// * `Err(PhpIpamError::Transport)` - Non-success HTTP status
    pub async fn query(&self, resource: &str) -> Result<Value, PhpIpamError> {
        let token = self.current_token().await?;
        let mut response = self.http.get_with_token(resource, &token).await?;

        if is_token_rejected(response.status()) {
            warn!(
                "phpIPAM rejected the API token for {} ({}), re-authenticating",
                resource,
                response.status()
            );
            let token = self.refresh_token(&token).await?;
            response = self.http.get_with_token(resource, &token).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PhpIpamError::Transport {
                resource: resource.to_string(),
                status,
                body,
            });
        }

        let response_text = response.text().await?;
        let envelope: ApiEnvelope = serde_json::from_str(&response_text)?;

        match envelope {
            ApiEnvelope { data: Some(data), .. } => Ok(data),
            ApiEnvelope { message: Some(message), .. } => {
                debug!(
                    "Failed to get data from phpIPAM: {}: {}",
                    self.http.build_url(resource),
                    message
                );
                Ok(empty_result())
            }
            _ => Ok(empty_result()),
        }
    }

    /// Token to use for the next request, refreshed first if it has expired
    async fn current_token(&self) -> Result<String, PhpIpamError> {
        let (value, expired) = {
            let token = self.token.read().await;
            (token.value().to_string(), token.is_expired())
        };

        if expired {
            warn!("phpIPAM API token expired, re-authenticating");
            return self.refresh_token(&value).await;
        }

        Ok(value)
    }

    /// Replace `stale` with a fresh token
    ///
    /// If another caller already replaced it, that token is reused.
    async fn refresh_token(&self, stale: &str) -> Result<String, PhpIpamError> {
        let mut token = self.token.write().await;
        if token.value() != stale {
            return Ok(token.value().to_string());
        }

        *token = authenticate(&self.http, &self.credentials).await?;
        debug!("Obtained a fresh phpIPAM API token");
        Ok(token.value().to_string())
    }
}

#[async_trait::async_trait]
impl PhpIpamClientTrait for PhpIpamSession {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn query(&self, resource: &str) -> Result<Value, PhpIpamError> {
        PhpIpamSession::query(self, resource).await
    }
}

fn is_token_rejected(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Obtain a token with HTTP Basic credentials
async fn authenticate(http: &HttpClient, credentials: &Credentials) -> Result<Token, PhpIpamError> {
    debug!("Requesting phpIPAM API token for user {}", credentials.user);

    let response = http
        .post_basic_auth(AUTH_RESOURCE, &credentials.user, &credentials.password)
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PhpIpamError::Authentication(format!(
            "POST {} returned {} - {}",
            http.build_url(AUTH_RESOURCE),
            status,
            body
        )));
    }

    let issued_at = Local::now().naive_local();
    let response_text = response.text().await?;
    let parsed: TokenResponse = serde_json::from_str(&response_text).map_err(|e| {
        PhpIpamError::Authentication(format!(
            "Malformed token response: {} - Response (first 500 chars): {}",
            e,
            response_text.chars().take(500).collect::<String>()
        ))
    })?;

    parsed
        .data
        .and_then(|data| Token::from_data(data, issued_at))
        .ok_or_else(|| PhpIpamError::Authentication("Token response lacks `data.token`".to_string()))
}
