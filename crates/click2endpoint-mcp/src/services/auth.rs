//! Client-credentials token flow against the C2M auth service.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;

use crate::codegen::DEFAULT_AUTH_BASE_URL;
use crate::error::ServiceError;

/// Long-term token lifetime requested from the auth service (30 days).
pub const LONG_TOKEN_TTL_SECS: u64 = 2_592_000;

/// Cached tokens this close to expiry are treated as expired.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

const LONG_SCOPES: [&str; 3] = ["jobs:submit", "templates:read", "tokens:revoke"];
const SHORT_SCOPES: [&str; 1] = ["jobs:submit"];

#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_id: String,
    pub expires_at: String,
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

impl Token {
    /// True once `now` is within the expiry margin. An unparsable
    /// `expires_at` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expiry) => expiry.with_timezone(&Utc) - now <= Duration::seconds(EXPIRY_MARGIN_SECS),
            Err(_) => true,
        }
    }
}

/// Outcome of a credentials check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCheck {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Long-term token for the client credentials.
    async fn long_term_token(&self, creds: &Credentials) -> Result<Token, ServiceError>;

    /// Narrow-scope token usable for job submission.
    async fn short_term_token(&self, long_term: &str) -> Result<Token, ServiceError>;

    /// Invalidate `token_id`, authenticating with `token`.
    async fn revoke_token(&self, token_id: &str, token: &str) -> Result<(), ServiceError>;

    /// Both steps of the exchange.
    async fn obtain_token(&self, creds: &Credentials) -> Result<Token, ServiceError> {
        let long = self.long_term_token(creds).await?;
        self.short_term_token(&long.access_token).await
    }

    /// Request a long-term token and report whether it worked.
    async fn test_connection(&self, creds: &Credentials) -> ConnectionCheck {
        match self.long_term_token(creds).await {
            Ok(token) => ConnectionCheck {
                success: true,
                message: "Successfully authenticated".to_string(),
                token_id: Some(token.token_id),
            },
            Err(e) => ConnectionCheck {
                success: false,
                message: e.to_string(),
                token_id: None,
            },
        }
    }
}

pub struct HttpTokenProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/auth/tokens/{}", self.base_url, tail)
    }
}

impl Default for HttpTokenProvider {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_BASE_URL)
    }
}

async fn ensure_success(
    response: reqwest::Response,
    context: &'static str,
) -> Result<reqwest::Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        context,
        status: status.as_u16(),
        body,
    })
}

async fn decode_token(
    response: reqwest::Response,
    context: &'static str,
) -> Result<Token, ServiceError> {
    let text = ensure_success(response, context).await?.text().await?;
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn long_term_token(&self, creds: &Credentials) -> Result<Token, ServiceError> {
        tracing::info!("requesting long-term token for client {}", creds.client_id);
        let response = self
            .client
            .post(self.url("long"))
            .header("X-Client-Id", &creds.client_id)
            .json(&json!({
                "grant_type": "client_credentials",
                "client_id": creds.client_id,
                "client_secret": creds.client_secret,
                "scopes": LONG_SCOPES,
                "ttl_seconds": LONG_TOKEN_TTL_SECS,
            }))
            .send()
            .await?;
        decode_token(response, "long-term token request").await
    }

    async fn short_term_token(&self, long_term: &str) -> Result<Token, ServiceError> {
        tracing::info!("exchanging long-term token for short-term token");
        let response = self
            .client
            .post(self.url("short"))
            .bearer_auth(long_term)
            .json(&json!({
                "grant_type": "token_exchange",
                "scopes": SHORT_SCOPES,
            }))
            .send()
            .await?;
        decode_token(response, "short-term token request").await
    }

    async fn revoke_token(&self, token_id: &str, token: &str) -> Result<(), ServiceError> {
        tracing::info!("revoking token {}", token_id);
        let response = self
            .client
            .post(self.url(&format!("{token_id}/revoke")))
            .bearer_auth(token)
            .send()
            .await?;
        ensure_success(response, "token revocation").await?;
        Ok(())
    }
}

#[derive(Default)]
struct TokenCache {
    owner: Option<Credentials>,
    long: Option<Token>,
    short: Option<Token>,
}

/// Reuses tokens from `inner` until they come within [`EXPIRY_MARGIN_SECS`]
/// of expiry. A change of credentials or any revocation empties the cache.
pub struct CachedTokenProvider<P> {
    inner: P,
    cache: Mutex<TokenCache>,
}

impl<P: TokenProvider> CachedTokenProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(TokenCache::default()),
        }
    }
}

fn live(token: &Option<Token>, now: DateTime<Utc>) -> Option<&Token> {
    token.as_ref().filter(|t| !t.is_expired_at(now))
}

#[async_trait]
impl<P: TokenProvider> TokenProvider for CachedTokenProvider<P> {
    async fn long_term_token(&self, creds: &Credentials) -> Result<Token, ServiceError> {
        self.inner.long_term_token(creds).await
    }

    async fn short_term_token(&self, long_term: &str) -> Result<Token, ServiceError> {
        self.inner.short_term_token(long_term).await
    }

    async fn revoke_token(&self, token_id: &str, token: &str) -> Result<(), ServiceError> {
        self.inner.revoke_token(token_id, token).await?;
        *self.cache.lock().await = TokenCache::default();
        Ok(())
    }

    async fn obtain_token(&self, creds: &Credentials) -> Result<Token, ServiceError> {
        let mut cache = self.cache.lock().await;
        if cache.owner.as_ref() != Some(creds) {
            *cache = TokenCache {
                owner: Some(creds.clone()),
                ..TokenCache::default()
            };
        }
        let now = Utc::now();
        if let Some(short) = live(&cache.short, now) {
            tracing::debug!("reusing cached short-term token {}", short.token_id);
            return Ok(short.clone());
        }
        let long = match live(&cache.long, now) {
            Some(long) => long.clone(),
            None => {
                let fresh = self.inner.long_term_token(creds).await?;
                cache.long = Some(fresh.clone());
                fresh
            }
        };
        let short = self.inner.short_term_token(&long.access_token).await?;
        cache.short = Some(short.clone());
        Ok(short)
    }
}
