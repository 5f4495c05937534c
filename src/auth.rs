//! Token acquisition.
//!
//! Search requests carry a bearer token obtained either by exchanging
//! credentials at `/token/generate` or supplied up front in the options.

use crate::errors::{AppError, ResultExt};
use crate::gateway_client::{endpoint, RequestGateway, RequestSpec};
use crate::models::LookupOptions;
use moka::future::Cache;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

pub const TOKEN_PATH: &str = "/token/generate";
pub const TOKEN_EXPECTED_STATUS: u16 = 200;

const TOKEN_CACHE_CAPACITY: u64 = 1_000;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub tenant: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tenant", &self.tenant)
            .finish()
    }
}

/// How a lookup batch authenticates against the search API.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    CredentialExchange(Credentials),
    StaticToken(String),
}

impl AuthStrategy {
    /// Picks the strategy from the options: a present `token` wins.
    ///
    /// Missing fields become empty strings; run the validator first.
    pub fn from_options(options: &LookupOptions) -> Self {
        if let Some(ref token) = options.token {
            return AuthStrategy::StaticToken(token.clone());
        }
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        AuthStrategy::CredentialExchange(Credentials {
            username: field(&options.username),
            password: field(&options.password),
            tenant: field(&options.tenant),
        })
    }
}

impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthStrategy::CredentialExchange(credentials) => f
                .debug_tuple("CredentialExchange")
                .field(credentials)
                .finish(),
            AuthStrategy::StaticToken(_) => f.debug_tuple("StaticToken").field(&"[REDACTED]").finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TokenCacheKey {
    host: String,
    username: String,
    tenant: String,
    /// SHA-256 of the password (hex). The plaintext never enters the cache.
    password_digest: String,
}

impl TokenCacheKey {
    fn new(host: &str, credentials: &Credentials) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(credentials.password.as_bytes());
        Self {
            host: host.to_string(),
            username: credentials.username.clone(),
            tenant: credentials.tenant.clone(),
            password_digest: hex::encode(hasher.finalize()),
        }
    }
}

/// Exchanged tokens, keyed by host, username, tenant and password digest.
///
/// Failed exchanges are never cached, and concurrent misses for one key
/// share a single exchange.
#[derive(Clone)]
pub struct TokenCache {
    inner: Cache<TokenCacheKey, String>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(TOKEN_CACHE_CAPACITY)
                .build(),
        }
    }
}

#[derive(Clone)]
pub struct TokenProvider {
    gateway: RequestGateway,
    cache: Option<TokenCache>,
}

impl TokenProvider {
    pub fn new(gateway: RequestGateway, cache: Option<TokenCache>) -> Self {
        Self { gateway, cache }
    }

    /// Returns the token for a batch according to `strategy`.
    pub async fn resolve(&self, host: &str, strategy: &AuthStrategy) -> Result<String, AppError> {
        match strategy {
            AuthStrategy::StaticToken(token) => Ok(token.clone()),
            AuthStrategy::CredentialExchange(credentials) => match self.cache {
                Some(ref cache) => {
                    let key = TokenCacheKey::new(host, credentials);
                    cache
                        .inner
                        .try_get_with(key, self.acquire_token(host, credentials))
                        .await
                        .map_err(|e| (*e).clone())
                }
                None => self.acquire_token(host, credentials).await,
            },
        }
    }

    /// Exchanges credentials for a fresh token. Never cached.
    pub async fn acquire_token(&self, host: &str, credentials: &Credentials) -> Result<String, AppError> {
        let request = RequestSpec::post(endpoint(host, TOKEN_PATH))
            .header("username", credentials.username.as_str())
            .header("password", credentials.password.as_str())
            .header("tenant", credentials.tenant.as_str());

        tracing::debug!(
            "Requesting token for user {} (tenant {})",
            credentials.username,
            credentials.tenant
        );

        let body = self
            .gateway
            .send(request, TOKEN_EXPECTED_STATUS)
            .await
            .context("token acquisition failed")?;

        token_from_body(body)
    }
}

fn token_from_body(body: Value) -> Result<String, AppError> {
    match body {
        Value::String(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Value::String(_) => Err(AppError::InvalidResponse(
            "token endpoint returned an empty token".to_string(),
        )),
        other => Err(AppError::InvalidResponse(format!(
            "token endpoint returned a non-string body ({})",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
