use crate::auth::{AuthStrategy, TokenCache, TokenProvider};
use crate::config::Config;
use crate::enrichment::LookupEngine;
use crate::errors::{AppError, ValidationError};
use crate::gateway_client::RequestGateway;
use crate::models::{Entity, LookupOptions, LookupResult};
use crate::validation;
use uuid::Uuid;

/// Entry point for a host: built once at startup, then shared by every lookup.
///
/// Holds the configured HTTP gateway and, when enabled, the token cache.
#[derive(Clone)]
pub struct Integration {
    tokens: TokenProvider,
    engine: LookupEngine,
}

impl Integration {
    /// Binds TLS/proxy settings and the token cache for the process lifetime.
    pub fn startup(config: &Config) -> Result<Self, AppError> {
        let gateway = RequestGateway::from_config(&config.request)?;
        let cache = config.token_cache_ttl.map(TokenCache::new);

        tracing::info!(
            "Lookup integration started (token cache: {})",
            if cache.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            tokens: TokenProvider::new(gateway.clone(), cache),
            engine: LookupEngine::new(gateway),
        })
    }

    pub fn validate_options(&self, options: &LookupOptions) -> Vec<ValidationError> {
        validation::validate_options(options)
    }

    /// Validates the options, resolves a token once, then looks up every entity.
    ///
    /// Any failure (invalid options, token exchange, a single entity query)
    /// fails the whole batch without partial results.
    pub async fn do_lookup(
        &self,
        entities: &[Entity],
        options: &LookupOptions,
    ) -> Result<Vec<LookupResult>, AppError> {
        let lookup_id = Uuid::new_v4();
        tracing::trace!("[{}] options are: {:?}", lookup_id, options);

        let errors = validation::validate_options(options);
        if !errors.is_empty() {
            tracing::warn!("[{}] Rejecting lookup, invalid options: {:?}", lookup_id, errors);
            return Err(AppError::InvalidOptions(errors));
        }

        if entities.is_empty() {
            return Ok(Vec::new());
        }

        // Validation guarantees the host is present.
        let host = options.host.as_deref().unwrap_or_default();
        let strategy = AuthStrategy::from_options(options);

        tracing::info!(
            "[{}] Looking up {} entit{} against {}",
            lookup_id,
            entities.len(),
            if entities.len() == 1 { "y" } else { "ies" },
            host
        );

        let token = self.tokens.resolve(host, &strategy).await?;
        let results = self.engine.lookup_all(entities, &token, host).await?;

        let matched = results.iter().filter(|r| r.data.is_some()).count();
        tracing::info!(
            "[{}] ✓ Lookup complete: {} result(s), {} with matches",
            lookup_id,
            results.len(),
            matched
        );

        Ok(results)
    }
}
