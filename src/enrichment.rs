/// Entity lookup against the index search API.
///
/// For every entity:
/// 1. Build the `index=asset` query for its value
/// 2. Send it with the batch token
/// 3. Normalize the response into a `LookupResult`
///
/// All entities are queried concurrently. The first failure cancels the
/// requests still in flight and fails the batch.
use crate::aggregator::ResultAggregator;
use crate::errors::{AppError, ResultExt};
use crate::gateway_client::{endpoint, RequestGateway, RequestSpec};
use crate::models::{normalize_search_body, Entity, LookupResult};
use tokio::task::JoinSet;

pub const SEARCH_PATH: &str = "/spotter/index/search";

/// Status a successful search must answer with.
pub const SEARCH_EXPECTED_STATUS: u16 = 200;

/// Builds the search expression for one entity value.
///
/// Double quotes and backslashes in the value are escaped so the value
/// cannot terminate the quoted literal.
pub fn build_search_query(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("index=asset and key_ip = \"{}\"", escaped)
}

#[derive(Clone)]
pub struct LookupEngine {
    gateway: RequestGateway,
}

impl LookupEngine {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    /// Looks up every entity concurrently.
    ///
    /// Returns one result per entity, in input order, or the first error.
    /// There is no cap on the number of requests in flight.
    pub async fn lookup_all(
        &self,
        entities: &[Entity],
        token: &str,
        host: &str,
    ) -> Result<Vec<LookupResult>, AppError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let mut tasks = JoinSet::new();
        for (index, entity) in entities.iter().cloned().enumerate() {
            let engine = self.clone();
            let token = token.to_string();
            let host = host.to_string();
            tasks.spawn(async move {
                let outcome = engine.lookup_entity(&host, &token, entity).await;
                (index, outcome)
            });
        }

        let mut aggregator = ResultAggregator::new(entities.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined
                .map_err(|e| AppError::InternalError(format!("lookup task failed: {}", e)))?;

            if let Err(e) = aggregator.accept(index, outcome) {
                tracing::warn!(
                    "Aborting lookup batch, {} request(s) still in flight: {}",
                    tasks.len(),
                    e
                );
                tasks.abort_all();
                return Err(e);
            }
        }

        aggregator.finish()
    }

    /// Queries the index for a single entity.
    pub async fn lookup_entity(
        &self,
        host: &str,
        token: &str,
        entity: Entity,
    ) -> Result<LookupResult, AppError> {
        let request = RequestSpec::get(endpoint(host, SEARCH_PATH))
            .query("query", build_search_query(&entity.value))
            .header("token", token);

        tracing::debug!("Searching index for entity {}", entity.value);

        let body = self
            .gateway
            .send(request, SEARCH_EXPECTED_STATUS)
            .await
            .with_context(|| format!("search for {} failed", entity.value))?;

        let data = normalize_search_body(&body)
            .with_context(|| format!("search for {} returned an unusable body", entity.value))?;

        match data {
            Some(ref data) => tracing::debug!(
                "Entity {} matched {} event(s)",
                entity.value,
                data.details.len()
            ),
            None => tracing::debug!("No match for entity {}", entity.value),
        }

        Ok(LookupResult { entity, data })
    }
}
