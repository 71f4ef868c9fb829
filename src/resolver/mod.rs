//! Area resolution: language model first, keyword match as fallback.

pub mod heuristic;
pub mod model;

pub use heuristic::resolve_via_heuristic;
pub use model::{parse_resolution, resolve_via_model};

use crate::llm::AreaResolutionService;
use crate::models::{Dataset, ResolutionSource, ResolvedQuery};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A resolved query and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub query: ResolvedQuery,
    pub source: ResolutionSource,
}

/// Resolve the areas of `query` against `dataset`.
///
/// The model sees the sorted area list; the keyword match walks areas in
/// dataset order. Any service failure is logged and answered by the keyword
/// match with the generic intent and default metrics.
pub async fn resolve(
    query: &str,
    dataset: &Dataset,
    service: Option<&dyn AreaResolutionService>,
    timeout: Duration,
) -> Resolution {
    if let Some(service) = service {
        let available = dataset.available_areas();
        match resolve_via_model(service, query, &available, timeout).await {
            Ok(resolved) => {
                info!(
                    "Model resolved areas {:?} (intent: {}, metrics: {:?})",
                    resolved.areas.areas(),
                    resolved.intent,
                    resolved.metrics
                );
                return Resolution {
                    query: resolved,
                    source: ResolutionSource::Model,
                };
            }
            Err(e) => warn!("Model area resolution failed, using keyword match: {}", e),
        }
    } else {
        debug!("No resolution service configured, using keyword match");
    }

    let areas = resolve_via_heuristic(query, &dataset.distinct_areas());
    info!("Keyword match resolved areas {:?}", areas.areas());

    Resolution {
        query: ResolvedQuery::from_heuristic(areas),
        source: ResolutionSource::Heuristic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::models::{AreaMatch, Cell, Row};
    use async_trait::async_trait;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Row::new(2020, "Baner", 100.0, 1, Cell::Null),
            Row::new(2020, "Aundh", 90.0, 2, Cell::Null),
        ])
    }

    struct FixedService(&'static str);

    #[async_trait]
    impl AreaResolutionService for FixedService {
        async fn resolve_areas(
            &self,
            _query: &str,
            available_areas: &[String],
        ) -> Result<ResolvedQuery, ServiceError> {
            parse_resolution(self.0, available_areas)
        }
    }

    #[tokio::test]
    async fn test_model_result_used() {
        let service = FixedService(r#"{"areas": ["aundh"], "intent": "trend", "metrics": ["price"]}"#);
        let resolution = resolve("aundh trend", &dataset(), Some(&service), Duration::from_secs(1)).await;
        assert_eq!(resolution.source, ResolutionSource::Model);
        assert_eq!(resolution.query.areas, AreaMatch::Verified(vec!["Aundh".to_string()]));
        assert_eq!(resolution.query.intent, "trend");
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let service = FixedService("not json at all");
        let resolution = resolve(
            "compare Baner and Aundh",
            &dataset(),
            Some(&service),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(resolution.source, ResolutionSource::Heuristic);
        assert_eq!(
            resolution.query.areas.areas(),
            &["Baner".to_string(), "Aundh".to_string()]
        );
        assert_eq!(resolution.query.intent, "analysis");
        assert_eq!(resolution.query.metrics, vec!["price", "demand"]);
    }

    #[test]
    fn test_no_service_uses_keyword_match() {
        let resolution = tokio_test::block_on(resolve(
            "Baner prices",
            &dataset(),
            None,
            Duration::from_secs(1),
        ));
        assert_eq!(resolution.source, ResolutionSource::Heuristic);
        assert_eq!(resolution.query.areas.areas(), &["Baner".to_string()]);
    }
}
