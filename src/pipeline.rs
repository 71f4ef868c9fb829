//! Query-to-insight orchestration.
//!
//! resolve → no-match check → aggregate → project → summarize. Every stage
//! gets the same resolved areas and the same immutable dataset.

use crate::analysis::{aggregate, project, summarize, DEFAULT_MAX_ROWS};
use crate::config::Config;
use crate::error::ServiceError;
use crate::llm::{AreaResolutionService, LlmService, SummaryGenerationService};
use crate::models::{Analysis, AnalysisResult, AreaMatch, Dataset, NoMatch, ResolutionInfo};
use crate::resolver::{self, resolve_via_heuristic};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Knobs for one [`Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Cap on table rows.
    pub max_rows: usize,
    /// Upper bound for each text service call.
    pub service_timeout: Duration,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            service_timeout: Duration::from_secs(30),
        }
    }
}

/// Runs the pipeline with injected text services.
///
/// Without services the analyzer is fully offline and deterministic.
pub struct Analyzer {
    settings: AnalyzerSettings,
    resolver: Option<Arc<dyn AreaResolutionService>>,
    summarizer: Option<Arc<dyn SummaryGenerationService>>,
}

impl Analyzer {
    /// An offline analyzer.
    pub fn new(settings: AnalyzerSettings) -> Self {
        Self {
            settings,
            resolver: None,
            summarizer: None,
        }
    }

    /// Builds the analyzer from configuration, wiring the language model
    /// into both stages when it is active.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let settings = AnalyzerSettings {
            max_rows: config.table.max_rows,
            service_timeout: config.llm.timeout(),
        };
        let analyzer = Self::new(settings);

        match LlmService::from_config(&config.llm)? {
            Some(service) => {
                let service = Arc::new(service);
                Ok(analyzer
                    .with_resolver(service.clone())
                    .with_summarizer(service))
            }
            None => Ok(analyzer),
        }
    }

    pub fn with_resolver(mut self, service: Arc<dyn AreaResolutionService>) -> Self {
        self.resolver = Some(service);
        self
    }

    pub fn with_summarizer(mut self, service: Arc<dyn SummaryGenerationService>) -> Self {
        self.summarizer = Some(service);
        self
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// True when at least one stage will call a text service.
    pub fn uses_model(&self) -> bool {
        self.resolver.is_some() || self.summarizer.is_some()
    }

    /// Analyze `query` against `dataset`.
    pub async fn analyze(&self, query: &str, dataset: &Dataset) -> Analysis {
        info!("Analyzing query over {} rows: {}", dataset.len(), query);
        let timeout = self.settings.service_timeout;

        let resolution =
            resolver::resolve(query, dataset, self.resolver.as_deref(), timeout).await;
        let resolved = resolution.query;

        if is_no_match(&resolved.areas) {
            let unverified_guess = match &resolved.areas {
                AreaMatch::Guessed(areas) => areas.first().cloned(),
                AreaMatch::Verified(_) => None,
            };
            warn!(
                "No matching area found (unverified guess: {:?})",
                unverified_guess
            );
            return Analysis::NoMatch(NoMatch {
                available_areas: dataset.available_areas(),
                unverified_guess,
            });
        }

        let areas = resolved.areas.areas().to_vec();

        let chart = aggregate(dataset, &areas);
        debug!("Chart spans {} years", chart.price_trend.labels.len());

        let table = project(dataset, &areas, self.settings.max_rows);
        debug!("Table holds {} rows", table.len());

        let summary = summarize(
            self.summarizer.as_deref(),
            query,
            dataset,
            &areas,
            timeout,
        )
        .await;

        Analysis::Complete(AnalysisResult {
            summary,
            areas_detected: areas,
            chart,
            table,
            resolution: ResolutionInfo {
                source: resolution.source,
                intent: resolved.intent,
                metrics: resolved.metrics,
            },
        })
    }
}

/// Nothing resolved, or only a guessed token.
///
/// A guess never names a dataset area: any area contained in the query is
/// already matched by the keyword resolver.
fn is_no_match(areas: &AreaMatch) -> bool {
    match areas {
        AreaMatch::Verified(list) => list.is_empty(),
        AreaMatch::Guessed(_) => true,
    }
}

/// Rows a download of `query` should contain, projected to the canonical
/// columns present. Uses the keyword match only.
pub fn filter_for_export(query: &str, dataset: &Dataset) -> Dataset {
    let areas = resolve_via_heuristic(query, &dataset.distinct_areas());
    debug!("Export filter areas: {:?}", areas.areas());
    dataset.filter_areas(areas.areas())
}
