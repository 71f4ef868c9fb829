//! Language-model area resolution.
//!
//! The service is asked for JSON; anything else is a parse failure that the
//! caller answers with the keyword fallback. No retries happen here.

use crate::error::ServiceError;
use crate::llm::{with_timeout, AreaResolutionService};
use crate::models::{same_area, AreaMatch, ResolvedQuery, DEFAULT_INTENT};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Raw reply shape.
#[derive(Debug, Deserialize)]
struct ResolutionPayload {
    #[serde(default)]
    areas: Vec<String>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    metrics: Option<Vec<String>>,
}

/// Ask the service, bounded by `timeout`.
pub async fn resolve_via_model(
    service: &dyn AreaResolutionService,
    query: &str,
    available_areas: &[String],
    timeout: Duration,
) -> Result<ResolvedQuery, ServiceError> {
    with_timeout(timeout, service.resolve_areas(query, available_areas)).await
}

/// Parses a resolution reply and pins its areas to the dataset.
///
/// Areas the dataset doesn't know are dropped; kept ones take the dataset's
/// spelling and are deduplicated case-insensitively.
pub fn parse_resolution(
    raw: &str,
    available_areas: &[String],
) -> Result<ResolvedQuery, ServiceError> {
    let payload: ResolutionPayload = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| ServiceError::Parse(e.to_string()))?;

    let mut areas: Vec<String> = Vec::new();
    for name in &payload.areas {
        match available_areas.iter().find(|a| same_area(a, name.trim())) {
            Some(known) if !areas.iter().any(|a| same_area(a, known)) => areas.push(known.clone()),
            Some(_) => {}
            None => warn!("Model returned unknown area '{}', ignoring it", name),
        }
    }

    let intent = payload
        .intent
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_INTENT.to_string());

    let metrics = match payload.metrics {
        Some(list) => {
            let mut metrics: Vec<String> = Vec::new();
            for m in list.iter().map(|m| m.trim()).filter(|m| !m.is_empty()) {
                if !metrics.iter().any(|x| x.eq_ignore_ascii_case(m)) {
                    metrics.push(m.to_string());
                }
            }
            metrics
        }
        None => vec!["price".to_string()],
    };

    Ok(ResolvedQuery {
        areas: AreaMatch::Verified(areas),
        intent,
        metrics,
    })
}

/// Removes a surrounding Markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);

    // Skip a language tag such as `json`.
    match inner.find('\n') {
        Some(i) if !inner[..i].contains('{') => inner[i + 1..].trim(),
        _ => inner.trim(),
    }
}
