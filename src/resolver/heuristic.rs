//! Keyword-based area detection.
//!
//! Used whenever the language model is unavailable or misbehaves. Never
//! fails and never leaves the process.

use crate::models::{same_area, AreaMatch};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static WORD_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9\s\-]+").expect("valid token regex"));

/// Minimum length (exclusive) of a token to be considered a guess.
const MIN_GUESS_LEN: usize = 2;

/// Finds the known areas named in `query`.
///
/// Areas are tested in the order given and matched by case-insensitive
/// substring containment. When nothing matches, the last query token longer
/// than two characters is returned as an unverified guess.
pub fn resolve_via_heuristic(query: &str, available_areas: &[String]) -> AreaMatch {
    let q = query.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for area in available_areas {
        let needle = area.trim().to_lowercase();
        if needle.is_empty() || !q.contains(&needle) {
            continue;
        }
        if !found.iter().any(|f| same_area(f, area)) {
            found.push(area.clone());
        }
    }

    if !found.is_empty() {
        debug!("Keyword match found areas: {:?}", found);
        return AreaMatch::Verified(found);
    }

    match last_candidate_token(query) {
        Some(token) => {
            debug!("No known area in query, guessing '{}'", token);
            AreaMatch::Guessed(vec![token])
        }
        None => AreaMatch::Verified(Vec::new()),
    }
}

/// Last alphanumeric/hyphen token longer than two characters.
fn last_candidate_token(query: &str) -> Option<String> {
    let joined = WORD_RUNS
        .find_iter(query)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    joined
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_GUESS_LEN)
        .last()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn areas(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_matches_in_given_order() {
        let known = areas(&["Baner", "Aundh", "Wakad"]);
        let result = resolve_via_heuristic("compare demand trend of Aundh and Baner", &known);
        assert_eq!(result, AreaMatch::Verified(areas(&["Baner", "Aundh"])));
    }

    #[test]
    fn test_exact_name_is_first() {
        let known = areas(&["Akurdi", "Wakad"]);
        let result = resolve_via_heuristic("show me WAKAD prices", &known);
        assert_eq!(result.areas()[0], "Wakad");
        assert!(result.is_verified());
    }

    #[test]
    fn test_dedup_case_insensitive() {
        let known = areas(&["Wakad", "wakad"]);
        let result = resolve_via_heuristic("wakad", &known);
        assert_eq!(result, AreaMatch::Verified(areas(&["Wakad"])));
    }

    #[test]
    fn test_guess_is_last_long_token() {
        let known = areas(&["Baner"]);
        let result = resolve_via_heuristic("price growth in Hinjewadi?", &known);
        assert_eq!(result, AreaMatch::Guessed(areas(&["Hinjewadi"])));
    }

    #[test]
    fn test_guess_keeps_hyphens() {
        let result = resolve_via_heuristic("analyze pimpri-chinchwad!", &[]);
        assert_eq!(result, AreaMatch::Guessed(areas(&["pimpri-chinchwad"])));
    }

    #[test]
    fn test_at_most_one_guess() {
        let result = resolve_via_heuristic("one two three four", &areas(&["Baner"]));
        assert_eq!(result.areas().len(), 1);
    }

    #[test]
    fn test_nothing_to_guess() {
        let result = resolve_via_heuristic("a b ?? !!", &areas(&["Baner"]));
        assert!(result.is_empty());
    }

    #[test]
    fn test_blank_area_never_matches() {
        let result = resolve_via_heuristic("xy", &areas(&["", "  "]));
        assert!(result.is_empty());
    }
}
