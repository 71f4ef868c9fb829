//! Prompt text for the two language-model calls.

use crate::analysis::summary::AreaStatistics;

/// System prompt for area and intent resolution.
pub const RESOLVE_SYSTEM_PROMPT: &str = r#"You are a smart real-estate assistant.
Identify the areas a user asks about and what they want to know.
Only choose areas from the list you are given.
Output a single JSON object and nothing else, shaped exactly like:
{"areas": [], "intent": "", "metrics": []}

Example:
Input: "Compare demand trend of Baner and Aundh"
Output: {"areas": ["Baner", "Aundh"], "intent": "compare", "metrics": ["demand"]}"#;

/// System prompt for summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a real estate market analyst. Be concise, professional and data-driven.";

/// Builds the user message for area resolution.
pub fn resolution_prompt(query: &str, available_areas: &[String]) -> String {
    format!(
        "User query: \"{}\"\n\n\
         Available areas (choose only from this list):\n{}\n\n\
         1. Identify the areas mentioned by the user (if any).\n\
         2. Identify what the user wants (trend, summary, comparison, price, demand, growth etc.).\n\
         3. Output JSON strictly in the shape shown.",
        query,
        available_areas.join(", ")
    )
}

/// Builds the user message for summary generation.
pub fn summary_prompt(query: &str, areas: &[String], statistics: &[AreaStatistics]) -> String {
    let stats = serde_json::to_string_pretty(statistics).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Question: {}\n\
         Areas analyzed: {}\n\
         Statistics:\n{}\n\n\
         Provide a 2-3 sentence summary covering:\n\
         1. Price trends and key observations\n\
         2. Demand patterns\n\
         3. Investment insights or recommendations\n\n\
         Keep it clear, data-driven, and actionable.",
        query,
        areas.join(", "),
        stats
    )
}
