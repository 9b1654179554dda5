// src/analyze/parse.rs
//! Model-response parsing: fence stripping, structural validation with
//! defaulting, and the salvage path for malformed JSON.

use anyhow::{anyhow, Result};
use serde::Deserialize;

use super::{Categories, Summary, ThreatLevel};
use crate::collect::truncate_chars;

const SALVAGE_MAX_CHARS: usize = 300;
const SALVAGE_MIN_LINE_CHARS: usize = 50;
const SALVAGE_SCAN_LINES: usize = 10;

#[derive(Deserialize)]
struct RawAnalysis {
    summary: Option<String>,
    categories: Option<RawCategories>,
    key_insights: Option<Vec<String>>,
    threat_level: Option<String>,
    recommended_actions: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct RawCategories {
    new_features: Option<Vec<String>>,
    pricing_changes: Option<Vec<String>>,
    messaging_updates: Option<Vec<String>>,
}

/// Strip an optional markdown code fence (```` ``` ```` or ```` ```json ````)
/// wrapping the response.
pub fn strip_code_fence(text: &str) -> &str {
    let mut t = text.trim();
    if let Some(rest) = t.strip_prefix("```json") {
        t = rest;
    } else if let Some(rest) = t.strip_prefix("```") {
        t = rest;
    }
    if let Some(rest) = t.strip_suffix("```") {
        t = rest;
    }
    t.trim()
}

/// Parse and validate a model response into a [`Summary`].
///
/// Malformed JSON degrades to a salvaged one-line summary (an `Ok` result,
/// not a retry); a document missing any of summary/categories/key_insights
/// is an error so the caller can retry. Missing category sub-lists are
/// back-filled, an absent or unrecognized threat level defaults to medium,
/// and recommended actions default to empty.
pub fn parse_analysis(response_text: &str) -> Result<Summary> {
    let cleaned = strip_code_fence(response_text);

    let raw: RawAnalysis = match serde_json::from_str(cleaned) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(error = %e, "JSON parsing failed; salvaging summary line");
            return Ok(salvage_analysis(response_text));
        }
    };

    let summary = raw
        .summary
        .ok_or_else(|| anyhow!("missing required key: summary"))?;
    let categories = raw
        .categories
        .ok_or_else(|| anyhow!("missing required key: categories"))?;
    let key_insights = raw
        .key_insights
        .ok_or_else(|| anyhow!("missing required key: key_insights"))?;

    Ok(Summary {
        summary,
        categories: Categories {
            new_features: categories.new_features.unwrap_or_default(),
            pricing_changes: categories.pricing_changes.unwrap_or_default(),
            messaging_updates: categories.messaging_updates.unwrap_or_default(),
        },
        key_insights,
        threat_level: parse_threat_level(raw.threat_level.as_deref()),
        recommended_actions: raw.recommended_actions.unwrap_or_default(),
        total_updates: 0,
    })
}

fn parse_threat_level(s: Option<&str>) -> ThreatLevel {
    match s.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("low") => ThreatLevel::Low,
        Some("high") => ThreatLevel::High,
        _ => ThreatLevel::Medium,
    }
}

/// Pull a summary-looking line out of a non-JSON response: the first of the
/// leading lines that is long enough and mentions updates or competitors.
fn salvage_analysis(text: &str) -> Summary {
    let summary = text
        .lines()
        .take(SALVAGE_SCAN_LINES)
        .map(str::trim)
        .find(|line| {
            if line.chars().count() <= SALVAGE_MIN_LINE_CHARS {
                return false;
            }
            let lower = line.to_ascii_lowercase();
            lower.contains("update") || lower.contains("competitor")
        })
        .map(|line| truncate_chars(line, SALVAGE_MAX_CHARS))
        .unwrap_or_else(|| "Analysis completed but summary extraction failed.".to_string());

    Summary {
        summary,
        categories: Categories::default(),
        key_insights: Vec::new(),
        threat_level: ThreatLevel::Medium,
        recommended_actions: Vec::new(),
        total_updates: 0,
    }
}
