// src/analyze/mod.rs
//! AI summarization: prompt construction, bounded retry with doubling
//! backoff, and the deterministic fallback used when the model stays
//! unavailable. The summarizer never errors outward; callers always get a
//! structured [`Summary`].

pub mod gemini;
pub mod parse;

pub use gemini::GeminiClient;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::collect::truncate_chars;
use crate::collect::types::Update;

/// Generative text model seam. Production uses [`GeminiClient`]; tests
/// inject mock or failing models.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate text for a prompt. An empty response is an error.
    async fn generate(&self, prompt: &str) -> Result<String>;
    /// Model name for diagnostics.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// The three fixed report categories. Always all present, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    #[serde(default)]
    pub new_features: Vec<String>,
    #[serde(default)]
    pub pricing_changes: Vec<String>,
    #[serde(default)]
    pub messaging_updates: Vec<String>,
}

/// The aggregated report for one run. Every field is populated even when the
/// model output was partial; defaulting happens at the parse boundary in
/// [`parse::parse_analysis`], never downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub summary: String,
    pub categories: Categories,
    pub key_insights: Vec<String>,
    pub threat_level: ThreatLevel,
    pub recommended_actions: Vec<String>,
    pub total_updates: usize,
}

pub const MAX_RETRIES: u32 = 3;
const PROMPT_INPUT_MAX_CHARS: usize = 8000;

pub struct Summarizer {
    model: Box<dyn TextModel>,
    max_retries: u32,
    backoff_base: Duration,
}

impl Summarizer {
    pub fn new(model: Box<dyn TextModel>) -> Self {
        Self {
            model,
            max_retries: MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
        }
    }

    pub fn with_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Summarize one run's worth of filtered updates. Zero updates yield the
    /// canned report without a model call; model failures fall back to a
    /// synthetic one. `total_updates` always equals `updates.len()`.
    pub async fn summarize(&self, updates: &[Update]) -> Summary {
        if updates.is_empty() {
            return zero_update_summary();
        }
        let updates_text = format_updates(updates);
        let mut summary = self.analyze(&updates_text).await;
        summary.total_updates = updates.len();
        summary
    }

    /// Bounded retry around the model call. Malformed JSON is salvaged into
    /// a partial result (not retried); transport errors, empty responses,
    /// and structurally incomplete JSON count as failed attempts. Backoff
    /// doubles per attempt.
    pub async fn analyze(&self, updates_text: &str) -> Summary {
        let prompt = build_prompt(updates_text);

        for attempt in 0..self.max_retries {
            match self.model.generate(&prompt).await {
                Ok(text) if !text.trim().is_empty() => match parse::parse_analysis(&text) {
                    Ok(summary) => {
                        tracing::info!(model = self.model.name(), "analyzed updates");
                        return summary;
                    }
                    Err(e) => {
                        tracing::warn!(error = ?e, attempt = attempt + 1, "analysis response rejected");
                    }
                },
                Ok(_) => {
                    tracing::warn!(attempt = attempt + 1, "empty model response");
                }
                Err(e) => {
                    tracing::warn!(error = ?e, attempt = attempt + 1, "model call failed");
                }
            }
            if attempt + 1 < self.max_retries {
                tokio::time::sleep(self.backoff_base * 2u32.saturating_pow(attempt)).await;
            }
        }

        tracing::error!("all analysis attempts failed; using fallback summary");
        fallback_analysis(updates_text)
    }
}

/// Canned report for a run that found nothing.
pub fn zero_update_summary() -> Summary {
    Summary {
        summary: "No significant competitor updates found this week.".to_string(),
        categories: Categories::default(),
        key_insights: Vec::new(),
        threat_level: ThreatLevel::Medium,
        recommended_actions: Vec::new(),
        total_updates: 0,
    }
}

/// Format retained updates into the delimited block fed to the model.
pub fn format_updates(updates: &[Update]) -> String {
    updates
        .iter()
        .map(|u| {
            format!(
                "Source: {}\nDate: {}\nTitle: {}\nContent: {}\n---",
                u.source, u.date, u.title, u.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn build_prompt(updates_text: &str) -> String {
    let capped = truncate_chars(updates_text, PROMPT_INPUT_MAX_CHARS);
    format!(
        r#"You are a competitive intelligence analyst. Analyze the following competitor updates and provide a structured summary.

COMPETITOR UPDATES:
{capped}

Please provide your analysis in the following JSON format:

{{
    "summary": "A concise 2-3 sentence summary of the most important developments",
    "categories": {{
        "new_features": [
            "List of new features or product updates mentioned"
        ],
        "pricing_changes": [
            "List of any pricing updates, plans, or monetization changes"
        ],
        "messaging_updates": [
            "List of branding, positioning, or marketing message changes"
        ]
    }},
    "key_insights": [
        "List of 3-5 strategic insights or competitive implications"
    ],
    "threat_level": "low/medium/high - based on competitive threat",
    "recommended_actions": [
        "List of 2-3 recommended responses or actions"
    ]
}}

Focus on:
1. New product features or capabilities
2. Pricing strategy changes
3. Market positioning shifts
4. Competitive advantages or threats
5. Customer experience improvements

Be concise but comprehensive. If no significant updates are found, indicate that in the summary.

IMPORTANT: Respond ONLY with valid JSON. No additional text or formatting."#
    )
}

/// Deterministic synthetic summary for when every model attempt failed:
/// counts the `Source:` lines in the formatted input and flags the run for
/// manual review.
pub fn fallback_analysis(updates_text: &str) -> Summary {
    let update_count = updates_text
        .lines()
        .filter(|line| line.starts_with("Source:"))
        .count();

    Summary {
        summary: format!(
            "Collected {update_count} competitor updates this week. AI analysis temporarily unavailable - manual review recommended."
        ),
        categories: Categories::default(),
        key_insights: vec![
            "AI analysis failed - manual review needed".to_string(),
            format!("{update_count} updates collected for review"),
        ],
        threat_level: ThreatLevel::Medium,
        recommended_actions: vec![
            "Review collected updates manually".to_string(),
            "Check AI service status and retry analysis".to_string(),
        ],
        total_updates: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;

    fn update(source: &str, title: &str) -> Update {
        Update {
            title: title.into(),
            content: "content".into(),
            date: "2024-05-12".into(),
            source: source.into(),
            source_type: SourceKind::Rss,
        }
    }

    #[test]
    fn formats_updates_with_delimiters() {
        let text = format_updates(&[update("Acme", "v2"), update("Globex", "pricing")]);
        assert_eq!(text.matches("Source:").count(), 2);
        assert_eq!(text.matches("---").count(), 2);
        assert!(text.contains("Source: Acme\nDate: 2024-05-12\nTitle: v2\nContent: content"));
    }

    #[test]
    fn fallback_counts_source_lines() {
        let text = format_updates(&[
            update("Acme", "a"),
            update("Globex", "b"),
            update("Initech", "c"),
        ]);
        let s = fallback_analysis(&text);
        assert!(s.summary.contains("3 competitor updates"));
        assert!(s.key_insights.iter().any(|i| i.contains("manual review")));
        assert_eq!(s.threat_level, ThreatLevel::Medium);
    }

    #[test]
    fn prompt_embeds_capped_input() {
        let long = "x".repeat(10_000);
        let prompt = build_prompt(&long);
        assert!(prompt.contains(&"x".repeat(8000)));
        assert!(!prompt.contains(&"x".repeat(8001)));
        assert!(prompt.contains("Respond ONLY with valid JSON"));
    }

    #[test]
    fn zero_update_summary_is_canned() {
        let s = zero_update_summary();
        assert_eq!(s.total_updates, 0);
        assert!(s.summary.contains("No significant competitor updates"));
        assert!(s.categories.new_features.is_empty());
    }
}
