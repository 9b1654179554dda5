// tests/summarizer_fallback.rs
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use competitor_monitor::analyze::{format_updates, Summarizer, TextModel, ThreatLevel};
use competitor_monitor::collect::types::Update;
use competitor_monitor::config::SourceKind;

struct FailingModel {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TextModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("service unavailable"))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

struct EmptyModel;

#[async_trait]
impl TextModel for EmptyModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok("   ".to_string())
    }
    fn name(&self) -> &'static str {
        "empty"
    }
}

fn update(source: &str) -> Update {
    Update {
        title: "title".into(),
        content: "content".into(),
        date: chrono::Utc::now().to_rfc3339(),
        source: source.into(),
        source_type: SourceKind::Rss,
    }
}

#[tokio::test]
async fn all_failed_attempts_yield_fallback_citing_source_count() {
    let calls = Arc::new(AtomicUsize::new(0));
    let summarizer = Summarizer::new(Box::new(FailingModel {
        calls: calls.clone(),
    }))
    .with_backoff(Duration::from_millis(1));

    let updates = vec![update("Acme"), update("Globex"), update("Initech")];
    let summary = summarizer.summarize(&updates).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3, "retries exactly 3 times");
    assert!(summary.summary.contains("Collected 3 competitor updates"));
    assert!(summary
        .key_insights
        .iter()
        .any(|i| i.contains("manual review")));
    assert_eq!(summary.threat_level, ThreatLevel::Medium);
    assert_eq!(summary.total_updates, 3);
    // structural invariant: all three categories present and empty
    assert!(summary.categories.new_features.is_empty());
    assert!(summary.categories.pricing_changes.is_empty());
    assert!(summary.categories.messaging_updates.is_empty());
}

#[tokio::test]
async fn empty_responses_are_retried_then_fall_back() {
    let summarizer =
        Summarizer::new(Box::new(EmptyModel)).with_backoff(Duration::from_millis(1));

    let updates = vec![update("Acme")];
    let summary = summarizer.summarize(&updates).await;
    assert!(summary.summary.contains("Collected 1 competitor updates"));
}

#[tokio::test]
async fn zero_updates_skip_the_model_entirely() {
    let calls = Arc::new(AtomicUsize::new(0));
    let summarizer = Summarizer::new(Box::new(FailingModel {
        calls: calls.clone(),
    }))
    .with_backoff(Duration::from_millis(1));

    let summary = summarizer.summarize(&[]).await;

    assert_eq!(calls.load(Ordering::SeqCst), 0, "no model call for zero updates");
    assert_eq!(summary.total_updates, 0);
    assert!(summary
        .summary
        .contains("No significant competitor updates found this week"));
}

#[test]
fn format_updates_produces_one_source_line_per_update() {
    let text = format_updates(&[update("A"), update("B")]);
    let count = text.lines().filter(|l| l.starts_with("Source:")).count();
    assert_eq!(count, 2);
}
