// src/agent.rs
//! Orchestrator: load sources, collect, filter, summarize, notify.
//!
//! Error policy: every stage recovers locally (collectors isolate failing
//! sources, the summarizer synthesizes a fallback, notifiers report bools).
//! `run_analysis` catches anything that still escapes and raises a
//! best-effort Slack alert whose own failure is swallowed.

use anyhow::Result;
use chrono::Utc;

use crate::analyze::{GeminiClient, Summarizer, Summary};
use crate::collect::{filter_recent, Collectors};
use crate::config::{load_sources_default, Settings, Source};
use crate::notify::{notion::NotionUpdater, slack::SlackNotifier, Report};

pub const RECENT_WINDOW_DAYS: i64 = 7;

pub struct CompetitorAgent {
    sources: Vec<Source>,
    collectors: Collectors,
    summarizer: Summarizer,
    slack: SlackNotifier,
    notion: NotionUpdater,
}

impl CompetitorAgent {
    /// Build the agent from validated settings. Sources come from the config
    /// file; a load failure means an empty source set, not a crash.
    pub fn new(settings: Settings) -> Self {
        let sources = load_sources_default();
        tracing::info!(count = sources.len(), "initialized agent with sources");
        Self {
            sources,
            collectors: Collectors::new(),
            summarizer: Summarizer::new(Box::new(GeminiClient::new(settings.gemini_api_key))),
            slack: SlackNotifier::new(settings.slack_webhook_url),
            notion: NotionUpdater::new(settings.notion_token, settings.notion_page_id),
        }
    }

    /// One full pipeline pass. Never propagates; failures are logged and
    /// alerted best-effort so the scheduling loop keeps running.
    pub async fn run_analysis(&self) {
        tracing::info!("starting weekly competitor analysis");
        match self.run_analysis_inner().await {
            Ok(()) => tracing::info!("weekly analysis completed successfully"),
            Err(e) => {
                tracing::error!(error = ?e, "weekly analysis failed");
                let alert = format!("Competitor monitoring failed: {e}");
                let _ = self.slack.send_error_alert(&alert).await;
            }
        }
    }

    async fn run_analysis_inner(&self) -> Result<()> {
        let updates = self.collectors.collect_all(&self.sources).await;
        let recent = filter_recent(updates, RECENT_WINDOW_DAYS);
        let summary = self.summarizer.summarize(&recent).await;
        self.send_notifications(summary).await;
        Ok(())
    }

    /// Both destinations are independent and best-effort; one failing does
    /// not block the other.
    async fn send_notifications(&self, summary: Summary) {
        if self.slack.send_summary(&summary).await {
            tracing::info!("sent summary to Slack");
        }
        let report = Report::weekly(summary, Utc::now());
        if self.notion.create_report_page(&report).await {
            tracing::info!("updated Notion page");
        }
    }
}
