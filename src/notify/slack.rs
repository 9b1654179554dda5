// src/notify/slack.rs
//! Slack webhook notifier: formats the summary into a message with block
//! sections, posts with bounded retry, and reports success as a bool.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::backoff_delay;
use crate::analyze::Summary;

const HEADER_MARKER: &str = "\u{1F50D} **";
const MAX_ITEMS_PER_CATEGORY: usize = 5;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: super::MAX_RETRIES,
            backoff_base: super::BACKOFF_BASE,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Post a message to the webhook. Returns true on success; every failure
    /// path is logged and reported as false, never raised.
    pub async fn send_message(&self, message: &str) -> bool {
        let payload = json!({
            "text": message,
            "username": "Competitor Bot",
            "icon_emoji": ":mag:",
            "blocks": format_blocks(message),
        });

        for attempt in 0..self.max_retries {
            let res = self
                .client
                .post(&self.webhook_url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await;

            match res {
                Ok(rsp) if rsp.status().is_success() => {
                    tracing::info!("sent message to Slack");
                    return true;
                }
                Ok(rsp) => {
                    tracing::warn!(status = %rsp.status(), attempt = attempt + 1, "Slack webhook rejected message");
                }
                Err(e) => {
                    tracing::error!(error = ?e, attempt = attempt + 1, "Slack notification attempt failed");
                }
            }
            if attempt + 1 < self.max_retries {
                tokio::time::sleep(backoff_delay(self.backoff_base, attempt)).await;
            }
        }

        tracing::error!("all Slack notification attempts failed");
        false
    }

    /// Format and post the weekly summary.
    pub async fn send_summary(&self, summary: &Summary) -> bool {
        self.send_message(&format_summary_message(summary, Utc::now()))
            .await
    }

    /// Best-effort alert for pipeline failures.
    pub async fn send_error_alert(&self, error_message: &str) -> bool {
        let alert = format!(
            "\u{1F6A8} *Competitor Monitoring Alert*\n\n*Error*: {error_message}\n*Time*: {}\n*Action Required*: Check logs and system status",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        );
        self.send_message(&alert).await
    }
}

/// Render the run summary as a Slack message: bolded headers, at most
/// [`MAX_ITEMS_PER_CATEGORY`] bullets per category, trailing timestamp.
pub fn format_summary_message(summary: &Summary, now: DateTime<Utc>) -> String {
    let mut msg = String::new();
    msg.push_str("\u{1F50D} **Weekly Competitor Intelligence Report**\n\n");
    msg.push_str(&format!(
        "\u{1F4CA} **Total Updates**: {}\n\n",
        summary.total_updates
    ));
    msg.push_str(&format!("\u{1F4CB} **Summary**:\n{}\n\n", summary.summary));

    push_category(&mut msg, "\u{1F195} **New Features**", &summary.categories.new_features);
    push_category(&mut msg, "\u{1F4B0} **Pricing Changes**", &summary.categories.pricing_changes);
    push_category(&mut msg, "\u{1F4E2} **Messaging Updates**", &summary.categories.messaging_updates);

    msg.push_str(&format!("\n\u{1F4C5} Generated: {}", now.format("%Y-%m-%d %H:%M")));
    msg
}

fn push_category(msg: &mut String, header: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    msg.push_str(&format!("{header} ({}):\n", items.len()));
    for item in items.iter().take(MAX_ITEMS_PER_CATEGORY) {
        msg.push_str(&format!("\u{2022} {item}\n"));
    }
    msg.push('\n');
}

/// Split on blank-line boundaries into Slack blocks for richer rendering:
/// the report title becomes a `header` block, everything else a mrkdwn
/// `section`, with a trailing divider.
pub(crate) fn format_blocks(message: &str) -> Vec<Value> {
    let mut blocks = Vec::new();

    for section in message.split("\n\n") {
        let section = section.trim();
        if section.is_empty() {
            continue;
        }
        if section.starts_with(HEADER_MARKER) {
            let text = section
                .replace(HEADER_MARKER, "")
                .replace("**", "")
                .trim()
                .to_string();
            blocks.push(json!({
                "type": "header",
                "text": { "type": "plain_text", "text": text }
            }));
        } else {
            blocks.push(json!({
                "type": "section",
                "text": { "type": "mrkdwn", "text": section }
            }));
        }
    }

    blocks.push(json!({ "type": "divider" }));
    blocks
}
