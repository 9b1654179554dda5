// src/notify/notion.rs
//! Notion notifier: creates a report page under a configured parent page,
//! with the same bounded-retry contract as the Slack notifier, plus a
//! connectivity self-check.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{backoff_delay, Report};
use crate::collect::truncate_chars;

const DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const MAX_ITEMS_PER_CATEGORY: usize = 10;
// Notion rich_text content limit per block
const ITEM_MAX_CHARS: usize = 2000;

pub struct NotionUpdater {
    token: String,
    page_id: String,
    base_url: String,
    client: Client,
    timeout: Duration,
    max_retries: u32,
    backoff_base: Duration,
}

impl NotionUpdater {
    pub fn new(token: String, page_id: String) -> Self {
        Self {
            token,
            page_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: Client::new(),
            timeout: Duration::from_secs(30),
            max_retries: super::MAX_RETRIES,
            backoff_base: super::BACKOFF_BASE,
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
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

    /// Create a new report page under the configured parent page. Returns
    /// true on success; every failure path is logged and reported as false.
    pub async fn create_report_page(&self, report: &Report) -> bool {
        let body = build_page_body(&self.page_id, report);

        for attempt in 0..self.max_retries {
            let res = self
                .client
                .post(format!("{}/pages", self.base_url))
                .bearer_auth(&self.token)
                .header("Notion-Version", NOTION_VERSION)
                .timeout(self.timeout)
                .json(&body)
                .send()
                .await;

            match res {
                Ok(rsp) if rsp.status().is_success() => {
                    tracing::info!("created Notion page");
                    return true;
                }
                Ok(rsp) => {
                    tracing::warn!(status = %rsp.status(), attempt = attempt + 1, "Notion API rejected page");
                }
                Err(e) => {
                    tracing::error!(error = ?e, attempt = attempt + 1, "Notion update attempt failed");
                }
            }
            if attempt + 1 < self.max_retries {
                tokio::time::sleep(backoff_delay(self.backoff_base, attempt)).await;
            }
        }

        tracing::error!("all Notion update attempts failed");
        false
    }

    /// Connectivity self-check: fetch the configured parent page.
    pub async fn test_connection(&self) -> bool {
        let res = self
            .client
            .get(format!("{}/pages/{}", self.base_url, self.page_id))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .timeout(self.timeout)
            .send()
            .await;

        match res {
            Ok(rsp) => rsp.status().is_success(),
            Err(e) => {
                tracing::error!(error = ?e, "Notion connection test failed");
                false
            }
        }
    }
}

/// Build the nested block structure for a report page: heading + summary
/// paragraph, per-category heading with bulleted items, divider, and a
/// trailing generated-at paragraph.
pub(crate) fn build_page_body(parent_page_id: &str, report: &Report) -> Value {
    let s = &report.summary;

    let mut children = vec![
        heading_2("Executive Summary"),
        paragraph(&format!(
            "Total Updates: {}\n\n{}",
            s.total_updates, s.summary
        )),
    ];
    children.extend(category_blocks("\u{1F195} New Features", &s.categories.new_features));
    children.extend(category_blocks("\u{1F4B0} Pricing Changes", &s.categories.pricing_changes));
    children.extend(category_blocks("\u{1F4E2} Messaging Updates", &s.categories.messaging_updates));
    children.push(json!({ "object": "block", "type": "divider", "divider": {} }));
    children.push(paragraph(&format!(
        "Generated on: {} UTC",
        report.generated_at.format("%Y-%m-%d %H:%M:%S")
    )));

    json!({
        "parent": { "page_id": parent_page_id },
        "properties": {
            "title": {
                "title": [{ "text": { "content": report.title } }]
            }
        },
        "children": children
    })
}

fn category_blocks(title: &str, items: &[String]) -> Vec<Value> {
    let mut blocks = vec![json!({
        "object": "block",
        "type": "heading_3",
        "heading_3": { "rich_text": [{ "text": { "content": title } }] }
    })];

    if items.is_empty() {
        blocks.push(paragraph("No updates in this category this week."));
    } else {
        for item in items.iter().take(MAX_ITEMS_PER_CATEGORY) {
            blocks.push(json!({
                "object": "block",
                "type": "bulleted_list_item",
                "bulleted_list_item": {
                    "rich_text": [{ "text": { "content": truncate_chars(item, ITEM_MAX_CHARS) } }]
                }
            }));
        }
    }
    blocks
}

fn heading_2(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": { "rich_text": [{ "text": { "content": text } }] }
    })
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [{ "text": { "content": text } }] }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{Categories, Summary, ThreatLevel};
    use chrono::{TimeZone, Utc};

    fn report() -> Report {
        let summary = Summary {
            summary: "Busy week.".into(),
            categories: Categories {
                new_features: (0..12).map(|i| format!("feature {i}")).collect(),
                pricing_changes: Vec::new(),
                messaging_updates: vec!["x".repeat(3000)],
            },
            key_insights: vec!["insight".into()],
            threat_level: ThreatLevel::Low,
            recommended_actions: Vec::new(),
            total_updates: 13,
        };
        Report::weekly(summary, Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap())
    }

    #[test]
    fn page_body_targets_parent_and_carries_title() {
        let body = build_page_body("parent-123", &report());
        assert_eq!(body["parent"]["page_id"], "parent-123");
        assert_eq!(
            body["properties"]["title"]["title"][0]["text"]["content"],
            "Competitor Intelligence - Week of 2024-05-13"
        );
    }

    #[test]
    fn children_cap_items_and_cover_every_category() {
        let body = build_page_body("p", &report());
        let children = body["children"].as_array().unwrap();

        let bullets: Vec<&Value> = children
            .iter()
            .filter(|c| c["type"] == "bulleted_list_item")
            .collect();
        // 12 features capped at 10, plus 1 messaging item
        assert_eq!(bullets.len(), 11);

        let headings = children
            .iter()
            .filter(|c| c["type"] == "heading_3")
            .count();
        assert_eq!(headings, 3);

        // empty category still gets its heading + placeholder paragraph
        assert!(children.iter().any(|c| {
            c["type"] == "paragraph"
                && c["paragraph"]["rich_text"][0]["text"]["content"]
                    == "No updates in this category this week."
        }));

        // long items are capped at the Notion limit
        let longest = bullets
            .iter()
            .map(|b| {
                b["bulleted_list_item"]["rich_text"][0]["text"]["content"]
                    .as_str()
                    .unwrap()
                    .chars()
                    .count()
            })
            .max()
            .unwrap();
        assert_eq!(longest, 2000);

        assert_eq!(children.last().unwrap()["type"], "paragraph");
        assert!(children.iter().any(|c| c["type"] == "divider"));
    }
}
