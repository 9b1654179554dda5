// src/collect/feed.rs
//! RSS/Atom collection via feed-rs: newest entries, markup-stripped content,
//! published/updated timestamp fallback.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;

use super::types::Update;
use super::{strip_markup, truncate_chars, CONTENT_MAX_CHARS, TITLE_MAX_CHARS};
use crate::config::Source;

const MAX_ENTRIES: usize = 15;

pub struct FeedCollector {
    client: Client,
}

impl FeedCollector {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self { client }
    }

    pub async fn collect(&self, source: &Source) -> Result<Vec<Update>> {
        let body = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("fetching feed {}", source.url))?
            .error_for_status()
            .context("feed non-2xx")?
            .bytes()
            .await
            .context("reading feed body")?;

        let updates = parse_entries(&body, source)?;
        tracing::info!(count = updates.len(), url = %source.url, "parsed feed entries");
        Ok(updates)
    }
}

impl Default for FeedCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Map up to [`MAX_ENTRIES`] feed entries onto update records. Content comes
/// from the first available of content body / summary; timestamps from
/// published, then updated, then the current time.
pub(crate) fn parse_entries(body: &[u8], source: &Source) -> Result<Vec<Update>> {
    let feed = feed_rs::parser::parse(body)
        .with_context(|| format!("parsing feed from {}", source.url))?;

    let mut updates = Vec::new();
    for entry in feed.entries.into_iter().take(MAX_ENTRIES) {
        let title = entry
            .title
            .map(|t| t.content)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "No title".to_string());

        let content = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| entry.summary.map(|s| s.content))
            .map(|raw| strip_markup(&raw))
            .unwrap_or_else(|| "No content".to_string());

        let date = entry
            .published
            .or(entry.updated)
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        updates.push(Update {
            title: truncate_chars(title.trim(), TITLE_MAX_CHARS),
            content: truncate_chars(&content, CONTENT_MAX_CHARS),
            date,
            source: source.name.clone(),
            source_type: source.kind,
        });
    }

    Ok(updates)
}
