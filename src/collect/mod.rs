// src/collect/mod.rs
//! Source collectors: per-kind fetch routines behind one dispatch, plus the
//! recent-window filter and shared text utilities.
//!
//! Error policy: a failing source is logged and contributes nothing; a
//! collection pass never aborts.

pub mod feed;
pub mod social;
pub mod types;
pub mod website;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::time::Duration as StdDuration;

use crate::config::{Source, SourceKind};
use types::Update;

pub const TITLE_MAX_CHARS: usize = 200;
pub const CONTENT_MAX_CHARS: usize = 500;

/// Pause after each source during a multi-source pass.
const SOURCE_PAUSE: StdDuration = StdDuration::from_secs(1);

/// HTTP clients shared across collection passes.
pub struct Collectors {
    scraper: website::WebScraper,
    feeds: feed::FeedCollector,
}

impl Collectors {
    pub fn new() -> Self {
        Self {
            scraper: website::WebScraper::new(),
            feeds: feed::FeedCollector::new(),
        }
    }

    /// Collect from a single source, dispatching by kind. Errors are the
    /// caller's to isolate.
    pub async fn collect_from(&self, source: &Source) -> anyhow::Result<Vec<Update>> {
        match source.kind {
            SourceKind::Website => self.scraper.collect(source).await,
            SourceKind::Rss => self.feeds.collect(source).await,
            SourceKind::Twitter | SourceKind::Linkedin => social::collect(source).await,
        }
    }

    /// Collect from every configured source. Individual failures reduce
    /// coverage but never abort the pass; a one-second pause follows each
    /// source as simple rate limiting.
    pub async fn collect_all(&self, sources: &[Source]) -> Vec<Update> {
        let mut all = Vec::new();
        for source in sources {
            tracing::info!(source = %source.name, "collecting");
            match self.collect_from(source).await {
                Ok(mut updates) => all.append(&mut updates),
                Err(e) => {
                    tracing::error!(error = ?e, source = %source.name, "collection failed");
                }
            }
            tokio::time::sleep(SOURCE_PAUSE).await;
        }
        tracing::info!(count = all.len(), "collected updates");
        all
    }
}

impl Default for Collectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort parse of the ISO-8601-ish date strings collectors produce.
pub fn parse_update_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt.and_utc());
    }
    if let Ok(nd) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return nd.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
    }
    None
}

/// Keep updates dated within the last `days`. Updates whose dates do not
/// parse are retained rather than dropped, to avoid silent data loss.
pub fn filter_recent(updates: Vec<Update>, days: i64) -> Vec<Update> {
    let cutoff = Utc::now() - Duration::days(days);
    let kept: Vec<Update> = updates
        .into_iter()
        .filter(|u| match parse_update_date(&u.date) {
            Some(d) => d > cutoff,
            None => true,
        })
        .collect();
    tracing::info!(count = kept.len(), "filtered to recent updates");
    kept
}

/// Truncate on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Strip embedded markup: decode HTML entities, drop tags, collapse
/// whitespace.
pub fn strip_markup(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let no_tags = re_tags.replace_all(&decoded, " ");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&no_tags, " ").trim().to_string()
}
