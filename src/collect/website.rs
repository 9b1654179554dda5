// src/collect/website.rs
//! Website collection: fetch a page and extract update entries with CSS
//! selectors (configured per source, or structural defaults).

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use super::types::Update;
use super::{truncate_chars, CONTENT_MAX_CHARS, TITLE_MAX_CHARS};
use crate::config::Source;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const MAX_ENTRIES: usize = 10;
const CONTENT_ELEMENTS: usize = 3;

const DEFAULT_CONTAINER: &str = "article, .post, .update, .changelog-entry";
const DEFAULT_TITLE: &str = "h1, h2, h3, .title";
const DEFAULT_CONTENT: &str = "p, .content, .description";
const DEFAULT_DATE: &str = "time, .date, .timestamp";

pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
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
            .with_context(|| format!("fetching {}", source.url))?
            .error_for_status()
            .context("website non-2xx")?
            .text()
            .await
            .context("reading website body")?;

        // Parsing stays synchronous: scraper::Html is not Send and must not
        // live across an await.
        let updates = extract_updates(&body, source)?;
        tracing::info!(count = updates.len(), url = %source.url, "scraped updates");
        Ok(updates)
    }
}

impl Default for WebScraper {
    fn default() -> Self {
        Self::new()
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css:?}: {e}"))
}

/// Extract up to [`MAX_ENTRIES`] update candidates from a page.
pub(crate) fn extract_updates(html: &str, source: &Source) -> Result<Vec<Update>> {
    let sel = source.selectors.clone().unwrap_or_default();
    let container = selector(sel.container.as_deref().unwrap_or(DEFAULT_CONTAINER))?;
    let title_sel = selector(sel.title.as_deref().unwrap_or(DEFAULT_TITLE))?;
    let content_sel = selector(sel.content.as_deref().unwrap_or(DEFAULT_CONTENT))?;
    let date_sel = selector(sel.date.as_deref().unwrap_or(DEFAULT_DATE))?;

    let document = Html::parse_document(html);
    let mut updates = Vec::new();

    for element in document.select(&container).take(MAX_ENTRIES) {
        let title = element
            .select(&title_sel)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "No title".to_string());

        let content = element
            .select(&content_sel)
            .take(CONTENT_ELEMENTS)
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ");

        let date = element
            .select(&date_sel)
            .next()
            .map(extract_date)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        updates.push(Update {
            title: truncate_chars(&title, TITLE_MAX_CHARS),
            content: truncate_chars(content.trim(), CONTENT_MAX_CHARS),
            date,
            source: source.name.clone(),
            source_type: source.kind,
        });
    }

    Ok(updates)
}

fn element_text(el: ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Date from the `datetime` attribute when present, else common textual
/// patterns over the element text, else the current time.
fn extract_date(el: ElementRef) -> String {
    if let Some(dt) = el.value().attr("datetime") {
        let dt = dt.trim();
        if !dt.is_empty() {
            return dt.to_string();
        }
    }

    static PATTERNS: OnceCell<Vec<Regex>> = OnceCell::new();
    let patterns = PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap(),
            Regex::new(r"\d{1,2}/\d{1,2}/\d{4}").unwrap(),
            Regex::new(r"\w+ \d{1,2}, \d{4}").unwrap(),
        ]
    });

    let text = element_text(el);
    for re in patterns {
        if let Some(m) = re.find(&text) {
            return m.as_str().to_string();
        }
    }
    Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceKind;

    fn website_source(selectors: Option<crate::config::SelectorMap>) -> Source {
        Source {
            name: "Acme".into(),
            url: "https://acme.test/changelog".into(),
            kind: SourceKind::Website,
            selectors,
        }
    }

    const PAGE: &str = r#"
        <html><body>
          <article>
            <h2>Acme launches widgets</h2>
            <p>First paragraph.</p>
            <p>Second paragraph.</p>
            <time datetime="2024-05-12T10:00:00+00:00">May 12</time>
          </article>
          <article>
            <p>Entry without a heading, published 2024-05-10 at noon.</p>
            <span class="date">2024-05-10</span>
          </article>
        </body></html>
    "#;

    #[test]
    fn extracts_title_content_and_datetime_attribute() {
        let out = extract_updates(PAGE, &website_source(None)).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "Acme launches widgets");
        assert_eq!(out[0].content, "First paragraph. Second paragraph.");
        assert_eq!(out[0].date, "2024-05-12T10:00:00+00:00");
        assert_eq!(out[0].source, "Acme");
    }

    #[test]
    fn falls_back_to_default_title_and_regex_date() {
        let out = extract_updates(PAGE, &website_source(None)).unwrap();
        assert_eq!(out[1].title, "No title");
        assert_eq!(out[1].date, "2024-05-10");
    }

    #[test]
    fn caps_entries_and_truncates_titles() {
        let mut page = String::from("<html><body>");
        let long_title = "x".repeat(300);
        for _ in 0..12 {
            page.push_str(&format!(
                "<article><h2>{long_title}</h2><p>body</p></article>"
            ));
        }
        page.push_str("</body></html>");

        let out = extract_updates(&page, &website_source(None)).unwrap();
        assert_eq!(out.len(), 10);
        assert_eq!(out[0].title.chars().count(), 200);
    }

    #[test]
    fn custom_selectors_override_defaults() {
        let page = r#"<div class="entry"><span class="headline">Custom</span>
                      <div class="body">text</div></div>"#;
        let selectors = crate::config::SelectorMap {
            container: Some(".entry".into()),
            title: Some(".headline".into()),
            content: Some(".body".into()),
            date: None,
        };
        let out = extract_updates(page, &website_source(Some(selectors))).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Custom");
        assert_eq!(out[0].content, "text");
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let selectors = crate::config::SelectorMap {
            container: Some(":::nope".into()),
            ..Default::default()
        };
        assert!(extract_updates(PAGE, &website_source(Some(selectors))).is_err());
    }
}
