// src/config.rs
//! Source configuration (sources.json) and required environment settings.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const ENV_SOURCES_PATH: &str = "SOURCES_CONFIG_PATH";
const DEFAULT_SOURCES_PATH: &str = "sources.json";

/// Kind of a monitored origin; drives collector dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Website,
    Rss,
    Twitter,
    Linkedin,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Website => "website",
            SourceKind::Rss => "rss",
            SourceKind::Twitter => "twitter",
            SourceKind::Linkedin => "linkedin",
        };
        f.write_str(s)
    }
}

/// CSS selectors for website sources. Every field is optional; the website
/// collector falls back to its structural defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorMap {
    pub container: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub date: Option<String>,
}

/// One monitored origin of competitor information. Loaded once at startup;
/// immutable afterward.
#[derive(Debug, Clone, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default)]
    pub selectors: Option<SelectorMap>,
}

#[derive(Deserialize)]
struct SourcesFile {
    sources: Vec<Source>,
}

/// Load sources from an explicit path.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let parsed: SourcesFile = serde_json::from_str(&content)
        .with_context(|| format!("parsing sources from {}", path.display()))?;
    Ok(parsed.sources)
}

/// Load sources using env var + fallback:
/// 1) $SOURCES_CONFIG_PATH
/// 2) sources.json in the working directory
///
/// A load failure degrades to an empty source set (logged); the run
/// continues without sources rather than crashing.
pub fn load_sources_default() -> Vec<Source> {
    let path = std::env::var(ENV_SOURCES_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SOURCES_PATH));
    match load_sources_from(&path) {
        Ok(sources) => sources,
        Err(e) => {
            tracing::error!(error = ?e, "failed to load sources");
            Vec::new()
        }
    }
}

/// Required environment settings, validated once at startup. Startup is the
/// only place allowed to refuse to run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub gemini_api_key: String,
    pub slack_webhook_url: String,
    pub notion_token: String,
    pub notion_page_id: String,
}

impl Settings {
    /// Read all required variables, naming every missing one in the error.
    pub fn from_env() -> Result<Self> {
        let mut missing = Vec::new();
        let mut get = |name: &'static str| match std::env::var(name) {
            Ok(v) if !v.trim().is_empty() => Some(v),
            _ => {
                missing.push(name);
                None
            }
        };

        let gemini_api_key = get("GEMINI_API_KEY");
        let slack_webhook_url = get("SLACK_WEBHOOK_URL");
        let notion_token = get("NOTION_TOKEN");
        let notion_page_id = get("NOTION_PAGE_ID");

        match (gemini_api_key, slack_webhook_url, notion_token, notion_page_id) {
            (Some(gemini_api_key), Some(slack_webhook_url), Some(notion_token), Some(notion_page_id)) => {
                Ok(Self {
                    gemini_api_key,
                    slack_webhook_url,
                    notion_token,
                    notion_page_id,
                })
            }
            _ => Err(anyhow!(
                "missing required environment variables: {}",
                missing.join(", ")
            )),
        }
    }
}
