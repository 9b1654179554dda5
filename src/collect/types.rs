// src/collect/types.rs
use crate::config::SourceKind;

/// One normalized piece of content extracted from a source. Produced by a
/// collector, consumed by the recent-window filter and the formatters; not
/// mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Update {
    /// Non-empty; capped at 200 chars.
    pub title: String,
    /// Non-empty best effort; capped at 500 chars.
    pub content: String,
    /// ISO-8601 where the source provided one; best-effort text otherwise.
    pub date: String,
    pub source: String,
    pub source_type: SourceKind,
}
