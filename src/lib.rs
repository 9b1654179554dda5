// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod agent;
pub mod analyze;
pub mod collect;
pub mod config;
pub mod notify;
pub mod schedule;

// ---- Re-exports for stable public API ----
pub use agent::CompetitorAgent;
pub use analyze::{Categories, Summarizer, Summary, TextModel, ThreatLevel};
pub use collect::types::Update;
pub use config::{Settings, Source, SourceKind};
