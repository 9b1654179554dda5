// src/collect/social.rs
//! Social collection stubs. Twitter and LinkedIn both require API access the
//! agent does not have; collection yields no updates and logs a warning.
//
// TODO: wire the official APIs (Twitter API v2, LinkedIn) once credentials
// are provisioned.

use anyhow::Result;

use super::types::Update;
use crate::config::{Source, SourceKind};

pub async fn collect(source: &Source) -> Result<Vec<Update>> {
    match source.kind {
        SourceKind::Twitter => {
            tracing::warn!(source = %source.name, "twitter collection requires API access; returning no updates");
        }
        SourceKind::Linkedin => {
            tracing::warn!(source = %source.name, "linkedin collection requires API access; returning no updates");
        }
        other => {
            tracing::warn!(kind = %other, "unsupported social platform");
        }
    }
    Ok(Vec::new())
}
