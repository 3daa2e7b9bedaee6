//! Reference-metadata service: bibliographic lookup by paper title.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LookupError;

/// One author as returned by the reference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    pub family: String,
}

impl Author {
    pub fn new(given: Option<&str>, family: impl Into<String>) -> Self {
        Self {
            given: given.map(str::to_string),
            family: family.into(),
        }
    }

    /// "First Last", or just the family name.
    pub fn display_name(&self) -> String {
        match &self.given {
            Some(given) if !given.is_empty() => format!("{given} {}", self.family),
            _ => self.family.clone(),
        }
    }
}

/// Metadata for one publication. Passed through to the bibliography untouched
/// apart from key derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Title as the service spells it.
    pub title: String,

    #[serde(default)]
    pub authors: Vec<Author>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// Journal, proceedings or publisher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

/// Looks up bibliographic metadata for a paper title.
///
/// Implementations return [`LookupError::NotFound`] when the service answers
/// but has no match; the resolver treats that as permanent.
#[async_trait]
pub trait ReferenceService: Send + Sync {
    fn name(&self) -> &str;

    async fn lookup(&self, title: &str) -> Result<ReferenceRecord, LookupError>;
}
