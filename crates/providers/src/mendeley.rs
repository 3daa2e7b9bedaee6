//! Mendeley catalog search as a [`ReferenceService`].
//!
//! Issues `GET /search/documents?title=…&limit=1` with a bearer token and
//! maps the first hit to a [`ReferenceRecord`]. An empty result list is
//! [`LookupError::NotFound`].

use std::time::Duration;

use async_trait::async_trait;
use dossier_config::ReferencesConfig;
use dossier_core::error::LookupError;
use dossier_core::reference::{Author, ReferenceRecord, ReferenceService};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http;

const DOCUMENT_MEDIA_TYPE: &str = "application/vnd.mendeley-document.1+json";

pub struct MendeleyClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl MendeleyClient {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Network(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    /// Build from the `[references]` config section. Fails when no token is
    /// configured.
    pub fn from_config(config: &ReferencesConfig) -> Result<Self, LookupError> {
        let token = config.token.clone().ok_or(LookupError::NotConfigured)?;
        Self::new(
            &config.api_url,
            token,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn to_record(doc: CatalogDocument, queried: &str) -> ReferenceRecord {
        let authors = doc
            .authors
            .into_iter()
            .filter_map(|a| {
                let family = a.last_name?;
                Some(Author::new(a.first_name.as_deref(), family))
            })
            .collect();

        ReferenceRecord {
            title: doc.title.unwrap_or_else(|| queried.to_string()),
            authors,
            year: doc.year,
            venue: doc.source,
            doi: doc.identifiers.and_then(|ids| ids.doi),
        }
    }
}

#[async_trait]
impl ReferenceService for MendeleyClient {
    fn name(&self) -> &str {
        "mendeley"
    }

    async fn lookup(&self, title: &str) -> Result<ReferenceRecord, LookupError> {
        let url = format!("{}/search/documents", self.base_url);
        debug!(title, "Searching Mendeley catalog");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", DOCUMENT_MEDIA_TYPE)
            .query(&[("title", title), ("limit", "1")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout(e.to_string())
                } else {
                    LookupError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(LookupError::RateLimited {
                retry_after_secs: http::retry_after_secs(response.headers()),
            });
        }

        if status == 401 || status == 403 {
            return Err(LookupError::AuthenticationFailed(
                "Mendeley token rejected".into(),
            ));
        }

        if status == 404 {
            return Err(LookupError::NotFound(title.to_string()));
        }

        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Mendeley returned error");
            return Err(LookupError::Api {
                status_code: status,
                message: body,
            });
        }

        let docs: Vec<CatalogDocument> = response
            .json()
            .await
            .map_err(|e| LookupError::Malformed(e.to_string()))?;

        docs.into_iter()
            .next()
            .map(|doc| Self::to_record(doc, title))
            .ok_or_else(|| LookupError::NotFound(title.to_string()))
    }
}

/// Stands in when lookups are disabled or no token is configured. Every
/// lookup fails permanently, so citations stay unresolved with no traffic.
pub struct OfflineReferences;

#[async_trait]
impl ReferenceService for OfflineReferences {
    fn name(&self) -> &str {
        "offline"
    }

    async fn lookup(&self, _title: &str) -> Result<ReferenceRecord, LookupError> {
        Err(LookupError::NotConfigured)
    }
}

// --- Mendeley catalog types (internal) ---

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Vec<CatalogAuthor>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    identifiers: Option<CatalogIdentifiers>,
}

#[derive(Debug, Deserialize)]
struct CatalogAuthor {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogIdentifiers {
    #[serde(default)]
    doi: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_catalog_document() {
        let data = r#"[{
            "title": "Pricing Congestible Network Resources",
            "authors": [
                {"first_name": "Jeffrey K.", "last_name": "MacKie-Mason"},
                {"first_name": "Hal R.", "last_name": "Varian"},
                {"first_name": "Anonymous"}
            ],
            "year": 1995,
            "source": "IEEE Journal on Selected Areas in Communications",
            "identifiers": {"doi": "10.1109/49.414634"}
        }]"#;
        let docs: Vec<CatalogDocument> = serde_json::from_str(data).unwrap();
        let record = MendeleyClient::to_record(docs.into_iter().next().unwrap(), "q");

        assert_eq!(record.title, "Pricing Congestible Network Resources");
        assert_eq!(record.authors.len(), 2);
        assert_eq!(record.authors[1].family, "Varian");
        assert_eq!(record.year, Some(1995));
        assert_eq!(record.doi.as_deref(), Some("10.1109/49.414634"));
    }

    #[test]
    fn missing_title_falls_back_to_query() {
        let docs: Vec<CatalogDocument> = serde_json::from_str(r#"[{"year": 2001}]"#).unwrap();
        let record = MendeleyClient::to_record(docs.into_iter().next().unwrap(), "Queried");
        assert_eq!(record.title, "Queried");
        assert!(record.authors.is_empty());
    }

    #[test]
    fn from_config_requires_token() {
        let config = ReferencesConfig::default();
        assert!(matches!(
            MendeleyClient::from_config(&config),
            Err(LookupError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn offline_lookup_is_permanent_failure() {
        let err = OfflineReferences.lookup("Anything").await.unwrap_err();
        assert!(matches!(err, LookupError::NotConfigured));
        assert!(!dossier_core::Retryable::is_transient(&err));
    }
}
