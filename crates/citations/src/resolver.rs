//! Single-flight citation resolution.
//!
//! One table per run maps each normalized title to a shared cell. The first
//! caller for a title performs the lookup (with retry) using the normalized
//! title; concurrent callers for the same title await that same cell. Completion order does not
//! matter: the bibliography is ordered by the earliest traversal position
//! that asked for each title.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dossier_core::{
    CitationStatus, LookupError, Position, ReferenceRecord, ReferenceService, RetryPolicy,
    with_retry,
};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bibliography::Bibliography;
use crate::normalize::normalize_title;

/// Terminal result of one lookup. Cloned out to every waiter.
type Outcome = Result<ReferenceRecord, String>;

struct Flight {
    first_seen: Position,
    title: String,
    cell: Arc<OnceCell<Outcome>>,
}

/// What a caller learns about its title.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub normalized_title: String,
    /// Why the lookup failed, if it did.
    pub failure: Option<String>,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct CitationResolver {
    service: Arc<dyn ReferenceService>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    table: Mutex<HashMap<String, Flight>>,
}

impl CitationResolver {
    pub fn new(
        service: Arc<dyn ReferenceService>,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            policy,
            cancel,
            table: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `title` on behalf of the paper at `position`.
    ///
    /// Never fails: lookup errors come back as [`Resolution::failure`] and
    /// end up as unresolved bibliography entries.
    pub async fn resolve(&self, title: &str, position: Position) -> Resolution {
        let normalized = normalize_title(title);
        let cell = self.register(&normalized, title, position);

        let outcome = cell
            .get_or_init(|| self.lookup(normalized.clone()))
            .await
            .clone();

        Resolution {
            normalized_title: normalized,
            failure: outcome.err(),
        }
    }

    /// Record the caller in the table and hand back the shared cell.
    fn register(&self, normalized: &str, title: &str, position: Position) -> Arc<OnceCell<Outcome>> {
        let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
        match table.get_mut(normalized) {
            Some(flight) => {
                if position < flight.first_seen {
                    flight.first_seen = position;
                    flight.title = title.to_string();
                }
                debug!(title = %title, "Joining existing citation lookup");
                flight.cell.clone()
            }
            None => {
                let cell = Arc::new(OnceCell::new());
                table.insert(
                    normalized.to_string(),
                    Flight {
                        first_seen: position,
                        title: title.to_string(),
                        cell: cell.clone(),
                    },
                );
                cell
            }
        }
    }

    async fn lookup(&self, title: String) -> Outcome {
        let label = format!("lookup '{title}'");
        let result = with_retry(&self.policy, &self.cancel, &label, |_| {
            let service = self.service.clone();
            let title = title.clone();
            async move { service.lookup(&title).await }
        })
        .await;

        match result {
            Ok(record) => {
                info!(title = %title, service = self.service.name(), "Citation resolved");
                Ok(record)
            }
            Err(failure) => {
                let reason = match &failure.error {
                    LookupError::NotFound(_) => "not found".to_string(),
                    other => other.to_string(),
                };
                warn!(
                    title = %title,
                    attempts = failure.attempts,
                    reason = %reason,
                    "Citation left unresolved"
                );
                Err(reason)
            }
        }
    }

    /// Drain the table into a bibliography ordered by first-seen position.
    ///
    /// Call once every `resolve` has returned; the resolver is empty
    /// afterwards.
    pub fn finish(&self) -> Bibliography {
        let table = std::mem::take(&mut *self.table.lock().unwrap_or_else(|e| e.into_inner()));
        let mut flights: Vec<(String, Flight)> = table.into_iter().collect();
        flights.sort_by_key(|(_, f)| f.first_seen);

        let items = flights
            .into_iter()
            .map(|(normalized, flight)| {
                let status = match flight.cell.get() {
                    Some(Ok(record)) => CitationStatus::Resolved {
                        record: record.clone(),
                    },
                    Some(Err(reason)) => CitationStatus::Unresolved {
                        reason: reason.clone(),
                    },
                    None => CitationStatus::Unresolved {
                        reason: "lookup never completed".into(),
                    },
                };
                (normalized, flight.title, status)
            })
            .collect();

        let bibliography = Bibliography::from_ordered(items);
        info!(
            entries = bibliography.len(),
            unresolved = bibliography.unresolved_count(),
            "Bibliography assembled"
        );
        bibliography
    }
}
