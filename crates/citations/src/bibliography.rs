//! The finished bibliography: entries in first-seen order with stable keys.

use std::collections::{HashMap, HashSet};

use dossier_core::{CitationEntry, CitationStatus, ReferenceRecord};
use serde::Serialize;

use crate::normalize::{key_fragment, normalize_title, significant_word};

/// Every citation of one run, ordered by first appearance in the
/// category→paper traversal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bibliography {
    entries: Vec<CitationEntry>,
    #[serde(skip)]
    by_title: HashMap<String, usize>,
}

impl Bibliography {
    /// Build from `(normalized title, title, status)` triples already in
    /// first-seen order. Assigns sequence numbers and keys.
    pub fn from_ordered(items: Vec<(String, String, CitationStatus)>) -> Self {
        let mut taken: HashSet<String> = HashSet::new();
        let mut entries = Vec::with_capacity(items.len());
        let mut by_title = HashMap::new();

        for (i, (normalized_title, title, status)) in items.into_iter().enumerate() {
            let base = base_key(&title, &status);
            let key = disambiguate(&base, &mut taken);
            by_title.insert(normalized_title.clone(), i);
            entries.push(CitationEntry {
                normalized_title,
                title,
                key,
                sequence: i + 1,
                status,
            });
        }

        Self { entries, by_title }
    }

    pub fn entries(&self) -> &[CitationEntry] {
        &self.entries
    }

    /// Entry for a title in any spelling that normalizes the same way.
    pub fn get(&self, title: &str) -> Option<&CitationEntry> {
        self.by_title
            .get(&normalize_title(title))
            .and_then(|i| self.entries.get(*i))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_resolved()).count()
    }
}

/// `<first author family name><year>`, or a title word plus `nd` when the
/// record has no author or the lookup failed.
fn base_key(title: &str, status: &CitationStatus) -> String {
    match status {
        CitationStatus::Resolved { record } => resolved_key(title, record),
        CitationStatus::Unresolved { .. } => format!("{}nd", significant_word(title)),
    }
}

fn resolved_key(title: &str, record: &ReferenceRecord) -> String {
    let name = record
        .authors
        .first()
        .map(|a| key_fragment(&a.family))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| significant_word(title));
    match record.year {
        Some(year) => format!("{name}{year}"),
        None => format!("{name}nd"),
    }
}

/// First holder keeps the bare key; later ones get `b`, `c`, ...
fn disambiguate(base: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1usize;
    loop {
        let key = format!("{base}{}", suffix(n));
        if taken.insert(key.clone()) {
            return key;
        }
        n += 1;
    }
}

/// 1 → `b`, 25 → `z`, 26 → `ba`, ...
fn suffix(n: usize) -> String {
    let mut n = n;
    let mut out = Vec::new();
    loop {
        out.push((b'a' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
    }
    out.iter().rev().collect()
}
