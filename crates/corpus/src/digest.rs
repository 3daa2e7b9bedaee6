//! Aggregated corpus text sent to the generation service.

use dossier_core::{Corpus, DemandRole};

/// The digest text plus whether it was cut short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusDigest {
    pub text: String,
    /// Character count before truncation.
    pub full_chars: usize,
    pub truncated: bool,
}

/// Concatenate every paper's fragments, then truncate to `char_limit`
/// characters on a char boundary.
///
/// Each paper opens with `--- PAPER: <title> ---`, followed by one
/// `Demand <n>:` block per role. Absent slots read `*Missing demand <n>*`.
pub fn corpus_digest(corpus: &Corpus, char_limit: usize) -> CorpusDigest {
    let mut text = String::new();
    for paper in corpus.papers() {
        text.push_str(&format!("\n\n--- PAPER: {} ---\n", paper.title));
        for role in DemandRole::ALL {
            let n = role.number();
            match paper.demand(role) {
                Some(demand) => text.push_str(&format!("\nDemand {n}:\n{}\n", demand.body())),
                None => text.push_str(&format!("\nDemand {n}:\n*Missing demand {n}*\n")),
            }
        }
    }

    let full_chars = text.chars().count();
    if full_chars <= char_limit {
        return CorpusDigest {
            text,
            full_chars,
            truncated: false,
        };
    }

    let cut = text
        .char_indices()
        .nth(char_limit)
        .map_or(text.len(), |(i, _)| i);
    text.truncate(cut);
    CorpusDigest {
        text,
        full_chars,
        truncated: true,
    }
}
