//! Corpus loading for Dossier.
//!
//! Layout on disk is `root/{category}/{paper folder}/{fragment files}`.
//! Discovery is synchronous and cheap; loading one paper reads its fragment
//! files and is what the pipeline fans out across workers.

pub mod digest;
pub mod error;
pub mod fragment;
pub mod loader;

pub use digest::{CorpusDigest, corpus_digest};
pub use error::CorpusError;
pub use fragment::{Fragment, parse_fragment};
pub use loader::{Discovery, LoadedPaper, PaperSource, assemble, discover, load_paper};
