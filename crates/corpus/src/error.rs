use std::path::PathBuf;

/// Failures that stop corpus loading outright. Everything below the paper
/// level degrades into diagnostics instead.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("Corpus root not found: {0}")]
    RootMissing(PathBuf),

    #[error("Corpus root is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No paper folders found under {0}")]
    NoPapers(PathBuf),
}
