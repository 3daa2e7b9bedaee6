//! External service clients for Dossier.
//!
//! The generation provider implements `dossier_core::Provider`; the
//! reference clients implement `dossier_core::ReferenceService`.

mod http;
pub mod mendeley;
pub mod openai_compat;

pub use mendeley::{MendeleyClient, OfflineReferences};
pub use openai_compat::OpenAiCompatProvider;
