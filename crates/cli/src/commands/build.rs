//! `dossier build`: Compile the corpus into a document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dossier_config::AppConfig;
use dossier_core::{Provider, ReferenceService};
use dossier_document::serializer_for;
use dossier_pipeline::{Pipeline, PipelineSettings};
use dossier_providers::{MendeleyClient, OfflineReferences, OpenAiCompatProvider};
use tracing::{info, warn};

use super::{cancel_on_ctrl_c, load_config};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub corpus: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<String>,
    pub workers: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(corpus) = &self.corpus {
            config.pipeline.corpus_root = corpus.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(format) = &self.format {
            config.output.format = format.to_ascii_lowercase();
        }
        if let Some(workers) = self.workers {
            config.pipeline.max_workers = workers;
        }
    }
}

pub async fn run(
    config_path: Option<&Path>,
    overrides: Overrides,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);
    config.validate()?;

    let serializer = serializer_for(&config.output.format)?;
    let output_path = if overrides.output.is_some() {
        config.output.path.clone()
    } else {
        config.output.path.with_extension(serializer.extension())
    };

    let provider: Arc<dyn Provider> =
        Arc::new(OpenAiCompatProvider::from_config(&config.generation)?);
    let references = reference_service(&config);

    let pipeline = Pipeline::new(
        PipelineSettings::from_config(&config),
        provider,
        references,
        cancel_on_ctrl_c(),
    );

    println!("📚 Compiling {}", config.pipeline.corpus_root.display());
    let outcome = match pipeline.run().await {
        Ok(outcome) => outcome,
        Err(failure) => {
            eprintln!("❌ Run failed ({}): {failure}", failure.kind());
            return Err(failure.into());
        }
    };

    let text = serializer.serialize(&outcome.document)?;
    std::fs::write(&output_path, &text)?;
    info!(
        path = %output_path.display(),
        format = serializer.format(),
        bytes = text.len(),
        "Document written"
    );

    println!("✅ Wrote {}", output_path.display());
    println!();
    println!("{}", outcome.report);
    if !outcome.diagnostics.is_empty() {
        println!();
        println!("⚠️  {} diagnostic(s):", outcome.diagnostics.len());
        for diagnostic in outcome.diagnostics.iter() {
            println!("   {diagnostic}");
        }
    }

    Ok(())
}

/// Mendeley when enabled and configured; otherwise every citation stays
/// unresolved without network traffic.
fn reference_service(config: &AppConfig) -> Arc<dyn ReferenceService> {
    if !config.references.enabled {
        info!("Reference lookups disabled; citations will be unresolved");
        return Arc::new(OfflineReferences);
    }
    match MendeleyClient::from_config(&config.references) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "Reference service unavailable; citations will be unresolved");
            Arc::new(OfflineReferences)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence() {
        let mut config = AppConfig::default();
        Overrides {
            corpus: Some(PathBuf::from("/data/papers")),
            output: None,
            format: Some("HTML".into()),
            workers: Some(2),
        }
        .apply(&mut config);

        assert_eq!(config.pipeline.corpus_root, PathBuf::from("/data/papers"));
        assert_eq!(config.output.format, "html");
        assert_eq!(config.pipeline.max_workers, 2);
        assert_eq!(config.output.path, PathBuf::from("analysis_report.md"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn disabled_references_are_offline() {
        let mut config = AppConfig::default();
        config.references.enabled = false;
        config.references.token = Some("token".into());
        assert_eq!(reference_service(&config).name(), "offline");
    }

    #[test]
    fn missing_token_falls_back_to_offline() {
        let config = AppConfig::default();
        assert_eq!(reference_service(&config).name(), "offline");
    }
}
