//! `dossier inspect`: Offline load and parse, no generation or lookups.

use std::path::{Path, PathBuf};

use dossier_core::DiagnosticKind;
use dossier_pipeline::{PipelineSettings, inspect};

use super::{cancel_on_ctrl_c, load_config};

pub async fn run(
    config_path: Option<&Path>,
    corpus: Option<PathBuf>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(corpus) = corpus {
        config.pipeline.corpus_root = corpus;
    }

    let settings = PipelineSettings::from_config(&config);
    let inspection = match inspect(&settings, &cancel_on_ctrl_c()).await {
        Ok(inspection) => inspection,
        Err(failure) => {
            eprintln!("❌ Inspection failed ({}): {failure}", failure.kind());
            return Err(failure.into());
        }
    };

    if json {
        for diagnostic in inspection.diagnostics.iter() {
            println!("{}", serde_json::to_string(diagnostic)?);
        }
        return Ok(());
    }

    println!("🔎 Corpus: {}", settings.corpus_root.display());
    println!("================================\n");
    for group in inspection.corpus.categories() {
        println!("  {} ({} papers)", group.category.label(), group.papers.len());
        for paper in &group.papers {
            let mark = if paper.is_complete() { "✅" } else { "⚠️ " };
            println!("    {mark} {} [{}]", paper.title, paper.folder);
        }
    }

    let tally = inspection.tally;
    println!();
    println!(
        "  Papers:      {} ({} complete, {} absent slots)",
        tally.papers, tally.complete_papers, tally.absent_slots
    );
    println!(
        "  Equations:   {} ({} kept verbatim)",
        tally.equations, tally.degraded_equations
    );
    println!("  Listings:    {}", tally.code_blocks);
    println!(
        "  Diagnostics: {} missing input, {} parse degraded",
        inspection.diagnostics.count(DiagnosticKind::MissingInput),
        inspection.diagnostics.count(DiagnosticKind::ParseDegraded)
    );

    if !inspection.diagnostics.is_empty() {
        println!();
        for diagnostic in inspection.diagnostics.iter() {
            println!("   {diagnostic}");
        }
    }

    Ok(())
}
