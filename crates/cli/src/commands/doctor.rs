//! `dossier doctor`: Diagnose configuration and corpus.

use std::path::Path;

use dossier_config::AppConfig;
use dossier_core::{Category, Provider};
use dossier_providers::OpenAiCompatProvider;

use super::config_path;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Dossier Doctor — System Diagnostics");
    println!("======================================\n");

    let mut issues = 0;
    let path = config_path(explicit);

    let config = if path.exists() {
        match AppConfig::load_with_env(&path) {
            Ok(config) => {
                println!("  ✅ Config file valid: {}", path.display());
                Some(config)
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                None
            }
        }
    } else {
        println!("  ⚠️  No config file — defaults in use (run `dossier onboard`)");
        let mut config = AppConfig::default();
        config.apply_env(|name| std::env::var(name).ok());
        Some(config)
    };

    if let Some(config) = config {
        issues += check_services(&config).await;
        issues += check_corpus(&config.pipeline.corpus_root);
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

async fn check_services(config: &AppConfig) -> usize {
    let mut issues = 0;
    if config.has_api_key() {
        println!("  ✅ Generation API key configured ({})", config.generation.model);
        match OpenAiCompatProvider::from_config(&config.generation) {
            Ok(provider) => match provider.health_check().await {
                Ok(true) => println!(
                    "  ✅ Generation service reachable: {}",
                    config.generation.api_url
                ),
                Ok(false) => {
                    println!("  ❌ Generation service rejected the health check");
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Generation service unreachable: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  ❌ Generation client could not be built: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  ❌ No generation API key — set DEEPSEEK_API_KEY or generation.api_key");
        issues += 1;
    }

    if !config.references.enabled {
        println!("  ⚠️  Reference lookups disabled — citations will be unresolved");
    } else if config.references.token.is_some() {
        println!("  ✅ Reference token configured");
    } else {
        println!("  ⚠️  No MENDELEY_TOKEN — citations will be unresolved");
    }
    issues
}

fn check_corpus(root: &Path) -> usize {
    if !root.is_dir() {
        println!("  ❌ Corpus root not found: {}", root.display());
        return 1;
    }
    println!("  ✅ Corpus root: {}", root.display());

    let mut found = 0;
    for category in Category::ALL {
        if root.join(category.folder_name()).is_dir() {
            found += 1;
        } else {
            println!("  ⚠️  Missing category folder: {}", category.folder_name());
        }
    }
    if found == 0 {
        println!("  ❌ No category folders under the corpus root");
        return 1;
    }
    0
}
