//! `dossier onboard`: First-time setup.

use std::path::Path;

use dossier_config::AppConfig;

use super::config_path;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path(explicit);

    println!("📚 Dossier — First-Time Setup");
    println!("=============================\n");

    if let Some(dir) = config_path.parent()
        && !dir.as_os_str().is_empty()
    {
        if dir.exists() {
            println!("  Config directory exists: {}", dir.display());
        } else {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set DEEPSEEK_API_KEY (or generation.api_key in the file)");
    println!("   2. Optionally set MENDELEY_TOKEN for citation metadata");
    println!("   3. Point pipeline.corpus_root at your corpus");
    println!("   4. Run: dossier build\n");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_loadable_default_config_once() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        run(Some(&path)).await.unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.pipeline.max_workers, 5);

        std::fs::write(&path, "[pipeline]\nmax_workers = 3\n").unwrap();
        run(Some(&path)).await.unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.pipeline.max_workers, 3);
    }
}
