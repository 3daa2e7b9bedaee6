pub mod build;
pub mod doctor;
pub mod formula;
pub mod inspect;
pub mod onboard;

use std::path::{Path, PathBuf};

use dossier_config::{AppConfig, ConfigError};
use tokio_util::sync::CancellationToken;

/// The config file in use: `--config` if given, else the default location.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_env(&config_path(explicit))
}

/// A token that is cancelled on the first Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling run");
            trigger.cancel();
        }
    });
    cancel
}
