//! Configuration module for press-review
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from an explicit path, the environment, or the default
/// locations, falling back to defaults. Environment overrides always apply.
pub fn load(explicit: Option<PathBuf>) -> Result<Settings> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Settings file not found: {}", path.display());
        }
        candidates.push(path);
    }
    if let Ok(path) = std::env::var("PRESS_REVIEW_SETTINGS_PATH") {
        candidates.push(PathBuf::from(path));
    }
    candidates.extend([
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/press-review/settings.yml"),
    ]);
    if let Some(dir) = dirs::config_dir() {
        candidates.push(dir.join("press-review/settings.yml"));
    }

    let mut settings = match candidates.iter().find(|p| p.exists()) {
        Some(path) => {
            info!("Loading settings from: {}", path.display());
            Settings::from_file(path)?
        }
        None => {
            info!("No settings file found, using defaults");
            Settings::default()
        }
    };
    settings.merge_env();
    Ok(settings)
}
