//! Saving and loading the tuner configuration.
//!
//! The configuration is stored as pretty-printed JSON next to the executable's
//! working directory. A missing or unreadable file falls back to the defaults.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;
use tuner_core::TunerConfig;

/// Saves the configuration to a JSON file.
pub fn save_settings(config: &TunerConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json_string =
        serde_json::to_string_pretty(config).context("serializing tuner settings")?;
    fs::write(path, json_string)
        .with_context(|| format!("writing settings to {}", path.display()))?;
    Ok(())
}

/// Loads and validates a configuration from a JSON file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<TunerConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading settings from {}", path.display()))?;
    let config: TunerConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing settings in {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration, or the defaults when there is nothing usable on disk.
pub fn load_or_default(path: impl AsRef<Path>) -> TunerConfig {
    let path = path.as_ref();
    if !path.exists() {
        return TunerConfig::default();
    }
    load_settings(path).unwrap_or_else(|e| {
        warn!("Ignoring tuner settings: {:#}", e);
        TunerConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuner_core::ReferencePitch;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tuner-gui-{}-{}", std::process::id(), name))
    }

    #[test]
    fn settings_survive_a_save_and_load() {
        let path = scratch_path("roundtrip.json");
        let config = TunerConfig::default().with_reference(ReferencePitch::A442);
        save_settings(&config, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), config);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = scratch_path("partial.json");
        fs::write(&path, r#"{ "reference": "432" }"#).unwrap();
        let config = load_settings(&path).unwrap();
        assert_eq!(config.reference, ReferencePitch::A432);
        assert_eq!(config.window_size, 2048);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let path = scratch_path("invalid.json");
        fs::write(&path, r#"{ "window_size": 0 }"#).unwrap();
        assert!(load_settings(&path).is_err());
        assert_eq!(load_or_default(&path), TunerConfig::default());
        let _ = fs::remove_file(&path);
    }
}
