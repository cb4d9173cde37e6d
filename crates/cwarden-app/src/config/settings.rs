//! Settings parser for the user-level config.toml

use super::types::Settings;
use cwarden_core::prelude::*;
use std::path::PathBuf;

const CONFIG_FILENAME: &str = "config.toml";
const CWARDEN_DIR: &str = "cwarden";

/// Path of the user-level config file, if a config directory exists.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CWARDEN_DIR).join(CONFIG_FILENAME))
}

/// Load settings from the user-level config.toml
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings() -> Settings {
    match config_file_path() {
        Some(path) => load_settings_from(&path),
        None => {
            debug!("No config directory on this platform, using defaults");
            Settings::default()
        }
    }
}

fn load_settings_from(path: &std::path::Path) -> Settings {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::WindowMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_settings_missing_file_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("config.toml"));
        assert_eq!(settings.backend.address, "127.0.0.1:46600");
    }

    #[test]
    fn test_load_settings_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [polling]
            metrics_interval_ms = 250

            [metrics]
            window = "count"
            max_samples = 90
            "#,
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.polling.metrics_interval_ms, 250);
        assert_eq!(settings.metrics.window, WindowMode::Count);
        assert_eq!(settings.metrics.max_samples, 90);
    }

    #[test]
    fn test_load_settings_invalid_toml_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not [valid toml").unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.backend.address, "127.0.0.1:46600");
    }
}
