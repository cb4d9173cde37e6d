//! Configuration file parsing for Craft Warden
//!
//! Settings live in the platform config directory, e.g.
//! `~/.config/cwarden/config.toml` on Linux. Every section and key is
//! optional; missing or unparseable files fall back to defaults.

pub mod settings;
pub mod types;

pub use settings::{config_file_path, load_settings};
pub use types::*;
