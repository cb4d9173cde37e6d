//! Configuration types for Craft Warden
//!
//! Defines:
//! - `Settings` - Global application settings
//! - Related sub-types and enums

use cwarden_core::metrics::EvictionPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Global application settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// Backend connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Address of the local backend service
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:46600".to_string()
}

/// Poll cadence settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingSettings {
    /// Metrics poll interval in milliseconds
    #[serde(default = "default_metrics_interval_ms")]
    pub metrics_interval_ms: u64,

    /// Status refresh interval in milliseconds
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            metrics_interval_ms: default_metrics_interval_ms(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

fn default_metrics_interval_ms() -> u64 {
    1000
}

fn default_status_interval_ms() -> u64 {
    5000
}

/// Metrics window settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsSettings {
    /// Which retention rule the sample window uses
    #[serde(default)]
    pub window: WindowMode,

    /// Retention in seconds when `window = "age"`
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Sample cap when `window = "count"`
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            window: WindowMode::default(),
            retention_secs: default_retention_secs(),
            max_samples: default_max_samples(),
        }
    }
}

fn default_retention_secs() -> u64 {
    30
}

fn default_max_samples() -> usize {
    60
}

impl MetricsSettings {
    /// Resolve the configured window mode into a concrete policy.
    ///
    /// Zero values are lifted to the smallest usable window instead of
    /// producing one that discards every sample.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        match self.window {
            WindowMode::Age => {
                EvictionPolicy::MaxAge(Duration::from_secs(self.retention_secs.max(1)))
            }
            WindowMode::Count => EvictionPolicy::MaxCount(self.max_samples.max(1)),
        }
    }
}

/// Sample window retention mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    #[default]
    Age,
    Count,
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowMode::Age => write!(f, "age"),
            WindowMode::Count => write!(f, "count"),
        }
    }
}
