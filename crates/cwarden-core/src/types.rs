//! Domain types shared across all Craft Warden crates

use serde::{Deserialize, Serialize};

/// Theme applied when the backend has no stored value yet
pub const DEFAULT_THEME: &str = "dark";

// ─────────────────────────────────────────────────────────
// Instances
// ─────────────────────────────────────────────────────────

/// One row of the instance summary list
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceSummary {
    pub id: String,
    pub name: String,
    pub software: String,
    pub version: String,
    pub running: bool,
    #[serde(default)]
    pub tunnel_enabled: bool,
}

/// Result of an instance info call
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct InstanceStatus {
    pub running: bool,
    #[serde(default)]
    pub tunnel_enabled: bool,
}

/// One metrics reading as the backend reports it.
///
/// `time` is a preformatted clock label; `cpu_usage` is a percentage and
/// `memory_usage` a byte count. Rounding and unit conversion happen when the
/// reading becomes a window sample, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsPoint {
    pub time: String,
    pub cpu_usage: f32,
    pub memory_usage: u64,
}

/// Metadata for one public tunnel endpoint.
///
/// Every field is optional: the tunnel agent reports whatever it knows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TunnelEndpoint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub public_port: Option<u16>,
    #[serde(default)]
    pub destination_port: Option<u16>,
    #[serde(default)]
    pub status: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Server Software
// ─────────────────────────────────────────────────────────

/// Server software family an instance runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftwareKind {
    Vanilla,
    PaperMc,
    Purpur,
    Fabric,
    Forge,
    NeoForge,
    Custom,
}

impl SoftwareKind {
    /// All kinds in wizard display order
    pub const ALL: [SoftwareKind; 7] = [
        SoftwareKind::Vanilla,
        SoftwareKind::PaperMc,
        SoftwareKind::Purpur,
        SoftwareKind::Fabric,
        SoftwareKind::Forge,
        SoftwareKind::NeoForge,
        SoftwareKind::Custom,
    ];

    /// Wire name used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            SoftwareKind::Vanilla => "vanilla",
            SoftwareKind::PaperMc => "papermc",
            SoftwareKind::Purpur => "purpur",
            SoftwareKind::Fabric => "fabric",
            SoftwareKind::Forge => "forge",
            SoftwareKind::NeoForge => "neoforge",
            SoftwareKind::Custom => "custom",
        }
    }

    /// Parse a wire name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == s)
    }

    /// Whether this software pairs a game version with a loader/build version
    pub fn uses_loader(&self) -> bool {
        matches!(
            self,
            SoftwareKind::Fabric | SoftwareKind::Forge | SoftwareKind::NeoForge
        )
    }

    /// Whether instances of this kind are built from a user-supplied jar
    pub fn is_manual(&self) -> bool {
        matches!(self, SoftwareKind::Custom)
    }
}

impl std::fmt::Display for SoftwareKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ─────────────────────────────────────────────────────────
// Notices
// ─────────────────────────────────────────────────────────

/// Timestamped note shown inline in a console panel.
///
/// Used for transient failures that should be visible without interrupting
/// the view (a failed poll, a rejected command).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub at: chrono::DateTime<chrono::Local>,
    pub text: String,
}

impl Notice {
    /// Create a notice stamped with the current local time.
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            at: chrono::Local::now(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.at.format("%H:%M:%S"), self.text)
    }
}

// ─────────────────────────────────────────────────────────
// Global Config
// ─────────────────────────────────────────────────────────

/// Backend-persisted global configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_software_kind_wire_names_round_trip() {
        for kind in SoftwareKind::ALL {
            assert_eq!(SoftwareKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(SoftwareKind::parse("bukkit"), None);
    }

    #[test]
    fn test_software_kind_serde_uses_wire_names() {
        let json = serde_json::to_string(&SoftwareKind::NeoForge).unwrap();
        assert_eq!(json, "\"neoforge\"");

        let kind: SoftwareKind = serde_json::from_str("\"papermc\"").unwrap();
        assert_eq!(kind, SoftwareKind::PaperMc);
    }

    #[test]
    fn test_software_kind_loader_usage() {
        assert!(SoftwareKind::Fabric.uses_loader());
        assert!(SoftwareKind::Forge.uses_loader());
        assert!(SoftwareKind::NeoForge.uses_loader());
        assert!(!SoftwareKind::Vanilla.uses_loader());
        assert!(!SoftwareKind::PaperMc.uses_loader());
        assert!(!SoftwareKind::Custom.uses_loader());
    }

    #[test]
    fn test_instance_summary_tunnel_flag_defaults_false() {
        let json = r#"{
            "id": "abc123",
            "name": "lobby",
            "software": "papermc",
            "version": "1.20.4",
            "running": true
        }"#;
        let summary: InstanceSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.name, "lobby");
        assert!(summary.running);
        assert!(!summary.tunnel_enabled);
    }

    #[test]
    fn test_metrics_point_parses_wire_shape() {
        let json = r#"{"time": "14:02:33", "cpu_usage": 12.345, "memory_usage": 2147483648}"#;
        let point: MetricsPoint = serde_json::from_str(json).unwrap();
        assert_eq!(point.time, "14:02:33");
        assert!((point.cpu_usage - 12.345).abs() < 0.001);
        assert_eq!(point.memory_usage, 2_147_483_648);
    }

    #[test]
    fn test_tunnel_endpoint_all_fields_optional() {
        let endpoint: TunnelEndpoint = serde_json::from_str("{}").unwrap();
        assert!(endpoint.id.is_none());
        assert!(endpoint.public_port.is_none());

        let json = r#"{"name": "lobby-tcp", "protocol": "tcp", "host": "fir.gl.ply.gg", "public_port": 25565}"#;
        let endpoint: TunnelEndpoint = serde_json::from_str(json).unwrap();
        assert_eq!(endpoint.name.as_deref(), Some("lobby-tcp"));
        assert_eq!(endpoint.public_port, Some(25565));
        assert!(endpoint.status.is_none());
    }

    #[test]
    fn test_global_config_defaults_to_dark() {
        let config: GlobalConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.theme, DEFAULT_THEME);
        assert_eq!(GlobalConfig::default().theme, "dark");
    }

    #[test]
    fn test_notice_renders_clock_and_text() {
        let notice = Notice::now("metrics poll failed");
        let rendered = notice.to_string();
        assert!(rendered.ends_with("metrics poll failed"));
        assert!(rendered.starts_with('['));
    }
}
