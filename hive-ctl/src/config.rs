//! Configuration for the demo controller.
//!
//! Loaded once at startup from `hive-ctl.toml` when present, then
//! frozen; everything downstream receives resolved values.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Name of the optional configuration file looked up beside the binary.
pub const CONFIG_FILE: &str = "hive-ctl.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CtlConfig {
    /// Drone endpoint settings.
    pub drone: DroneConfig,
    /// Demo traffic settings.
    pub traffic: TrafficConfig,
    /// Capture persistence settings.
    pub capture: CaptureConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Drone endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneConfig {
    /// Hostname or IP of the drone.
    pub host: String,
    /// Control port the drone listens on.
    pub port: u16,
}

/// Demo traffic parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    /// Stream id registered on the tx port.
    pub stream_id: u32,
    /// Packets sent per transmit run.
    pub packet_count: u32,
    /// Seconds to let transmit run before stopping it.
    pub transmit_secs: u64,
}

/// Capture persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Where the rx capture buffer is written.
    pub path: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for CtlConfig {
    fn default() -> Self {
        Self {
            drone: DroneConfig::default(),
            traffic: TrafficConfig::default(),
            capture: CaptureConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 7878,
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            stream_id: 1,
            packet_count: 5,
            transmit_secs: 7,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            path: "capture.pcap".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl CtlConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let cfg = CtlConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        assert!(text.contains("host"));
        assert!(text.contains("packet_count"));
    }

    #[test]
    fn roundtrip_config() {
        let cfg = CtlConfig::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CtlConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.drone.port, 7878);
        assert_eq!(parsed.traffic.packet_count, 5);
        assert_eq!(parsed.traffic.transmit_secs, 7);
        assert_eq!(parsed.capture.path, "capture.pcap");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let parsed: CtlConfig = toml::from_str("[drone]\nhost = \"10.0.0.9\"\n").unwrap();
        assert_eq!(parsed.drone.host, "10.0.0.9");
        assert_eq!(parsed.drone.port, 7878);
        assert_eq!(parsed.traffic.stream_id, 1);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = CtlConfig::load(Path::new("/definitely/not/here.toml"));
        assert_eq!(cfg.drone.host, "127.0.0.1");
    }
}
