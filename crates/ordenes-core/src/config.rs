use crate::error::Result;
use crate::paths;
use crate::types::PartialState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// TimerConfig
// ---------------------------------------------------------------------------

/// SLA timer settings, read by the timer on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Seconds between periodic ticks.
    #[serde(default = "default_n_seg")]
    pub n_seg: u64,
    /// Active seconds after which an in-progress area is overdue.
    #[serde(default = "default_sla_seg")]
    pub sla_seg: u64,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_n_seg() -> u64 {
    10
}

fn default_sla_seg() -> u64 {
    60
}

fn default_active() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            n_seg: default_n_seg(),
            sla_seg: default_sla_seg(),
            active: default_active(),
        }
    }
}

impl TimerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.n_seg.max(1))
    }

    /// The state the timer forces on areas past the SLA.
    pub fn timeout_state(&self) -> PartialState {
        PartialState::Overdue
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timer: TimerConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            timer: TimerConfig::default(),
        }
    }
}

impl Config {
    /// Load `ordenes.yaml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.timer.n_seg == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "timer.n_seg must be greater than zero".to_string(),
            });
        }
        if self.timer.sla_seg == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "timer.sla_seg must be greater than zero".to_string(),
            });
        }
        if self.timer.sla_seg > 0 && self.timer.sla_seg < self.timer.n_seg {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "timer.sla_seg ({}) is shorter than the tick interval n_seg ({}); \
                     timeouts will be detected late",
                    self.timer.sla_seg, self.timer.n_seg
                ),
            });
        }
        if self.server.port == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "server.port is 0; the OS will pick a free port".to_string(),
            });
        }

        warnings
    }

    pub fn has_errors(&self) -> bool {
        self.validate()
            .iter()
            .any(|w| w.level == WarnLevel::Error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
