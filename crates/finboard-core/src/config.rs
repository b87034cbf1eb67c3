use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::state::UiTheme;

pub const DEFAULT_TENANT_ID: &str = "tenant-demo-001";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AgentConfig {
    pub tenant_id: String,
    /// Pause between lifecycle phases of a simulated tool call.
    pub phase_delay_ms: u64,
    /// Fixes the mock data generator; random when unset.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            phase_delay_ms: 350,
            seed: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub theme: UiTheme,
    pub show_activity: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: UiTheme::Classic,
            show_activity: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}
