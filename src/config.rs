//! TOML configuration loading.
//!
//! Provides two loading methods:
//! - `default_config()` - Loads the defaults compiled into the binary
//! - `load_config(path)` - Loads a config file, falling back to defaults for
//!   any value it omits

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::user::UserContext;

/// Defaults embedded in the binary at compile time.
const DEFAULT_CONFIG: &str = include_str!("../config/skintrack.toml");

/// Directory name used under the platform data dir.
const APP_DIR_NAME: &str = "skintrack";

/// Which analysis backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Remote when an API key resolves, simulated otherwise.
    #[default]
    Auto,
    Simulated,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub backend: BackendKind,
    pub simulated_delay_ms: u64,
    pub simulate_errors: bool,
    pub model: String,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    /// 0 disables the orchestrator timeout.
    pub scan_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            simulated_delay_ms: 2000,
            simulate_errors: false,
            model: crate::analyzer::remote::DEFAULT_MODEL.to_string(),
            endpoint: crate::analyzer::remote::DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 60,
            scan_timeout_secs: 0,
        }
    }
}

impl AnalysisConfig {
    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn scan_timeout(&self) -> Option<Duration> {
        (self.scan_timeout_secs > 0).then(|| Duration::from_secs(self.scan_timeout_secs))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinTrackConfig {
    pub data_dir: Option<PathBuf>,
    pub analysis: AnalysisConfig,
    pub user: UserContext,
}

impl SkinTrackConfig {
    /// Configured data dir, else `<platform data dir>/skintrack`.
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
    }
}

/// Load configuration from a TOML file at the given path.
///
/// # Example
/// ```ignore
/// let config = load_config(Path::new("/etc/skintrack.toml"))?;
/// ```
pub fn load_config(path: &Path) -> Result<SkinTrackConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    parse_config(&content).with_context(|| format!("Invalid config file {:?}", path))
}

pub fn parse_config(content: &str) -> Result<SkinTrackConfig> {
    Ok(toml::from_str(content)?)
}

/// Get the default configuration embedded in the binary.
///
/// # Panics
/// Panics if the embedded TOML is invalid (this would be a compile-time bug).
pub fn default_config() -> SkinTrackConfig {
    toml::from_str(DEFAULT_CONFIG).expect("embedded skintrack.toml must be valid TOML")
}
