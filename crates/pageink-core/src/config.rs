//! Engine configuration.
//!
//! Every field has a default, so a partial JSON file only overrides what it names.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default dwell time before a two-step tool confirms its first segment.
pub const DEFAULT_DWELL_MS: u64 = 500;
/// Default movement (raster units) that still counts as "stationary".
pub const DEFAULT_MOTION_THRESHOLD: f64 = 5.0;
/// Default maximum distance between consecutive accepted points.
pub const DEFAULT_MAX_POINT_JUMP: f64 = 200.0;
/// Default autosave interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 5;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunable constants of the annotation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stationary time that confirms the first segment of angle/arc tools.
    pub dwell_ms: u64,
    /// Movement below this distance does not reset the dwell timer.
    pub motion_threshold: f64,
    /// Points further than this from the previous accepted point are dropped.
    pub max_point_jump: f64,
    /// Eraser hit radius = tool size * this.
    pub eraser_brush_multiplier: f64,
    /// On-screen eraser cursor radius = tool size * this.
    pub eraser_cursor_multiplier: f64,
    /// Period of the autosave timer.
    pub autosave_interval_secs: u64,
    /// Timeout for HTTP load/save requests.
    pub http_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dwell_ms: DEFAULT_DWELL_MS,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            max_point_jump: DEFAULT_MAX_POINT_JUMP,
            eraser_brush_multiplier: 5.0,
            eraser_cursor_multiplier: 3.0,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            http_timeout_secs: 10,
        }
    }
}

impl EngineConfig {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
