use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::monitor::classifier::ThresholdProfile;

/// Runtime configuration, loaded from a JSON file. Every field has a default
/// so a missing file or a partial file still yields a working daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Angle thresholds for the monitored exercise.
    pub profile: ThresholdProfile,

    /// Landmarks below this visibility are treated as absent.
    pub min_visibility: f64,

    /// How long a verdict must stay unchanged before feedback fires.
    pub stabilization_window_ms: u64,

    /// Minimum spacing between remote error notifications.
    pub notify_min_interval_ms: u64,

    /// Endpoint for fire-and-forget error notifications. Defaults to this
    /// daemon's own /errors route, which is how posture errors reach the
    /// active session's error counter. `None` disables remote dispatch.
    pub notify_url: Option<String>,

    pub notify_timeout_ms: u64,

    /// Delay between badge reader polls when no token is present.
    pub badge_poll_interval_ms: u64,

    /// Line-oriented badge token feed (usually a FIFO fed by the reader
    /// daemon). `None` disables the listener; sessions are then controlled
    /// through the HTTP API only.
    pub badge_input: Option<PathBuf>,

    /// Bind address for the session HTTP API.
    pub listen_addr: String,

    pub db_path: PathBuf,

    /// Pre-rendered alert clip. When absent a synthesized tone is used.
    pub alert_clip: Option<PathBuf>,

    /// JSONL pose frame source. `None` reads frames from stdin.
    pub pose_input: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: ThresholdProfile::squat(),
            min_visibility: 0.5,
            stabilization_window_ms: 2_000,
            notify_min_interval_ms: 2_000,
            notify_url: Some("http://127.0.0.1:5000/errors".to_string()),
            notify_timeout_ms: 1_000,
            badge_poll_interval_ms: 1_000,
            badge_input: None,
            listen_addr: "0.0.0.0:5000".to_string(),
            db_path: PathBuf::from("squatguard.sqlite3"),
            alert_clip: None,
            pose_input: None,
        }
    }
}

impl AppConfig {
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write config to {}", path.display()))
    }

    pub fn stabilization_window(&self) -> Duration {
        Duration::from_millis(self.stabilization_window_ms)
    }

    pub fn notify_min_interval(&self) -> Duration {
        Duration::from_millis(self.notify_min_interval_ms)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    pub fn badge_poll_interval(&self) -> Duration {
        Duration::from_millis(self.badge_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/squatguard.json")).unwrap();
        assert_eq!(config.stabilization_window_ms, 2_000);
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let config: AppConfig =
            serde_json::from_str(r#"{"listenAddr": "127.0.0.1:8080"}"#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.notify_min_interval_ms, 2_000);
        assert_eq!(
            config.notify_url.as_deref(),
            Some("http://127.0.0.1:5000/errors")
        );
    }
}
