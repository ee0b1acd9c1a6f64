// Configuration loading and parsing (scorecast.toml).
//
// A missing file is not an error: the app runs on documented defaults, the
// same way it tolerates a missing section or field. Structurally invalid
// TOML is a startup error. Out-of-range values (zero intervals) fall back
// to their defaults with a logged warning rather than refusing to start.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

/// Top-level configuration, deserialized straight from scorecast.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// StatsAPI identifier of the tracked team.
    pub team_id: u32,
    /// How many days ahead to ask the schedule endpoint for.
    pub lookahead_days: u32,
    pub polling: PollingConfig,
    pub ui: UiConfig,
    pub record: RecordConfig,
    pub colors: ColorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            team_id: 117,
            lookahead_days: 7,
            polling: PollingConfig::default(),
            ui: UiConfig::default(),
            record: RecordConfig::default(),
            colors: ColorsConfig::default(),
        }
    }
}

/// Poll intervals in seconds. Defaults: 15 live, 300 scheduled, 3600 idle,
/// 3600 pre-live window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub live_seconds: u64,
    pub scheduled_seconds: u64,
    pub idle_seconds: u64,
    /// How long before first pitch frequent polling begins.
    pub pre_live_window_seconds: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            live_seconds: 15,
            scheduled_seconds: 300,
            idle_seconds: 3600,
            pre_live_window_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Minimum number of inning columns on the linescore.
    pub max_innings: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig { max_innings: 9 }
    }
}

/// Snapshot recording. Off by default; when enabled, every accepted
/// snapshot is written to the SQLite file at `path`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        RecordConfig {
            enabled: false,
            path: "scorecast.db".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    /// Optional path to a `team,fill,text` CSV of color overrides.
    pub overrides: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        info!(path = %path.display(), "config file not found; using defaults");
        return Ok(Config::default());
    }

    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(normalize(config))
}

/// Resolve the default config path: `scorecast.toml` in the working
/// directory when present, otherwise the user's config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("scorecast.toml");
    if local.exists() {
        return local;
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "scorecast") {
        return dirs.config_dir().join("scorecast.toml");
    }
    local
}

/// Replace out-of-range values with their defaults, warning about each.
/// Invalid intervals must degrade to the documented defaults, not abort.
fn normalize(mut config: Config) -> Config {
    let defaults = PollingConfig::default();
    let p = &mut config.polling;

    let fields: &mut [(&str, &mut u64, u64)] = &mut [
        ("polling.live_seconds", &mut p.live_seconds, defaults.live_seconds),
        (
            "polling.scheduled_seconds",
            &mut p.scheduled_seconds,
            defaults.scheduled_seconds,
        ),
        ("polling.idle_seconds", &mut p.idle_seconds, defaults.idle_seconds),
        (
            "polling.pre_live_window_seconds",
            &mut p.pre_live_window_seconds,
            defaults.pre_live_window_seconds,
        ),
    ];
    for (name, value, default) in fields.iter_mut() {
        if **value == 0 {
            warn!("config {name} must be positive; falling back to {default}");
            **value = *default;
        }
    }

    if config.ui.max_innings == 0 {
        warn!("config ui.max_innings must be positive; falling back to 9");
        config.ui.max_innings = 9;
    }
    if config.lookahead_days == 0 {
        warn!("config lookahead_days must be positive; falling back to 7");
        config.lookahead_days = 7;
    }

    config
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("scorecast_no_such_config.toml");
        let _ = fs::remove_file(&path);

        let config = load_config_from(&path).expect("defaults on missing file");
        assert_eq!(config.team_id, 117);
        assert_eq!(config.polling.live_seconds, 15);
        assert_eq!(config.polling.scheduled_seconds, 300);
        assert_eq!(config.polling.idle_seconds, 3600);
        assert_eq!(config.polling.pre_live_window_seconds, 3600);
        assert!(!config.record.enabled);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = std::env::temp_dir().join("scorecast_partial_config.toml");
        fs::write(&path, "team_id = 116\n\n[polling]\nlive_seconds = 10\n").unwrap();

        let config = load_config_from(&path).expect("should load");
        assert_eq!(config.team_id, 116);
        assert_eq!(config.polling.live_seconds, 10);
        assert_eq!(config.polling.scheduled_seconds, 300);
        assert_eq!(config.ui.max_innings, 9);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn zero_interval_falls_back_to_default() {
        let path = std::env::temp_dir().join("scorecast_zero_config.toml");
        fs::write(&path, "[polling]\nlive_seconds = 0\nidle_seconds = 7200\n").unwrap();

        let config = load_config_from(&path).expect("should load");
        assert_eq!(config.polling.live_seconds, 15);
        assert_eq!(config.polling.idle_seconds, 7200);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let path = std::env::temp_dir().join("scorecast_invalid_config.toml");
        fs::write(&path, "this is not valid [[[ toml").unwrap();

        let err = load_config_from(&path).unwrap_err();
        match err {
            ConfigError::ParseError { path: p, .. } => {
                assert!(p.ends_with("scorecast_invalid_config.toml"));
            }
            other => panic!("expected ParseError, got: {other}"),
        }

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn record_section_round_trips() {
        let path = std::env::temp_dir().join("scorecast_record_config.toml");
        fs::write(
            &path,
            "[record]\nenabled = true\npath = \"games.db\"\n",
        )
        .unwrap();

        let config = load_config_from(&path).expect("should load");
        assert!(config.record.enabled);
        assert_eq!(config.record.path, "games.db");

        let _ = fs::remove_file(&path);
    }
}
