use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{DroidFlowError, DroidFlowResult};
use crate::executor::coordinator::DeviceScreen;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Path to the `adb` binary (falls back to env var DROIDFLOW_ADB_PATH).
    #[serde(default = "default_adb_path")]
    pub adb_path: String,
    /// Screen assumed when the caller has no real metrics for the device.
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    /// Per-command timeout. Absent means a stalled command stalls the run.
    #[serde(default)]
    pub command_timeout_ms: Option<u64>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            command_timeout_ms: None,
        }
    }
}

impl DeviceConfig {
    pub fn default_screen(&self) -> DeviceScreen {
        DeviceScreen::new(self.screen_width, self.screen_height)
    }
}

fn default_adb_path() -> String {
    "adb".to_string()
}

fn default_screen_width() -> u32 {
    1080
}

fn default_screen_height() -> u32 {
    2340
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Abort the run at the first failed step.
    #[serde(default = "default_true")]
    pub stop_on_failure: bool,
    /// Only consulted when `stop_on_failure` is false.
    #[serde(default = "default_max_failures")]
    pub max_consecutive_failures: u32,
    /// 0 = unlimited.
    #[serde(default)]
    pub max_duration_minutes: u32,
    /// Upper bound on iterations for loops marked infinite.
    #[serde(default = "default_max_infinite_iterations")]
    pub max_infinite_iterations: u32,
    #[serde(default)]
    pub record_history: bool,
    #[serde(default)]
    pub history_dir: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            stop_on_failure: true,
            max_consecutive_failures: default_max_failures(),
            max_duration_minutes: 0,
            max_infinite_iterations: default_max_infinite_iterations(),
            record_history: false,
            history_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_failures() -> u32 {
    5
}

fn default_max_infinite_iterations() -> u32 {
    1000
}

fn resolve_config_path() -> DroidFlowResult<PathBuf> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            let candidate = parent.join(CONFIG_FILE);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "config found next to executable");
                return Ok(candidate);
            }
        }
    }

    let cwd = std::env::current_dir()?;
    let candidate = cwd.join(CONFIG_FILE);
    if candidate.exists() {
        tracing::debug!(path = %candidate.display(), "config found in working directory");
        return Ok(candidate);
    }

    if let Some(dir) = dirs::config_dir() {
        let candidate = dir.join("droidflow").join(CONFIG_FILE);
        if candidate.exists() {
            tracing::debug!(path = %candidate.display(), "config found in user config dir");
            return Ok(candidate);
        }
    }

    Err(DroidFlowError::Config(
        "config.toml not found next to executable, in working directory or in user config dir"
            .into(),
    ))
}

/// Parse a config file and apply environment overrides.
pub fn load_config_from(path: &Path) -> DroidFlowResult<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let mut config: AppConfig = toml::from_str(&content)?;
    apply_env_overrides(&mut config)?;
    tracing::info!(
        path = %path.display(),
        adb = %config.device.adb_path,
        "config loaded"
    );
    Ok(config)
}

pub fn load_config() -> DroidFlowResult<AppConfig> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let path = resolve_config_path()?;
    load_config_from(&path)
}

/// Like [`load_config`], but falls back to defaults (plus env overrides) on error.
pub fn load_config_or_default() -> AppConfig {
    match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config; using defaults");
            let mut cfg = AppConfig::default();
            if let Err(e) = apply_env_overrides(&mut cfg) {
                tracing::error!(error = %e, "ignoring invalid environment override");
            }
            cfg
        }
    }
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> DroidFlowResult<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}

pub fn save_config(config: &AppConfig) -> DroidFlowResult<()> {
    let path = resolve_config_path()?;
    save_config_to(config, &path)
}

fn apply_env_overrides(config: &mut AppConfig) -> DroidFlowResult<()> {
    if let Ok(path) = std::env::var("DROIDFLOW_ADB_PATH") {
        if !path.trim().is_empty() {
            config.device.adb_path = path;
        }
    }
    if let Ok(raw) = std::env::var("DROIDFLOW_COMMAND_TIMEOUT_MS") {
        let ms = raw.trim().parse::<u64>().map_err(|_| {
            DroidFlowError::Config(format!("DROIDFLOW_COMMAND_TIMEOUT_MS is not a number: {raw}"))
        })?;
        config.device.command_timeout_ms = Some(ms);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.device.adb_path, "adb");
        assert_eq!(cfg.device.default_screen(), DeviceScreen::new(1080, 2340));
        assert!(cfg.device.command_timeout_ms.is_none());
        assert!(cfg.runner.stop_on_failure);
        assert_eq!(cfg.runner.max_consecutive_failures, 5);
        assert!(!cfg.runner.record_history);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [device]
            screen_width = 720
            command_timeout_ms = 8000

            [runner]
            stop_on_failure = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.device.screen_width, 720);
        assert_eq!(cfg.device.screen_height, 2340);
        assert_eq!(cfg.device.command_timeout_ms, Some(8000));
        assert!(!cfg.runner.stop_on_failure);
        assert_eq!(cfg.runner.max_infinite_iterations, 1000);
    }

    #[test]
    fn save_then_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.device.adb_path = "/opt/platform-tools/adb".into();
        cfg.runner.max_duration_minutes = 30;
        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[device]"));

        let loaded: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(loaded.device.adb_path, "/opt/platform-tools/adb");
        assert_eq!(loaded.runner.max_duration_minutes, 30);
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[device\nadb_path = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, DroidFlowError::TomlDe(_)));
    }
}
