//! Config model and persistence helpers.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Environment variable that overrides `api.base_url`.
pub const API_URL_ENV: &str = "AUTOTUBE_API_URL";

/// Top-level configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Backend connection settings.
    pub api: ApiCfg,
    /// Status polling intervals.
    pub polling: PollingCfg,
    /// Values sent when a draft is finalized.
    pub finalize: FinalizeCfg,
    /// Log output.
    pub log: LogCfg,
}

/// Backend connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiCfg {
    /// Base URL of the automation backend, without trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Timeout for calls that do their work inside the request (draft
    /// planning, rendering, downloads and uploads).
    #[serde(default = "default_long_timeout_secs")]
    pub long_timeout_secs: u64,
}

fn default_long_timeout_secs() -> u64 {
    600
}

/// Polling delays in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingCfg {
    pub job_interval_ms: u64,
    pub preview_interval_ms: u64,
    pub batch_interval_ms: u64,
}

/// Defaults for `POST /api/draft/{id}/finalize`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizeCfg {
    pub upload: bool,
    pub template: String,
    pub bgm_enabled: bool,
    pub bgm_mood: String,
    pub bgm_volume: f64,
}

/// Log file location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogCfg {
    pub file: String,
}

impl Config {
    /// Load from disk or create defaults when missing.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let mut cfg = if path.exists() {
            let s = fs::read_to_string(path)?;
            toml::from_str(&s)?
        } else {
            let cfg = Self::default();
            cfg.save(path)?;
            cfg
        };
        cfg.apply_env(std::env::var(API_URL_ENV).ok());
        Ok(cfg)
    }

    /// Persist the config as pretty TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self)?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Apply the base URL override and normalise it.
    pub fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = url.trim().to_string();
        }
        while self.api.base_url.ends_with('/') {
            self.api.base_url.pop();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }

    /// Never shorter than the normal request timeout.
    pub fn long_request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.long_timeout_secs).max(self.request_timeout())
    }
}

impl PollingCfg {
    pub fn job_interval(&self) -> Duration {
        Duration::from_millis(self.job_interval_ms)
    }

    pub fn preview_interval(&self) -> Duration {
        Duration::from_millis(self.preview_interval_ms)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }
}

impl Default for Config {
    /// Defaults match a backend started locally with its stock settings.
    fn default() -> Self {
        Self {
            api: ApiCfg {
                base_url: "http://localhost:8000".into(),
                timeout_secs: 30,
                long_timeout_secs: default_long_timeout_secs(),
            },
            polling: PollingCfg {
                job_interval_ms: 3000,
                preview_interval_ms: 2000,
                batch_interval_ms: 3000,
            },
            finalize: FinalizeCfg {
                upload: false,
                template: "basic".into(),
                bgm_enabled: true,
                bgm_mood: "auto".into(),
                bgm_volume: 0.25,
            },
            log: LogCfg {
                file: "autotube_tui.log".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_or_default(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.polling.preview_interval_ms, 2000);

        let reloaded: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.finalize, Config::default().finalize);
    }

    #[test]
    fn older_config_without_long_timeout_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut text = toml::to_string_pretty(&Config::default()).unwrap();
        text = text
            .lines()
            .filter(|l| !l.starts_with("long_timeout_secs"))
            .collect::<Vec<_>>()
            .join("\n");
        fs::write(&path, text).unwrap();

        let cfg = Config::load_or_default(&path).unwrap();
        assert_eq!(cfg.api.long_timeout_secs, 600);
        assert_eq!(cfg.long_request_timeout(), Duration::from_secs(600));

        let mut short = Config::default();
        short.api.long_timeout_secs = 5;
        assert_eq!(short.long_request_timeout(), short.request_timeout());
    }

    #[test]
    fn env_override_strips_trailing_slash() {
        let mut cfg = Config::default();
        cfg.apply_env(Some("http://api.internal:9000/".into()));
        assert_eq!(cfg.api.base_url, "http://api.internal:9000");

        cfg.apply_env(Some("   ".into()));
        assert_eq!(cfg.api.base_url, "http://api.internal:9000");
    }
}
