use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Client configuration loaded from `~/.config/crew-studio/config.toml`.
///
/// Holds only endpoints and tuning knobs. The backend credential lives in
/// the separate settings file managed by [`crate::settings::SettingsManager`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(path)
        } else {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        self.validate()?;
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()
    }

    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("crew-studio")
            .join("config.toml")
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(String),
    #[error("parse: {0}")]
    Parse(String),
    #[error("validation: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Section structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// REST base, including the `/api` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// WebSocket base. Derived from `base_url` when unset.
    #[serde(default)]
    pub ws_url: Option<String>,
    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_url: None,
            request_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000/api".into()
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "api.base_url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if let Some(ws) = &self.ws_url {
            if !(ws.starts_with("ws://") || ws.starts_with("wss://")) {
                return Err(ConfigError::Validation(format!(
                    "api.ws_url must be ws(s), got {ws:?}"
                )));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "api.request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// REST base without a trailing slash.
    pub fn rest_base(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    /// WebSocket base: `ws_url` if configured, otherwise the REST base with
    /// its scheme swapped and the `/api` suffix dropped.
    pub fn ws_base(&self) -> String {
        if let Some(ws) = &self.ws_url {
            return ws.trim_end_matches('/').to_string();
        }
        let base = self.rest_base();
        let swapped = if let Some(host) = base.strip_prefix("https://") {
            format!("wss://{host}")
        } else if let Some(host) = base.strip_prefix("http://") {
            format!("ws://{host}")
        } else {
            base.clone()
        };
        swapped
            .strip_suffix("/api")
            .map(str::to_string)
            .unwrap_or(swapped)
    }

    /// Realtime URL for one session.
    pub fn session_ws_url(&self, session_id: &str) -> String {
        format!("{}/ws/{session_id}", self.ws_base())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Reconnect attempts after an abnormal drop. Zero keeps the channel
    /// single-shot.
    #[serde(default)]
    pub max_reconnects: u32,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_reconnects: 0,
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}
