use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Durable client state: the backend credential, its last known validity and
/// UI preferences. Everything session-scoped is deliberately absent.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub credential: CredentialSettings,
    #[serde(default)]
    pub ui: UiPreferences,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("credential", &self.credential)
            .field("ui", &self.ui)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub valid: bool,
}

impl std::fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSettings")
            .field("api_key", &mask(&self.api_key))
            .field("valid", &self.valid)
            .finish()
    }
}

/// Render a credential as `abcd…wxyz` (or `<empty>` / `****`).
pub fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "<empty>".into(),
        n if n < 12 => "****".into(),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{head}…{tail}")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiPreferences {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            language: default_language(),
        }
    }
}

fn default_theme() -> String {
    "dark".into()
}
fn default_language() -> String {
    "tr".into()
}

/// Manages loading and saving [`Settings`] to a TOML file on disk.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Create a new `SettingsManager` that reads/writes the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/crew-studio/settings.toml`
    pub fn default_path() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("crew-studio")
            .join("settings.toml");
        Self { path }
    }

    pub fn load(&self) -> Result<Settings, ConfigError> {
        let text =
            std::fs::read_to_string(&self.path).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save settings, creating parent directories if they don't exist. The
    /// file is restricted to the owner on unix since it holds a credential.
    pub fn save(&self, settings: &Settings) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        let text =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| ConfigError::Io(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        Ok(())
    }

    /// Load settings from disk, falling back to defaults when the file is
    /// missing or unparseable.
    pub fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(settings) => settings,
            Err(ConfigError::Io(_)) => Settings::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable settings");
                Settings::default()
            }
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
