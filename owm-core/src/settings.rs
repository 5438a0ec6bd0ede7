use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::endpoint::Units;

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OWM_API_KEY";

pub const DEFAULT_LANG: &str = "en";

/// Top-level settings stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// units = "metric"
/// lang = "de"
/// views_file = "/home/me/.config/owm/views.json"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<String>,
    pub units: Units,
    pub lang: String,
    /// Optional JSON file with extra views, see [`crate::views::Views`].
    pub views_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            units: Units::default(),
            lang: DEFAULT_LANG.to_string(),
            views_file: None,
        }
    }
}

impl Settings {
    /// Load settings from the platform config dir, or defaults on first run.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(settings)
    }

    /// Save settings, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("org", "openweathermap", "owm")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from `OWM_API_KEY`, falling back to the stored one.
    pub fn api_key(&self) -> Option<String> {
        pick_api_key(env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }

    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `owm configure` or set {API_KEY_ENV}."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}

fn pick_api_key(from_env: Option<String>, stored: Option<&str>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| stored.map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.lang, "en");
        assert_eq!(settings.units, Units::Standard);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.set_api_key("KEY".into());
        settings.units = Units::Metric;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = \"imperial\"\n").unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.units, Units::Imperial);
        assert_eq!(loaded.lang, DEFAULT_LANG);
        assert!(loaded.api_key.is_none());
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "units = \"kelvin\"\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn env_key_wins_over_stored() {
        assert_eq!(pick_api_key(Some("ENV".into()), Some("FILE")), Some("ENV".into()));
        assert_eq!(pick_api_key(Some("  ".into()), Some("FILE")), Some("FILE".into()));
        assert_eq!(pick_api_key(None, None), None);
    }
}
