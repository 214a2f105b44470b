use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::session::AdminSecret;
use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides `admin_password`
pub const ADMIN_PASSWORD_ENV: &str = "PETLOG_ADMIN_PASSWORD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_diary_file")]
    pub diary_file: String,
    #[serde(default = "default_notices_file")]
    pub notices_file: String,
    #[serde(default = "default_photo_dir")]
    pub photo_dir: String,
    /// Shared admin password; login is disabled while empty
    #[serde(default)]
    pub admin_password: String,
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width_percent: u16,
    #[serde(default = "default_status_timeout")]
    pub status_timeout_secs: u64,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_login")]
    pub login: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
    #[serde(default = "default_tab_left")]
    pub tab_left: String,
    #[serde(default = "default_tab_right")]
    pub tab_right: String,
    #[serde(default = "default_tab_1")]
    pub tab_1: String,
    #[serde(default = "default_tab_2")]
    pub tab_2: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    #[serde(default = "default_tab_bg")]
    pub tab_bg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            diary_file: default_diary_file(),
            notices_file: default_notices_file(),
            photo_dir: default_photo_dir(),
            admin_password: String::new(),
            sidebar_width_percent: default_sidebar_width(),
            status_timeout_secs: default_status_timeout(),
            key_bindings: KeyBindings::default(),
            theme: Theme::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            delete: default_delete(),
            login: default_login(),
            save: default_save(),
            help: default_help(),
            list_up: default_list_up(),
            list_down: default_list_down(),
            tab_left: default_tab_left(),
            tab_right: default_tab_right(),
            tab_1: default_tab_1(),
            tab_2: default_tab_2(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            tab_bg: default_tab_bg(),
        }
    }
}

// Default value functions
fn default_data_dir() -> String {
    // This is a fallback - actual profile will be determined at load time
    Config::default_data_dir_for_profile(utils::Profile::Prod)
}

fn default_diary_file() -> String {
    "diary.csv".to_string()
}

fn default_notices_file() -> String {
    "notices.csv".to_string()
}

fn default_photo_dir() -> String {
    "photos".to_string()
}

fn default_sidebar_width() -> u16 {
    30
}

fn default_status_timeout() -> u64 {
    3
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_login() -> String {
    "a".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_tab_left() -> String {
    "Left".to_string()
}

fn default_tab_right() -> String {
    "Right".to_string()
}

fn default_tab_1() -> String {
    "1".to_string()
}

fn default_tab_2() -> String {
    "2".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_tab_bg() -> String {
    "gray".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config file, creating a default one if missing
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let mut config = Config::default();
            config.data_dir = Self::default_data_dir_for_profile(profile);
            config.save_to(&config_path)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file, creating its directory if needed
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default data directory for a specific profile
    fn default_data_dir_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/petlog-dev".to_string(),
                utils::Profile::Prod => "~/.local/share/petlog".to_string(),
            }
        }
    }

    /// Get the expanded data directory (with ~ expansion)
    pub fn get_data_dir(&self) -> PathBuf {
        utils::expand_path(&self.data_dir)
    }

    /// Resolve a configured file name against the data directory
    fn data_path(&self, name: &str) -> PathBuf {
        let path = utils::expand_path(name);
        if path.is_absolute() {
            path
        } else {
            self.get_data_dir().join(path)
        }
    }

    pub fn diary_path(&self) -> PathBuf {
        self.data_path(&self.diary_file)
    }

    pub fn notices_path(&self) -> PathBuf {
        self.data_path(&self.notices_file)
    }

    pub fn photo_dir_path(&self) -> PathBuf {
        self.data_path(&self.photo_dir)
    }

    /// The admin secret, with the environment taking precedence over the file
    pub fn admin_secret(&self) -> AdminSecret {
        let from_env = std::env::var(ADMIN_PASSWORD_ENV).ok();
        Self::pick_secret(from_env, &self.admin_password)
    }

    fn pick_secret(from_env: Option<String>, from_file: &str) -> AdminSecret {
        match from_env {
            Some(secret) if !secret.is_empty() => AdminSecret::new(secret),
            _ => AdminSecret::new(from_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: Config = toml::from_str("admin_password = \"gamu\"\ndata_dir = \"/srv/petlog\"\n").unwrap();

        assert_eq!(config.admin_password, "gamu");
        assert_eq!(config.diary_file, "diary.csv");
        assert_eq!(config.key_bindings.save, "Ctrl+s");
        assert_eq!(config.theme.highlight_bg, "blue");
        assert_eq!(config.status_timeout_secs, 3);
    }

    #[test]
    fn data_files_resolve_against_data_dir() {
        let config = Config {
            data_dir: "/srv/petlog".to_string(),
            photo_dir: "/var/photos".to_string(),
            ..Config::default()
        };

        assert_eq!(config.diary_path(), PathBuf::from("/srv/petlog/diary.csv"));
        assert_eq!(config.notices_path(), PathBuf::from("/srv/petlog/notices.csv"));
        assert_eq!(config.photo_dir_path(), PathBuf::from("/var/photos"));
    }

    #[test]
    fn environment_secret_wins_when_set() {
        use crate::session::Session;

        assert!(!Config::pick_secret(None, "").is_configured());
        assert!(!Config::pick_secret(Some(String::new()), "").is_configured());

        let secret = Config::pick_secret(Some("env".to_string()), "file");
        let mut session = Session::new();
        assert!(session.login("file", &secret).is_err());
        assert!(session.login("env", &secret).is_ok());

        let secret = Config::pick_secret(Some(String::new()), "file");
        assert!(Session::new().login("file", &secret).is_ok());
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = Config {
            admin_password: "gamu".to_string(),
            sidebar_width_percent: 40,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded.admin_password, "gamu");
        assert_eq!(loaded.sidebar_width_percent, 40);
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sidebar_width_percent = \"wide\"").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseError(_))));
    }
}
