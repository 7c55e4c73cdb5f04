use std::{fs, path::{Path, PathBuf}};

use directories::ProjectDirs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{DeckError, Result};

/// Default attachment ceiling: 5 MB.
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the storage slots
    pub storage_dir: PathBuf,

    /// How often the blog draft is autosaved (in seconds)
    pub autosave_interval_secs: u64,

    /// Largest attachment accepted by the note form (in bytes)
    pub max_attachment_bytes: u64,

    /// How long a removal waits for the exit transition before committing (in milliseconds)
    pub removal_fallback_ms: u64,

    /// Editor used for composing blog content
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let storage_dir = ProjectDirs::from("", "", "notedeck")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".notedeck"));

        Self {
            storage_dir,
            autosave_interval_secs: 5,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            removal_fallback_ms: 300,
            editor_command: None,
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "notedeck").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the configuration from `path`, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| {
            error!("Failed to read config file {}: {}", path.display(), e);
            DeckError::ConfigError {
                message: format!("Failed to read {}: {}", path.display(), e),
            }
        })?;

        let config: Config = serde_json::from_str(&text).map_err(|e| DeckError::ConfigError {
            message: format!("Invalid config file {}: {}", path.display(), e),
        })?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            // Try common Linux editors
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.max_attachment_bytes, 5 * 1024 * 1024);
        assert_eq!(config.autosave_interval_secs, 5);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "autosave_interval_secs": 30 }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.autosave_interval_secs, 30);
        assert_eq!(config.removal_fallback_ms, 300);
    }

    #[test]
    fn invalid_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            Config::load(&path),
            Err(DeckError::ConfigError { .. })
        ));
    }

    #[test]
    fn configured_editor_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "editor_command": "vim -n" }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.get_editor_command(), "vim -n");
        assert_eq!(config.max_attachment_bytes, DEFAULT_MAX_ATTACHMENT_BYTES);
    }
}
