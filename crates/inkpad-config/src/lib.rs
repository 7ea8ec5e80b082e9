use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_TITLE: &str = "Untitled document";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// How the floating toolbar reacts to key presses in the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicySetting {
    #[default]
    HideOnAnyKey,
    RecomputeOnNavigation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub key_policy: KeyPolicySetting,
    /// Title used when saving from a front end that has no title field.
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            key_policy: KeyPolicySetting::default(),
            default_title: default_title(),
        }
    }
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub documents_path: PathBuf,
    #[serde(default)]
    pub editor: EditorConfig,
}

impl Config {
    pub fn new(documents_path: impl Into<PathBuf>) -> Self {
        Self {
            documents_path: documents_path.into(),
            editor: EditorConfig::default(),
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the documents folder
        config.documents_path =
            Self::expand_path(&config.documents_path).unwrap_or(config.documents_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_dir() -> PathBuf {
        PathBuf::from(shellexpand::tilde("~/.config/inkpad").as_ref())
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Log file for front ends that own the terminal.
    pub fn log_path() -> PathBuf {
        Self::config_dir().join("inkpad.log")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/inkpad/config.toml"));
    }

    #[test]
    fn test_log_path_sits_next_to_config() {
        assert_eq!(
            Config::log_path().parent(),
            Config::config_path().parent()
        );
        assert!(Config::log_path().ends_with("inkpad.log"));
    }

    #[test]
    fn test_editor_section_is_optional() {
        let config: Config = toml::from_str(r#"documents_path = "/tmp/docs""#).unwrap();

        assert_eq!(config, Config::new("/tmp/docs"));
        assert_eq!(config.editor.key_policy, KeyPolicySetting::HideOnAnyKey);
        assert_eq!(config.editor.default_title, "Untitled document");
    }

    #[test]
    fn test_editor_section_overrides() {
        let config_content = r#"
documents_path = "/tmp/docs"

[editor]
key_policy = "recompute-on-navigation"
default_title = "Scratch"
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(
            config.editor,
            EditorConfig {
                key_policy: KeyPolicySetting::RecomputeOnNavigation,
                default_title: "Scratch".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_key_policy_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "documents_path = \"/tmp\"\n[editor]\nkey_policy = \"sometimes\"\n",
        )
        .unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(
            result,
            Err(ConfigError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("INKPAD_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$INKPAD_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("INKPAD_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_relative_path() {
        let path = PathBuf::from("relative/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let mut test_config = Config::new("/tmp/test-documents");
        test_config.editor.key_policy = KeyPolicySetting::RecomputeOnNavigation;

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_documents_path_expanded_on_load() {
        unsafe {
            env::set_var("INKPAD_DOCS_ROOT", "/custom/documents");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_file,
            "documents_path = \"$INKPAD_DOCS_ROOT/inkpad\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(
            config.documents_path,
            PathBuf::from("/custom/documents/inkpad")
        );

        unsafe {
            env::remove_var("INKPAD_DOCS_ROOT");
        }
    }
}
