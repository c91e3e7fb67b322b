use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::paths::config_file_path;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are Quill, a careful coding assistant that works inside the user's project directory.";

/// Persisted key/value settings document.
///
/// Unknown keys in an existing file survive a load/save round trip only as
/// far as the known fields go; the document is small and owned by this tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub xai_api_key: Option<String>,
    pub ollama_host: Option<String>,
    pub default_model: String,
    pub system_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            xai_api_key: None,
            ollama_host: None,
            default_model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Settings document bound to its file location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    pub settings: Settings,
}

impl SettingsStore {
    /// Loads settings from `<root>/config.json`, falling back to defaults
    /// when the file does not exist yet.
    pub fn load_or_default(root: &Path) -> Result<Self, SettingsError> {
        let path = config_file_path(root);

        let settings = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Settings::default(),
            Err(source) => return Err(SettingsError::io("reading settings", &path, source)),
        };

        Ok(Self { path, settings })
    }

    /// Writes the document back as pretty JSON, creating the root directory
    /// on first save.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| SettingsError::io("creating config directory", parent, source))?;
        }

        let raw = serde_json::to_string_pretty(&self.settings).map_err(|source| {
            SettingsError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        fs::write(&self.path, raw)
            .map_err(|source| SettingsError::io("writing settings", &self.path, source))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored API key for a provider settings key, if any.
    #[must_use]
    pub fn api_key_for(&self, key_name: &str) -> Option<&str> {
        let value = match key_name {
            "openai_api_key" => self.settings.openai_api_key.as_deref(),
            "anthropic_api_key" => self.settings.anthropic_api_key.as_deref(),
            "xai_api_key" => self.settings.xai_api_key.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|value| !value.is_empty())
    }

    /// Sets an API key by settings key name. Unknown names are rejected so
    /// typos surface instead of silently writing nothing.
    pub fn set_api_key(&mut self, key_name: &str, value: impl Into<String>) -> bool {
        let value = Some(value.into());
        match key_name {
            "openai_api_key" => self.settings.openai_api_key = value,
            "anthropic_api_key" => self.settings.anthropic_api_key = value,
            "xai_api_key" => self.settings.xai_api_key = value,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::{Settings, SettingsStore, DEFAULT_MODEL};

    #[test]
    fn missing_file_loads_defaults() {
        let root = tempdir().expect("temp root");
        let store = SettingsStore::load_or_default(root.path()).expect("load should succeed");

        assert_eq!(store.settings, Settings::default());
        assert_eq!(store.settings.default_model, DEFAULT_MODEL);
    }

    #[test]
    fn save_then_load_round_trips() {
        let root = tempdir().expect("temp root");
        let mut store = SettingsStore::load_or_default(root.path()).expect("load");
        store.settings.default_model = "claude-3-5-sonnet-20241022".to_string();
        assert!(store.set_api_key("anthropic_api_key", "sk-ant-test"));
        store.save().expect("save should succeed");

        let reloaded = SettingsStore::load_or_default(root.path()).expect("reload");
        assert_eq!(reloaded.settings, store.settings);
        assert_eq!(reloaded.api_key_for("anthropic_api_key"), Some("sk-ant-test"));
    }

    #[test]
    fn malformed_json_surfaces_a_typed_error() {
        let root = tempdir().expect("temp root");
        std::fs::write(root.path().join("config.json"), "{ not json").expect("seed bad file");

        let error = SettingsStore::load_or_default(root.path())
            .expect_err("malformed settings must not load");
        assert!(error.to_string().contains("failed to parse settings"));
    }

    #[test]
    fn unknown_api_key_name_is_rejected() {
        let root = tempdir().expect("temp root");
        let mut store = SettingsStore::load_or_default(root.path()).expect("load");

        assert!(!store.set_api_key("huggingface_api_key_typo", "x"));
        assert_eq!(store.api_key_for("huggingface_api_key_typo"), None);
    }

    #[test]
    fn blank_api_keys_read_as_absent() {
        let root = tempdir().expect("temp root");
        let mut store = SettingsStore::load_or_default(root.path()).expect("load");
        store.set_api_key("openai_api_key", "   ");

        assert_eq!(store.api_key_for("openai_api_key"), None);
    }
}
