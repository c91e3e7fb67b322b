use std::path::PathBuf;

use crate::error::SettingsError;

/// Overrides the config root, mainly for tests and sandboxed runs.
pub const CONFIG_DIR_ENV_VAR: &str = "QUILL_CONFIG_DIR";

const CONFIG_DIR_NAME: &str = ".quill";
const CONFIG_FILE_NAME: &str = "config.json";

/// Resolves the directory that holds the settings file.
pub fn config_root() -> Result<PathBuf, SettingsError> {
    if let Some(root) = std::env::var_os(CONFIG_DIR_ENV_VAR) {
        let root = PathBuf::from(root);
        if !root.as_os_str().is_empty() {
            return Ok(root);
        }
    }

    home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(SettingsError::NoConfigRoot {
            env_var: CONFIG_DIR_ENV_VAR,
        })
}

/// Settings file path under a given root.
#[must_use]
pub fn config_file_path(root: &std::path::Path) -> PathBuf {
    root.join(CONFIG_FILE_NAME)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::config_file_path;

    #[test]
    fn config_file_lives_under_the_root() {
        let path = config_file_path(std::path::Path::new("/tmp/example"));
        assert_eq!(path, std::path::PathBuf::from("/tmp/example/config.json"));
    }
}
