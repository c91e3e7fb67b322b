mod error;
mod paths;
mod store;

pub use error::SettingsError;
pub use paths::{config_file_path, config_root, CONFIG_DIR_ENV_VAR};
pub use store::{Settings, SettingsStore};
