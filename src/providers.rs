use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chat_api::{ChatApiConfig, GatewayBackend};
use model_gateway::{ChatBackend, MockBackend};
use settings_store::SettingsStore;

use crate::catalog::{find_model, ModelSpec, Provider};

/// Forces a backend regardless of the selected model. `mock` is the only
/// recognized value and exists for offline runs and tests.
pub const PROVIDER_ENV_VAR: &str = "QUILL_PROVIDER";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const USER_AGENT: &str = concat!("quill/", env!("CARGO_PKG_VERSION"));

/// Resolves a model id to a ready-to-use backend.
pub fn backend_for_model(
    model_id: &str,
    store: &SettingsStore,
) -> Result<Arc<dyn ChatBackend>> {
    if std::env::var(PROVIDER_ENV_VAR)
        .map(|value| value.trim().eq_ignore_ascii_case("mock"))
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockBackend::default()));
    }

    let spec = find_model(model_id)
        .ok_or_else(|| anyhow!("Unknown model '{model_id}'. Run `quill models` for the list."))?;

    let api_key = match spec.provider.settings_key() {
        Some(key_name) => store.api_key_for(key_name).ok_or_else(|| {
            anyhow!(
                "No API key configured for {}. Run `quill setup` or `quill config --key <key> --model {}`.",
                spec.provider.id(),
                spec.id
            )
        })?,
        None => "",
    };

    let config = ChatApiConfig::new(api_key, spec.provider.dialect())
        .with_base_url(base_url_for(spec, store))
        .with_user_agent(USER_AGENT)
        .with_timeout(REQUEST_TIMEOUT);

    let backend = GatewayBackend::new(
        spec.provider.id(),
        spec.id,
        spec.supports_streaming,
        config,
    )
    .map_err(|error| anyhow!("Failed to initialize {}: {error}", spec.provider.id()))?;

    Ok(Arc::new(backend))
}

/// Whether the model could run right now (credential present or not needed).
pub fn model_is_available(spec: &ModelSpec, store: &SettingsStore) -> bool {
    match spec.provider.settings_key() {
        Some(key_name) => store.api_key_for(key_name).is_some(),
        None => true,
    }
}

fn base_url_for(spec: &ModelSpec, store: &SettingsStore) -> String {
    if spec.provider == Provider::Ollama {
        if let Some(host) = store
            .settings
            .ollama_host
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return format!("{}/v1", host.trim_end_matches('/'));
        }
    }
    spec.provider.default_base_url().to_string()
}

#[cfg(test)]
mod tests {
    use settings_store::SettingsStore;
    use tempfile::tempdir;

    use super::{backend_for_model, base_url_for, model_is_available};
    use crate::catalog::find_model;

    fn empty_store() -> (tempfile::TempDir, SettingsStore) {
        let root = tempdir().expect("temp root");
        let store = SettingsStore::load_or_default(root.path()).expect("load settings");
        (root, store)
    }

    #[test]
    fn unknown_model_is_an_error() {
        let (_root, store) = empty_store();
        let error = backend_for_model("no-such-model", &store).err().expect("must fail");
        assert!(error.to_string().contains("Unknown model"));
    }

    #[test]
    fn missing_api_key_points_at_setup() {
        let (_root, store) = empty_store();
        let error = backend_for_model("gpt-4o-mini", &store).err().expect("must fail");
        assert!(error.to_string().contains("quill setup"));
    }

    #[test]
    fn local_models_are_available_without_keys() {
        let (_root, store) = empty_store();
        let llama = find_model("llama3").expect("catalog entry");
        let gpt = find_model("gpt-4o-mini").expect("catalog entry");

        assert!(model_is_available(llama, &store));
        assert!(!model_is_available(gpt, &store));
    }

    #[test]
    fn ollama_host_override_feeds_the_base_url() {
        let (_root, mut store) = empty_store();
        store.settings.ollama_host = Some("http://10.0.0.5:11434/".to_string());

        let llama = find_model("llama3").expect("catalog entry");
        assert_eq!(base_url_for(llama, &store), "http://10.0.0.5:11434/v1");
    }
}
