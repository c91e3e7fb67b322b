use chat_api::{ChatApiClient, ChatApiConfig, GatewayBackend, WireDialect};
use model_gateway::ChatBackend;

#[test]
fn client_normalizes_endpoint_from_config() {
    let config = ChatApiConfig::new("key", WireDialect::ChatCompletions)
        .with_base_url("https://api.x.ai/v1");
    let client = ChatApiClient::new(config).expect("client should build");

    assert_eq!(
        client.normalized_endpoint(),
        "https://api.x.ai/v1/chat/completions"
    );
}

#[test]
fn client_rejects_invalid_base_url() {
    let config = ChatApiConfig::new("key", WireDialect::ChatCompletions)
        .with_base_url("not-a-url");

    assert!(ChatApiClient::new(config).is_err());
}

#[test]
fn backend_carries_identity_and_streaming_capability() {
    let config = ChatApiConfig::new("key", WireDialect::AnthropicMessages);
    let backend = GatewayBackend::new("anthropic", "claude-3-5-sonnet-20241022", true, config)
        .expect("backend should build");

    let profile = backend.profile();
    assert_eq!(profile.provider_id, "anthropic");
    assert_eq!(profile.model_id, "claude-3-5-sonnet-20241022");
    assert!(backend.supports_streaming());
}

#[test]
fn backend_surfaces_config_errors() {
    let config =
        ChatApiConfig::new("key", WireDialect::ChatCompletions).with_base_url("ftp://nope");

    assert!(GatewayBackend::new("openai", "gpt-4o", true, config).is_err());
}
