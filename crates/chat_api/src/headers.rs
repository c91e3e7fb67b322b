use crate::config::ChatApiConfig;
use crate::error::ChatApiError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Builds the outgoing header list for one request.
///
/// An empty API key omits the auth header entirely; local endpoints accept
/// that, and hosted ones answer with a status error the caller surfaces.
pub fn build_headers(
    config: &ChatApiConfig,
    user_agent: Option<&str>,
) -> Result<Vec<(String, String)>, ChatApiError> {
    let mut headers = Vec::new();
    let key = config.api_key.trim();

    if !key.is_empty() {
        if config.dialect.uses_bearer_auth() {
            headers.push(("Authorization".to_string(), format!("Bearer {key}")));
        } else {
            headers.push(("x-api-key".to_string(), key.to_string()));
        }
    }

    if !config.dialect.uses_bearer_auth() {
        headers.push((
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        ));
    }

    if let Some(user_agent) = user_agent.map(str::trim).filter(|value| !value.is_empty()) {
        headers.push(("User-Agent".to_string(), user_agent.to_string()));
    }

    for (key, value) in &config.extra_headers {
        if key.trim().is_empty() {
            return Err(ChatApiError::InvalidHeader(key.clone()));
        }
        headers.push((key.clone(), value.clone()));
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::build_headers;
    use crate::config::ChatApiConfig;
    use crate::dialect::WireDialect;

    fn header_value<'a>(headers: &'a [(String, String)], key: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(header_key, _)| header_key == key)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn chat_completions_uses_bearer_auth() {
        let config = ChatApiConfig::new("sk-test", WireDialect::ChatCompletions);
        let headers = build_headers(&config, None).expect("headers should build");

        assert_eq!(header_value(&headers, "Authorization"), Some("Bearer sk-test"));
        assert_eq!(header_value(&headers, "x-api-key"), None);
    }

    #[test]
    fn anthropic_uses_vendor_key_and_version_headers() {
        let config = ChatApiConfig::new("sk-ant", WireDialect::AnthropicMessages);
        let headers = build_headers(&config, None).expect("headers should build");

        assert_eq!(header_value(&headers, "x-api-key"), Some("sk-ant"));
        assert_eq!(header_value(&headers, "anthropic-version"), Some("2023-06-01"));
        assert_eq!(header_value(&headers, "Authorization"), None);
    }

    #[test]
    fn empty_key_omits_auth_for_local_endpoints() {
        let config = ChatApiConfig::new("", WireDialect::ChatCompletions);
        let headers = build_headers(&config, None).expect("headers should build");

        assert_eq!(header_value(&headers, "Authorization"), None);
    }

    #[test]
    fn extra_headers_and_user_agent_are_appended() {
        let config = ChatApiConfig::new("k", WireDialect::ChatCompletions)
            .insert_header("x-custom", "1");
        let headers = build_headers(&config, Some("quill/0.1")).expect("headers should build");

        assert_eq!(header_value(&headers, "x-custom"), Some("1"));
        assert_eq!(header_value(&headers, "User-Agent"), Some("quill/0.1"));
    }
}
