use url::Url;

use crate::dialect::WireDialect;
use crate::error::ChatApiError;

/// Default base URL for chat-completions requests.
pub const DEFAULT_CHAT_COMPLETIONS_BASE_URL: &str = "https://api.openai.com/v1";
/// Default base URL for Anthropic messages requests.
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Normalize a base URL to the dialect's request endpoint.
///
/// Normalization rules:
/// 1) keep a URL already ending in the endpoint path unchanged
/// 2) append the endpoint path otherwise, collapsing trailing slashes
pub fn normalize_endpoint(input: &str, dialect: WireDialect) -> String {
    let base = if input.trim().is_empty() {
        match dialect {
            WireDialect::ChatCompletions => DEFAULT_CHAT_COMPLETIONS_BASE_URL,
            WireDialect::AnthropicMessages => DEFAULT_ANTHROPIC_BASE_URL,
        }
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    let path = dialect.endpoint_path();
    if trimmed.ends_with(path) {
        return trimmed.to_string();
    }
    format!("{trimmed}{path}")
}

/// Validates that a base URL parses as an absolute http(s) URL.
pub fn validate_base_url(input: &str) -> Result<(), ChatApiError> {
    let parsed =
        Url::parse(input.trim()).map_err(|_| ChatApiError::InvalidBaseUrl(input.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ChatApiError::InvalidBaseUrl(input.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_endpoint, validate_base_url};
    use crate::dialect::WireDialect;

    #[test]
    fn appends_endpoint_path_once() {
        assert_eq!(
            normalize_endpoint("https://api.x.ai/v1", WireDialect::ChatCompletions),
            "https://api.x.ai/v1/chat/completions"
        );
        assert_eq!(
            normalize_endpoint(
                "https://api.x.ai/v1/chat/completions",
                WireDialect::ChatCompletions
            ),
            "https://api.x.ai/v1/chat/completions"
        );
    }

    #[test]
    fn empty_base_falls_back_to_dialect_default() {
        assert_eq!(
            normalize_endpoint("", WireDialect::AnthropicMessages),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn trailing_slash_is_collapsed() {
        assert_eq!(
            normalize_endpoint("http://localhost:11434/v1/", WireDialect::ChatCompletions),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_base_url("ftp://example.com").is_err());
        assert!(validate_base_url("not a url").is_err());
        assert!(validate_base_url("https://api.openai.com/v1").is_ok());
    }
}
