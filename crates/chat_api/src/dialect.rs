/// Wire format spoken at the remote endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireDialect {
    /// OpenAI-style `/chat/completions` (OpenAI, xAI, Ollama `/v1`).
    ChatCompletions,
    /// Anthropic-style `/messages`.
    AnthropicMessages,
}

impl WireDialect {
    /// Path appended to a normalized base URL.
    pub fn endpoint_path(self) -> &'static str {
        match self {
            Self::ChatCompletions => "/chat/completions",
            Self::AnthropicMessages => "/messages",
        }
    }

    /// Whether credentials travel as a bearer token or a vendor header.
    pub fn uses_bearer_auth(self) -> bool {
        matches!(self, Self::ChatCompletions)
    }
}
