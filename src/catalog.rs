use chat_api::WireDialect;

/// Hosted or local model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Xai,
    Ollama,
}

impl Provider {
    pub fn id(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Xai => "xai",
            Self::Ollama => "ollama",
        }
    }

    pub fn dialect(self) -> WireDialect {
        match self {
            Self::Anthropic => WireDialect::AnthropicMessages,
            Self::OpenAi | Self::Xai | Self::Ollama => WireDialect::ChatCompletions,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Xai => "https://api.x.ai/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Settings key that stores this provider's credential, if it needs one.
    pub fn settings_key(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("openai_api_key"),
            Self::Anthropic => Some("anthropic_api_key"),
            Self::Xai => Some("xai_api_key"),
            Self::Ollama => None,
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub provider: Provider,
    pub description: &'static str,
    pub context_tokens: u32,
    pub supports_streaming: bool,
}

pub const AVAILABLE_MODELS: &[ModelSpec] = &[
    ModelSpec {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        provider: Provider::OpenAi,
        description: "Affordable small model for fast, lightweight tasks",
        context_tokens: 128_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "gpt-4o",
        name: "GPT-4o",
        provider: Provider::OpenAi,
        description: "Omni-modal flagship with strong coding performance",
        context_tokens: 128_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "gpt-4-turbo",
        name: "GPT-4 Turbo",
        provider: Provider::OpenAi,
        description: "Large-context GPT-4 tier",
        context_tokens: 128_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "gpt-3.5-turbo",
        name: "GPT-3.5 Turbo",
        provider: Provider::OpenAi,
        description: "Fast and efficient for most tasks",
        context_tokens: 4_096,
        supports_streaming: true,
    },
    ModelSpec {
        id: "claude-3-5-sonnet-20241022",
        name: "Claude 3.5 Sonnet",
        provider: Provider::Anthropic,
        description: "Balanced speed and reasoning",
        context_tokens: 200_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "claude-3-opus-20240229",
        name: "Claude 3 Opus",
        provider: Provider::Anthropic,
        description: "Most capable Claude tier for complex work",
        context_tokens: 200_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "claude-3-haiku-20240307",
        name: "Claude 3 Haiku",
        provider: Provider::Anthropic,
        description: "Fast and lightweight Claude tier",
        context_tokens: 200_000,
        supports_streaming: true,
    },
    ModelSpec {
        id: "grok-2",
        name: "Grok-2",
        provider: Provider::Xai,
        description: "xAI's general-purpose model",
        context_tokens: 32_768,
        supports_streaming: true,
    },
    ModelSpec {
        id: "llama3",
        name: "Llama 3",
        provider: Provider::Ollama,
        description: "Meta's open-source model, served locally",
        context_tokens: 8_192,
        supports_streaming: true,
    },
    ModelSpec {
        id: "codellama",
        name: "Code Llama",
        provider: Provider::Ollama,
        description: "Code-specialized Llama, served locally",
        context_tokens: 4_096,
        supports_streaming: true,
    },
    ModelSpec {
        id: "mistral",
        name: "Mistral",
        provider: Provider::Ollama,
        description: "Open-source generalist, served locally",
        context_tokens: 8_192,
        supports_streaming: true,
    },
];

pub fn find_model(model_id: &str) -> Option<&'static ModelSpec> {
    AVAILABLE_MODELS.iter().find(|spec| spec.id == model_id)
}
