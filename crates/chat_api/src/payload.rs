use model_gateway::{ChatMessage, ChatRole};
use serde::Serialize;
use serde_json::Value;

use crate::dialect::WireDialect;

const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// One transport-level request, independent of wire dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f64,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct AnthropicBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

/// Serializes a request into the dialect's body shape.
///
/// The Anthropic shape hoists system messages out of the message list into
/// the dedicated `system` field; multiple system messages are joined.
pub fn build_body(
    dialect: WireDialect,
    request: &ChatRequest,
    stream: bool,
) -> Result<Value, serde_json::Error> {
    let temperature = request.temperature.unwrap_or(DEFAULT_TEMPERATURE);

    match dialect {
        WireDialect::ChatCompletions => {
            let body = ChatCompletionsBody {
                model: &request.model,
                messages: request
                    .messages
                    .iter()
                    .map(|message| WireMessage {
                        role: role_name(message.role),
                        content: &message.content,
                    })
                    .collect(),
                temperature,
                stream,
                max_tokens: request.max_tokens,
            };
            serde_json::to_value(body)
        }
        WireDialect::AnthropicMessages => {
            let system: Vec<&str> = request
                .messages
                .iter()
                .filter(|message| message.role == ChatRole::System)
                .map(|message| message.content.as_str())
                .collect();

            let body = AnthropicBody {
                model: &request.model,
                system: if system.is_empty() {
                    None
                } else {
                    Some(system.join("\n\n"))
                },
                messages: request
                    .messages
                    .iter()
                    .filter(|message| message.role != ChatRole::System)
                    .map(|message| WireMessage {
                        role: role_name(message.role),
                        content: &message.content,
                    })
                    .collect(),
                max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                temperature,
                stream,
            };
            serde_json::to_value(body)
        }
    }
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}
