use serde_json::Value;

use crate::dialect::WireDialect;

/// Transport-level stream event after SSE decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    TextDelta { text: String },
    Completed,
    Failed { message: Option<String> },
}

impl ChatStreamEvent {
    /// Returns true when this event terminates the stream.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed { .. })
    }
}

/// Maps one decoded SSE JSON payload to a stream event.
///
/// Payloads that carry neither text nor lifecycle information (role
/// preludes, ping frames, usage blocks) map to `None` and are skipped.
pub fn map_event(dialect: WireDialect, value: &Value) -> Option<ChatStreamEvent> {
    match dialect {
        WireDialect::ChatCompletions => map_chat_completions_event(value),
        WireDialect::AnthropicMessages => map_anthropic_event(value),
    }
}

fn map_chat_completions_event(value: &Value) -> Option<ChatStreamEvent> {
    if let Some(error) = value.get("error") {
        return Some(ChatStreamEvent::Failed {
            message: error
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string),
        });
    }

    let choice = value.get("choices")?.get(0)?;
    if let Some(text) = choice
        .get("delta")
        .and_then(|delta| delta.get("content"))
        .and_then(Value::as_str)
    {
        if !text.is_empty() {
            return Some(ChatStreamEvent::TextDelta {
                text: text.to_owned(),
            });
        }
    }

    if choice
        .get("finish_reason")
        .is_some_and(|reason| !reason.is_null())
    {
        return Some(ChatStreamEvent::Completed);
    }

    None
}

fn map_anthropic_event(value: &Value) -> Option<ChatStreamEvent> {
    let event_type = value.get("type")?.as_str()?;

    match event_type {
        "content_block_delta" => {
            let text = value
                .get("delta")
                .filter(|delta| delta.get("type").and_then(Value::as_str) == Some("text_delta"))
                .and_then(|delta| delta.get("text"))
                .and_then(Value::as_str)?;
            Some(ChatStreamEvent::TextDelta {
                text: text.to_owned(),
            })
        }
        "message_stop" => Some(ChatStreamEvent::Completed),
        "error" => Some(ChatStreamEvent::Failed {
            message: value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(Value::as_str)
                .map(ToString::to_string),
        }),
        _ => None,
    }
}
