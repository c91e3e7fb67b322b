use serde_json::Value;

use crate::dialect::WireDialect;
use crate::events::{map_event, ChatStreamEvent};

/// Incremental parser for SSE text streams.
#[derive(Debug)]
pub struct SseStreamParser {
    dialect: WireDialect,
    buffer: String,
}

impl SseStreamParser {
    pub fn new(dialect: WireDialect) -> Self {
        Self {
            dialect,
            buffer: String::new(),
        }
    }

    /// Feed arbitrary bytes into the parser and drain complete events.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatStreamEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));
        let mut events = Vec::new();

        while let Some(split) = self.buffer.find("\n\n") {
            let frame = self.buffer[..split].to_string();
            self.buffer.drain(0..split + 2);

            let Some(payload) = extract_data_payload(&frame) else {
                continue;
            };

            if payload == "[DONE]" {
                events.push(ChatStreamEvent::Completed);
                continue;
            }

            if let Ok(value) = serde_json::from_str::<Value>(&payload) {
                if let Some(event) = map_event(self.dialect, &value) {
                    events.push(event);
                }
            }
        }

        events
    }

    /// Parse a complete SSE payload string in one shot.
    pub fn parse_frames(dialect: WireDialect, input: &str) -> Vec<ChatStreamEvent> {
        let mut parser = Self::new(dialect);
        parser.feed(input.as_bytes())
    }

    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.trim().is_empty()
    }
}

fn extract_data_payload(frame: &str) -> Option<String> {
    let data_lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect();

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
