use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use crate::{BackendProfile, CancelSignal, ChatBackend, ChatMessage, GatewayError, StreamEvent};

/// Deterministic scripted backend for tests and offline runs.
///
/// Streams its chunks at token boundaries with small delays so display
/// filtering sees realistic fragment boundaries, and checks the cancel flag
/// between tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockBackend {
    chunks: Vec<String>,
    start_delay_ms: u64,
    token_delay_ms: u64,
}

impl MockBackend {
    pub fn new(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            start_delay_ms: Self::START_DELAY_MS,
            token_delay_ms: Self::TOKEN_DELAY_MS,
        }
    }

    /// A mock that streams instantly, for tests that assert on output.
    pub fn instant(chunks: Vec<String>) -> Self {
        Self {
            chunks,
            start_delay_ms: 0,
            token_delay_ms: 0,
        }
    }

    const START_DELAY_MS: u64 = 200;
    const TOKEN_DELAY_MS: u64 = 30;
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(vec![
            "Setting up a small demo in the working directory.\n\n".to_string(),
            "**QUILL_CREATE_FILE: hello.txt**\n".to_string(),
            "```text\nhello from the mock backend\n```\n\n".to_string(),
            "Now printing it back:\n\n".to_string(),
            "**QUILL_RUN_COMMAND: cat hello.txt**\n\n".to_string(),
            "That demonstrates the full create-and-run loop.\n".to_string(),
        ])
    }
}

impl ChatBackend for MockBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            provider_id: "mock".to_string(),
            model_id: "mock".to_string(),
        }
    }

    fn supports_streaming(&self) -> bool {
        true
    }

    fn complete(&self, _messages: &[ChatMessage]) -> Result<String, GatewayError> {
        Ok(self.chunks.concat())
    }

    fn stream(
        &self,
        _messages: &[ChatMessage],
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamEvent),
    ) -> Result<(), GatewayError> {
        emit(StreamEvent::Started);
        sleep_ms(self.start_delay_ms);

        for chunk in &self.chunks {
            let mut pending_token = String::new();
            for ch in chunk.chars() {
                pending_token.push(ch);

                if matches!(ch, ' ' | '\n') {
                    if cancel.load(Ordering::SeqCst) {
                        emit(StreamEvent::Finished);
                        return Ok(());
                    }

                    emit(StreamEvent::Delta {
                        text: std::mem::take(&mut pending_token),
                    });
                    sleep_ms(self.token_delay_ms);
                }
            }

            if !pending_token.is_empty() {
                emit(StreamEvent::Delta {
                    text: pending_token,
                });
                sleep_ms(self.token_delay_ms);
            }
        }

        emit(StreamEvent::Finished);
        Ok(())
    }
}

fn sleep_ms(millis: u64) {
    if millis > 0 {
        thread::sleep(Duration::from_millis(millis));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use super::MockBackend;
    use crate::{ChatBackend, ChatMessage, StreamEvent};

    #[test]
    fn streamed_deltas_concatenate_to_the_complete_text() {
        let backend = MockBackend::instant(vec![
            "first chunk\n".to_string(),
            "second chunk\n".to_string(),
        ]);
        let cancel = Arc::new(AtomicBool::new(false));
        let mut streamed = String::new();

        backend
            .stream(&[ChatMessage::user("go")], cancel, &mut |event| {
                if let StreamEvent::Delta { text } = event {
                    streamed.push_str(&text);
                }
            })
            .expect("mock stream should succeed");

        let completed = backend
            .complete(&[ChatMessage::user("go")])
            .expect("mock complete should succeed");
        assert_eq!(streamed, completed);
    }

    #[test]
    fn cancel_flag_stops_the_stream_with_a_terminal_event() {
        let backend = MockBackend::instant(vec!["one two three four\n".to_string()]);
        let cancel = Arc::new(AtomicBool::new(true));
        let mut events = Vec::new();

        backend
            .stream(&[ChatMessage::user("go")], cancel, &mut |event| {
                events.push(event)
            })
            .expect("cancelled stream still returns cleanly");

        assert_eq!(events.first(), Some(&StreamEvent::Started));
        assert_eq!(events.last(), Some(&StreamEvent::Finished));
        assert!(events
            .iter()
            .filter(|event| event.is_terminal())
            .count()
            == 1);
    }
}
