//! Minimal provider-agnostic contract for one chat turn.
//!
//! This crate defines only the message history shapes, the stream lifecycle
//! and the backend trait. It excludes provider transport details, wire
//! payloads, and anything about what the caller does with the response.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

use serde::{Deserialize, Serialize};

pub mod mock;

pub use mock::MockBackend;

/// Shared cancellation flag for a streaming call.
pub type CancelSignal = Arc<AtomicBool>;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One history item sent to a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Backend-emitted lifecycle event for one streamed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Started,
    Delta { text: String },
    Finished,
    Failed { error: String },
}

impl StreamEvent {
    /// Returns true when this event terminates the stream lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. })
    }
}

/// Opaque failure of one gateway call.
///
/// A backend call fails as a whole; the caller treats the turn as lost and
/// never reaches directive parsing for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    message: String,
}

impl GatewayError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<String> for GatewayError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for GatewayError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Immutable identity metadata for a configured backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// A model backend bound to one model selection.
///
/// `stream` emits events in order and finishes with exactly one terminal
/// event. Backends without native streaming inherit the default `stream`,
/// which completes the call first and replays the text as a single delta,
/// so callers can treat every backend uniformly.
pub trait ChatBackend: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> BackendProfile;

    /// Whether the backend produces incremental deltas natively.
    fn supports_streaming(&self) -> bool;

    /// Produces the complete response text for a message history.
    fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError>;

    /// Streams the response as lazy, finite, non-restartable fragments.
    fn stream(
        &self,
        messages: &[ChatMessage],
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamEvent),
    ) -> Result<(), GatewayError> {
        let _ = &cancel;
        emit(StreamEvent::Started);
        let text = self.complete(messages)?;
        emit(StreamEvent::Delta { text });
        emit(StreamEvent::Finished);
        Ok(())
    }
}
