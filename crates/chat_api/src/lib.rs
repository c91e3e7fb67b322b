//! HTTP transport for hosted chat models.
//!
//! One client speaks two wire dialects: OpenAI-style chat completions
//! (which also covers xAI and local Ollama through their `/v1` endpoints)
//! and Anthropic-style messages. Responses stream over SSE; a non-streaming
//! `complete` path serves hosts without stream support.

pub mod backend;
pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod retry;
pub mod sse;
pub mod url;

pub use backend::GatewayBackend;
pub use client::{CancellationSignal, ChatApiClient};
pub use config::ChatApiConfig;
pub use dialect::WireDialect;
pub use error::ChatApiError;
pub use events::ChatStreamEvent;
pub use payload::ChatRequest;
