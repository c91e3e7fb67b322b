use model_gateway::{
    BackendProfile, CancelSignal, ChatBackend, ChatMessage, GatewayError, StreamEvent,
};
use tokio::runtime::{Builder, Runtime};

use crate::client::ChatApiClient;
use crate::config::ChatApiConfig;
use crate::error::ChatApiError;
use crate::events::ChatStreamEvent;
use crate::payload::ChatRequest;

/// Adapter exposing [`ChatApiClient`] through the synchronous gateway
/// contract.
///
/// Owns a current-thread runtime so callers never need one of their own;
/// every call blocks until the transport resolves, which matches the
/// sequential turn model upstream.
pub struct GatewayBackend {
    provider_id: String,
    model_id: String,
    streaming: bool,
    max_tokens: Option<u32>,
    client: ChatApiClient,
    runtime: Runtime,
}

impl GatewayBackend {
    pub fn new(
        provider_id: impl Into<String>,
        model_id: impl Into<String>,
        streaming: bool,
        config: ChatApiConfig,
    ) -> Result<Self, GatewayError> {
        let client =
            ChatApiClient::new(config).map_err(|error| GatewayError::new(error.to_string()))?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| GatewayError::new(format!("failed to start transport: {error}")))?;

        Ok(Self {
            provider_id: provider_id.into(),
            model_id: model_id.into(),
            streaming,
            max_tokens: None,
            client,
            runtime,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request_for(&self, messages: &[ChatMessage]) -> ChatRequest {
        let mut request = ChatRequest::new(self.model_id.clone(), messages.to_vec());
        request.max_tokens = self.max_tokens;
        request
    }
}

impl ChatBackend for GatewayBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            provider_id: self.provider_id.clone(),
            model_id: self.model_id.clone(),
        }
    }

    fn supports_streaming(&self) -> bool {
        self.streaming
    }

    fn complete(&self, messages: &[ChatMessage]) -> Result<String, GatewayError> {
        let request = self.request_for(messages);
        self.runtime
            .block_on(self.client.complete(&request))
            .map_err(|error| GatewayError::new(error.to_string()))
    }

    fn stream(
        &self,
        messages: &[ChatMessage],
        cancel: CancelSignal,
        emit: &mut dyn FnMut(StreamEvent),
    ) -> Result<(), GatewayError> {
        emit(StreamEvent::Started);

        if !self.streaming {
            let text = self.complete(messages)?;
            emit(StreamEvent::Delta { text });
            emit(StreamEvent::Finished);
            return Ok(());
        }

        let request = self.request_for(messages);
        let result = self.runtime.block_on(self.client.stream(
            &request,
            Some(&cancel),
            &mut |event| {
                if let ChatStreamEvent::TextDelta { text } = event {
                    emit(StreamEvent::Delta { text });
                }
            },
        ));

        match result {
            Ok(()) | Err(ChatApiError::Cancelled) => {
                emit(StreamEvent::Finished);
                Ok(())
            }
            Err(error) => {
                emit(StreamEvent::Failed {
                    error: error.to_string(),
                });
                Err(GatewayError::new(error.to_string()))
            }
        }
    }
}
