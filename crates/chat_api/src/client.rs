use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};

use crate::config::ChatApiConfig;
use crate::dialect::WireDialect;
use crate::error::{parse_error_message, ChatApiError};
use crate::events::ChatStreamEvent;
use crate::headers::build_headers;
use crate::payload::{build_body, ChatRequest};
use crate::retry::{is_retryable_http_error, retry_delay_ms, MAX_RETRIES};
use crate::sse::SseStreamParser;
use crate::url::{normalize_endpoint, validate_base_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct ChatApiClient {
    http: Client,
    config: ChatApiConfig,
}

impl ChatApiClient {
    pub fn new(config: ChatApiConfig) -> Result<Self, ChatApiError> {
        if !config.base_url.trim().is_empty() {
            validate_base_url(&config.base_url)?;
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ChatApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatApiConfig {
        &self.config
    }

    pub fn normalized_endpoint(&self) -> String {
        normalize_endpoint(&self.config.base_url, self.config.dialect)
    }

    fn build_header_map(&self) -> Result<HeaderMap, ChatApiError> {
        let headers = build_headers(&self.config, self.config.user_agent.as_deref())?;
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes())
                    .map_err(|_| ChatApiError::InvalidHeader(key.clone()))?,
                HeaderValue::from_str(&value)
                    .map_err(|_| ChatApiError::InvalidHeader(key.clone()))?,
            );
        }
        Ok(out)
    }

    fn build_request(
        &self,
        request: &ChatRequest,
        stream: bool,
    ) -> Result<reqwest::RequestBuilder, ChatApiError> {
        let headers = self.build_header_map()?;
        let body = build_body(self.config.dialect, request, stream)?;
        Ok(self
            .http
            .post(self.normalized_endpoint())
            .headers(headers)
            .json(&body))
    }

    async fn send_with_retry(
        &self,
        request: &ChatRequest,
        stream: bool,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, ChatApiError> {
        let mut last_status: Option<StatusCode> = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }

            let response = self.build_request(request, stream)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(ChatApiError::from);

            match response {
                Ok(response) => {
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_else(|_| {
                            status
                                .canonical_reason()
                                .unwrap_or("request failed")
                                .to_string()
                        });
                    let message = parse_error_message(status, &body);

                    if attempt == MAX_RETRIES
                        || !is_retryable_http_error(status.as_u16(), &message)
                    {
                        return Err(ChatApiError::Status(status, message));
                    }
                    last_error = Some(message);
                }
                Err(error) => {
                    if attempt == MAX_RETRIES {
                        return Err(error);
                    }
                    last_error = Some(error.to_string());
                }
            }

            await_or_cancel(tokio::time::sleep(retry_delay_ms(attempt)), cancellation).await?;
        }

        Err(ChatApiError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// One-shot completion for hosts (or models) without stream support.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, ChatApiError> {
        let response = self.send_with_retry(request, false, None).await?;
        let body: serde_json::Value = response.json().await.map_err(ChatApiError::from)?;
        extract_completed_text(self.config.dialect, &body)
    }

    /// Streams a response, invoking `on_event` per decoded event in order.
    ///
    /// Returns after the terminal event, at stream end, or with
    /// [`ChatApiError::Cancelled`] once the cancellation flag is observed.
    pub async fn stream(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
        on_event: &mut dyn FnMut(ChatStreamEvent),
    ) -> Result<(), ChatApiError> {
        let response = self.send_with_retry(request, true, cancellation).await?;
        let mut body = response.bytes_stream();
        let mut parser = SseStreamParser::new(self.config.dialect);

        loop {
            if is_cancelled(cancellation) {
                return Err(ChatApiError::Cancelled);
            }

            let Some(chunk) = await_or_cancel(body.next(), cancellation).await? else {
                // Stream ended without an explicit terminal frame; hosts that
                // close the connection after the last delta are still complete.
                return Ok(());
            };
            let chunk = chunk.map_err(ChatApiError::from)?;

            for event in parser.feed(&chunk) {
                match event {
                    ChatStreamEvent::TextDelta { .. } => on_event(event),
                    ChatStreamEvent::Completed => {
                        on_event(ChatStreamEvent::Completed);
                        return Ok(());
                    }
                    ChatStreamEvent::Failed { message } => {
                        return Err(ChatApiError::StreamFailed {
                            message: message.unwrap_or_else(|| "unknown stream error".to_string()),
                        });
                    }
                }
            }
        }
    }
}

fn extract_completed_text(
    dialect: WireDialect,
    body: &serde_json::Value,
) -> Result<String, ChatApiError> {
    let text = match dialect {
        WireDialect::ChatCompletions => body
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(serde_json::Value::as_str),
        WireDialect::AnthropicMessages => body
            .get("content")
            .and_then(|content| content.get(0))
            .and_then(|block| block.get("text"))
            .and_then(serde_json::Value::as_str),
    };

    text.map(ToString::to_string).ok_or_else(|| {
        ChatApiError::MalformedResponse("response carries no completion text".to_string())
    })
}

fn is_cancelled(cancellation: Option<&CancellationSignal>) -> bool {
    cancellation.is_some_and(|cancel| cancel.load(Ordering::SeqCst))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, ChatApiError>
where
    F: Future,
{
    let Some(cancel) = cancellation else {
        return Ok(future.await);
    };

    tokio::pin!(future);
    loop {
        if cancel.load(Ordering::SeqCst) {
            return Err(ChatApiError::Cancelled);
        }

        tokio::select! {
            output = &mut future => return Ok(output),
            () = tokio::time::sleep(CANCEL_POLL_INTERVAL) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    use serde_json::json;

    use super::{await_or_cancel, extract_completed_text};
    use crate::dialect::WireDialect;
    use crate::error::ChatApiError;

    #[test]
    fn extracts_completed_text_per_dialect() {
        let openai = json!({"choices":[{"message":{"role":"assistant","content":"hi"}}]});
        assert_eq!(
            extract_completed_text(WireDialect::ChatCompletions, &openai).unwrap(),
            "hi"
        );

        let anthropic = json!({"content":[{"type":"text","text":"hello"}]});
        assert_eq!(
            extract_completed_text(WireDialect::AnthropicMessages, &anthropic).unwrap(),
            "hello"
        );
    }

    #[test]
    fn missing_completion_text_is_malformed() {
        let body = json!({"choices":[]});
        assert!(extract_completed_text(WireDialect::ChatCompletions, &body).is_err());
    }

    #[tokio::test]
    async fn await_or_cancel_stops_a_pending_future_once_flagged() {
        let cancel = Arc::new(AtomicBool::new(true));
        let result = await_or_cancel(std::future::pending::<()>(), Some(&cancel)).await;

        assert!(matches!(result, Err(ChatApiError::Cancelled)));
    }
}
