//! [`LlmGateway`] over the Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use cryptovox_application::{GatewayError, LlmGateway, LlmRequest, StreamHandle};
use cryptovox_domain::LlmResponse;
use reqwest::{Client, Response, StatusCode, header};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::sse::pump;
use super::types::{ApiErrorBody, MessagesRequest, MessagesResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const STREAM_CHANNEL_CAPACITY: usize = 64;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Messages API client.
///
/// `send` uses a single JSON response; `stream` requests SSE and forwards
/// decoded events through a channel fed by a background task.
#[derive(Clone)]
pub struct AnthropicGateway {
    client: Client,
    endpoint: String,
    headers: header::HeaderMap,
    request_timeout: Duration,
}

impl AnthropicGateway {
    pub fn new(
        api_key: &str,
        base_url: &str,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let key = header::HeaderValue::from_str(api_key)
            .map_err(|e| GatewayError::Other(format!("Invalid API key format: {e}")))?;
        headers.insert("x-api-key", key);
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: messages_endpoint(base_url),
            headers,
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, body: &MessagesRequest<'_>) -> Result<Response, GatewayError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(body);
        // Streams may legitimately run longer than one batched call.
        if !body.stream {
            builder = builder.timeout(self.request_timeout);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "Messages API returned an error");
        Err(error_from_body(status, &body))
    }
}

#[async_trait]
impl LlmGateway for AnthropicGateway {
    async fn send(&self, request: &LlmRequest<'_>) -> Result<LlmResponse, GatewayError> {
        let body = MessagesRequest::new(
            request.model,
            request.max_tokens,
            request.messages,
            request.tools,
            false,
        );
        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Messages API call"
        );

        let response = self.post(&body).await?;
        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {e}")))?;
        Ok(parsed.into_llm_response())
    }

    async fn stream(&self, request: &LlmRequest<'_>) -> Result<StreamHandle, GatewayError> {
        let body = MessagesRequest::new(
            request.model,
            request.max_tokens,
            request.messages,
            request.tools,
            true,
        );
        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Messages API streaming call"
        );

        let response = self.post(&body).await?;
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);

        tokio::spawn(pump(response.bytes_stream(), tx));

        Ok(StreamHandle::new(rx))
    }
}

fn messages_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1/messages") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{base}/messages")
    } else {
        format!("{base}/v1/messages")
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ConnectionError(err.to_string())
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

/// Turn a non-2xx response into a gateway error, preferring the API's own
/// message when the body is the documented error shape.
fn error_from_body(status: StatusCode, body: &str) -> GatewayError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => GatewayError::RequestFailed(format!(
            "HTTP {} {}: {}",
            status.as_u16(),
            parsed.error.error_type,
            parsed.error.message
        )),
        Err(_) if body.trim().is_empty() => {
            GatewayError::RequestFailed(format!("HTTP {}", status.as_u16()))
        }
        Err(_) => GatewayError::RequestFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            cryptovox_domain::util::preview(body, 200)
        )),
    }
}
