// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Chat service
//
// Turns one inbound chat message into one upstream chat-completion call:
// - Model selection and system prompt from the context type
// - Request body and attribution headers
// - Streaming: relay the upstream SSE body as normalized events
// - Non-streaming: buffer, decompress, parse and extract the reply text

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use futures_util::stream::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::completion::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};
use crate::config::Config;
use crate::context::{fallback_chain, select_model, system_prompt, ContextType};
use crate::stream::relay;
use crate::upstream::{
    maybe_decompress, HttpBody, HttpError, HttpRequest, HttpResponse, HttpSender,
};

const HTTP_REFERER: HeaderName = HeaderName::from_static("http-referer");
const X_TITLE: HeaderName = HeaderName::from_static("x-title");

/// Inbound chat request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(default)]
    pub context_type: ContextType,
    #[serde(default = "default_use_streaming")]
    pub use_streaming: bool,
}

fn default_use_streaming() -> bool {
    true
}

pub enum ChatReply {
    /// Complete reply text.
    Full(String),
    /// Normalized SSE frames, terminated by `data: [DONE]`.
    Stream(Pin<Box<dyn Stream<Item = Bytes> + Send>>),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("OpenRouter API key is not set. Please add OPENROUTER_API_KEY to your .env file.")]
    MissingApiKey,
    #[error("OpenRouter API error ({status}): {body}")]
    UpstreamStatus { status: StatusCode, body: String },
    #[error("Network error: {0}")]
    UpstreamFailure(String),
    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),
    #[error("{0}")]
    ProviderRejected(String),
    #[error("{0}")]
    Format(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

impl From<HttpError> for ChatError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Timeout(msg) => ChatError::UpstreamTimeout(msg),
            HttpError::Transport(msg) => ChatError::UpstreamFailure(msg),
        }
    }
}

struct RequestContext {
    request_id: String,
    context_type: &'static str,
    model: String,
}

pub struct ChatService {
    config: Arc<Config>,
    http: Arc<dyn HttpSender>,
}

impl ChatService {
    pub fn new(config: Arc<Config>, http: Arc<dyn HttpSender>) -> Self {
        Self { config, http }
    }

    pub async fn reply(&self, message: ChatMessage) -> Result<ChatReply, ChatError> {
        let Some(api_key) = self.config.upstream.api_key.as_deref() else {
            tracing::error!("chat request rejected: no upstream API key configured");
            return Err(ChatError::MissingApiKey);
        };

        let model = select_model(&message.text, message.context_type, &self.config.models);
        let ctx = RequestContext {
            request_id: Uuid::new_v4().to_string(),
            context_type: message.context_type.as_str(),
            model: model.to_string(),
        };
        let models = fallback_chain(model, &self.config.models);

        tracing::info!(
            request_id = %ctx.request_id,
            context_type = ctx.context_type,
            model = %ctx.model,
            models = ?models,
            streaming = message.use_streaming,
            "model selected"
        );

        let completion = ChatCompletionRequest {
            model: ctx.model.clone(),
            models,
            messages: vec![
                WireMessage::system(system_prompt(message.context_type, &self.config.prompts)),
                WireMessage::user(message.text),
            ],
            max_tokens: self.config.generation.max_tokens,
            temperature: self.config.generation.temperature,
            stream: message.use_streaming,
        };
        let body = serde_json::to_vec(&completion)
            .map_err(|e| ChatError::Format(format!("failed to encode request: {e}")))?;

        let request = HttpRequest {
            url: self.config.upstream.completions_url(),
            headers: self.build_headers(api_key)?,
            body: Bytes::from(body),
            timeout_ms: Some(self.config.upstream.timeout_ms),
            stream: message.use_streaming,
        };

        if message.use_streaming {
            self.stream_reply(request, &ctx).await
        } else {
            self.full_reply(request, &ctx).await
        }
    }

    fn build_headers(&self, api_key: &str) -> Result<HeaderMap, ChatError> {
        let value = |s: &str| {
            HeaderValue::from_str(s).map_err(|e| ChatError::InvalidHeader(e.to_string()))
        };

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value(&format!("Bearer {api_key}"))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = &self.config.upstream.referer {
            headers.insert(HTTP_REFERER, value(referer)?);
        }
        if let Some(title) = &self.config.upstream.title {
            headers.insert(X_TITLE, value(title)?);
        }
        Ok(headers)
    }

    async fn stream_reply(
        &self,
        request: HttpRequest,
        ctx: &RequestContext,
    ) -> Result<ChatReply, ChatError> {
        let upstream = self.send(request, ctx).await?;

        tracing::info!(
            request_id = %ctx.request_id,
            model = %ctx.model,
            "relaying upstream stream"
        );

        let stream: Pin<Box<dyn Stream<Item = Bytes> + Send>> = match upstream.body {
            HttpBody::Stream(s) => Box::pin(relay(s)),
            HttpBody::Full(bytes) => {
                let once = futures_util::stream::iter([Ok::<_, HttpError>(bytes)]);
                Box::pin(relay(once))
            }
        };
        Ok(ChatReply::Stream(stream))
    }

    async fn full_reply(
        &self,
        request: HttpRequest,
        ctx: &RequestContext,
    ) -> Result<ChatReply, ChatError> {
        let upstream = self.send(request, ctx).await?;
        let mut headers = upstream.headers.clone();
        let raw = upstream.into_bytes().await?;
        let body = maybe_decompress(&mut headers, raw)?;

        let response: ChatCompletionResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(request_id = %ctx.request_id, error = %e, "invalid JSON from upstream");
            ChatError::Format(format!("Invalid response format from OpenRouter: {e}"))
        })?;

        if let Some(error) = response.error.as_ref() {
            let message = error
                .message
                .clone()
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(request_id = %ctx.request_id, error = %message, "provider rejected request");
            return Err(ChatError::ProviderRejected(message));
        }

        let Some(text) = response.reply_text() else {
            tracing::error!(
                request_id = %ctx.request_id,
                choices = response.choices.len(),
                "unexpected response format"
            );
            return Err(ChatError::Format(
                "Invalid response format from OpenRouter".to_string(),
            ));
        };

        if let Some(used) = response.model.as_deref().filter(|m| *m != ctx.model) {
            tracing::info!(
                request_id = %ctx.request_id,
                selected = %ctx.model,
                used_model = used,
                "fallback model used"
            );
        }
        tracing::info!(
            request_id = %ctx.request_id,
            response_chars = text.chars().count(),
            "reply received"
        );

        Ok(ChatReply::Full(text.to_string()))
    }

    /// Send and reject non-2xx statuses, carrying the provider's body text.
    async fn send(
        &self,
        request: HttpRequest,
        ctx: &RequestContext,
    ) -> Result<HttpResponse, ChatError> {
        let start = Instant::now();
        let response = self.http.send(request).await.map_err(|e| {
            tracing::error!(request_id = %ctx.request_id, error = %e, "upstream request failed");
            ChatError::from(e)
        })?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        if !response.status.is_success() {
            let status = response.status;
            let mut headers = response.headers.clone();
            let raw = response.into_bytes().await.unwrap_or_default();
            let raw = maybe_decompress(&mut headers, raw.clone()).unwrap_or(raw);
            let body = String::from_utf8_lossy(&raw).into_owned();
            tracing::error!(
                request_id = %ctx.request_id,
                status = status.as_u16(),
                body = %body,
                latency_ms,
                "upstream returned error status"
            );
            return Err(ChatError::UpstreamStatus { status, body });
        }

        tracing::debug!(
            request_id = %ctx.request_id,
            status = response.status.as_u16(),
            latency_ms,
            "upstream responded"
        );
        Ok(response)
    }
}
