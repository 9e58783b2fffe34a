// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Responsibilities:
// - POST /chat: validate the inbound message, hand it to the chat backend
// - Streaming replies as text/event-stream, full replies as JSON
// - Error-to-status mapping with a `{"detail": ...}` body
// - CORS for the configured frontend origins
// - Heartbeat endpoint

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::chat::{ChatError, ChatMessage, ChatReply, ChatService};
use crate::config::ServerConfig;

/// Inbound bodies larger than this are rejected.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The relay binds to localhost only, never 0.0.0.0.
pub const BIND_IP: [u8; 4] = [127, 0, 0, 1];
pub const DEFAULT_PORT: u16 = 8157;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("request body is empty")]
    EmptyBody,

    #[error("request body is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("request body is not a chat message: {0}")]
    InvalidMessage(String),

    #[error("failed to read request body: {0}")]
    BodyRead(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::EmptyBody
            | ProxyError::MalformedJson(_)
            | ProxyError::InvalidMessage(_)
            | ProxyError::BodyRead(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Chat(e) => match e {
                ChatError::MissingApiKey | ChatError::Format(_) | ChatError::InvalidHeader(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                ChatError::UpstreamStatus { .. } | ChatError::UpstreamFailure(_) => {
                    StatusCode::BAD_GATEWAY
                }
                ChatError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ChatError::ProviderRejected(_) => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Trait: ChatBackend (dependency injection point)
// ---------------------------------------------------------------------------

/// Produces a reply for one chat message.
///
/// `ChatService` is the production implementation; handlers only see this
/// trait so they can be tested without an upstream.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, message: ChatMessage) -> Result<ChatReply, ChatError>;
}

#[async_trait::async_trait]
impl ChatBackend for ChatService {
    async fn reply(&self, message: ChatMessage) -> Result<ChatReply, ChatError> {
        ChatService::reply(self, message).await
    }
}

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Heartbeat endpoint: GET /v1/heartbeat -> 200 OK
pub async fn heartbeat() -> StatusCode {
    StatusCode::OK
}

/// Parse and validate an inbound chat body.
pub fn parse_message(body: &[u8]) -> Result<ChatMessage, ProxyError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ProxyError::EmptyBody);
    }
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ProxyError::MalformedJson(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| ProxyError::InvalidMessage(e.to_string()))
}

/// POST /chat
pub async fn chat_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match handle_chat(&state, body).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(status = e.status().as_u16(), error = %e, "chat request failed");
            e.into_response()
        }
    }
}

async fn handle_chat(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ProxyError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        },
        _ => ProxyError::BodyRead(rejection.body_text()),
    })?;
    let message = parse_message(&body)?;

    match state.backend.reply(message).await? {
        ChatReply::Full(text) => Ok(Json(json!({ "response": text })).into_response()),
        ChatReply::Stream(stream) => {
            let body = Body::from_stream(stream.map(Ok::<_, Infallible>));
            Ok((
                [
                    (CONTENT_TYPE, HeaderValue::from_static("text/event-stream")),
                    (CACHE_CONTROL, HeaderValue::from_static("no-cache")),
                ],
                body,
            )
                .into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// CORS for the configured origins. Credentials are allowed, so methods
/// and headers are mirrored from the preflight rather than wildcarded.
pub fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let allow_origin = if server.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = server
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the axum router with the chat route and the heartbeat endpoint.
///
/// The backend is injected; no side effects, no hard-coded clients.
pub fn build_router(backend: Arc<dyn ChatBackend>, server: &ServerConfig) -> Router {
    let state = AppState { backend };

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/v1/heartbeat", get(heartbeat))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(cors_layer(server))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
