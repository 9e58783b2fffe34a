// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Upstream transport
//
// The chat service talks to the provider through `HttpSender` so tests can
// substitute a scripted sender. `ReqwestHttpSender` is the production one.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;
use flate2::read::{DeflateDecoder, GzDecoder};
use futures_util::stream::Stream;
use futures_util::TryStreamExt;

/// Sends chat-completion requests to the upstream provider.
#[async_trait]
pub trait HttpSender: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

// ---------------------------------------------------------------------------
// Transport types
// ---------------------------------------------------------------------------

/// A POST to the provider. `stream` selects how the response body is read.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub timeout_ms: Option<u64>,
    pub stream: bool,
}

pub enum HttpBody {
    Full(Bytes),
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>),
}

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: HttpBody,
}

impl HttpResponse {
    /// Collect the whole body, draining a stream if necessary.
    pub async fn into_bytes(self) -> Result<Bytes, HttpError> {
        match self.body {
            HttpBody::Full(bytes) => Ok(bytes),
            HttpBody::Stream(stream) => {
                let chunks: Vec<Bytes> = stream.try_collect().await?;
                Ok(Bytes::from(chunks.concat()))
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream request timed out: {0}")]
    Timeout(String),
}

// ---------------------------------------------------------------------------
// Reqwest HTTP sender
// ---------------------------------------------------------------------------

pub struct ReqwestHttpSender {
    client: reqwest::Client,
}

impl ReqwestHttpSender {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHttpSender {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

fn classify(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout(e.to_string())
    } else {
        HttpError::Transport(e.to_string())
    }
}

#[async_trait]
impl HttpSender for ReqwestHttpSender {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut req = self
            .client
            .post(&request.url)
            .headers(request.headers)
            .body(request.body);

        if let Some(timeout_ms) = request.timeout_ms {
            req = req.timeout(Duration::from_millis(timeout_ms));
        }

        let resp = req.send().await.map_err(classify)?;
        let status = resp.status();
        let headers = resp.headers().clone();

        if request.stream {
            let stream = resp.bytes_stream().map_err(classify);
            Ok(HttpResponse {
                status,
                headers,
                body: HttpBody::Stream(Box::pin(stream)),
            })
        } else {
            let body = resp.bytes().await.map_err(classify)?;
            Ok(HttpResponse {
                status,
                headers,
                body: HttpBody::Full(body),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Content-Encoding
// ---------------------------------------------------------------------------

fn content_encoding_is(headers: &HeaderMap, encoding: &str) -> bool {
    headers
        .get(reqwest::header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case(encoding))
        .unwrap_or(false)
}

fn read_all(mut reader: impl std::io::Read, encoding: &str) -> Result<Bytes, HttpError> {
    let mut decompressed = Vec::new();
    reader
        .read_to_end(&mut decompressed)
        .map_err(|e| HttpError::Transport(format!("{encoding} decompression failed: {e}")))?;
    Ok(Bytes::from(decompressed))
}

/// Decompress a buffered body if Content-Encoding is gzip or deflate.
/// Strips Content-Encoding and Content-Length since the body size changed.
pub fn maybe_decompress(headers: &mut HeaderMap, body: Bytes) -> Result<Bytes, HttpError> {
    let result = if content_encoding_is(headers, "gzip") {
        read_all(GzDecoder::new(&body[..]), "gzip")?
    } else if content_encoding_is(headers, "deflate") {
        read_all(DeflateDecoder::new(&body[..]), "deflate")?
    } else {
        return Ok(body);
    };
    headers.remove(reqwest::header::CONTENT_ENCODING);
    headers.remove(reqwest::header::CONTENT_LENGTH);
    Ok(result)
}
