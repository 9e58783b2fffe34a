// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Upstream wire types
//
// Typed views of the OpenAI-compatible chat completion contract:
// - Outbound request body
// - Non-streaming completion object
// - Streaming delta chunk
//
// Every nested response field is optional. Accessors return `None` for
// absent paths instead of falling back to placeholder values.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outbound request
// ---------------------------------------------------------------------------

/// The role of a message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in the outbound conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of `POST {base_url}/chat/completions`.
///
/// `models` is the OpenRouter fallback list: the provider tries each in
/// order if the previous one is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub models: Vec<String>,
    pub messages: Vec<WireMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

// ---------------------------------------------------------------------------
// Non-streaming response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionMessage>,
}

/// Error object some providers return with a 200 status.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProviderErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// A full (non-streaming) chat completion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChatCompletionResponse {
    /// The model that actually served the request (may be a fallback).
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub error: Option<ProviderErrorBody>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`, if present.
    pub fn reply_text(&self) -> Option<&str> {
        self.choices
            .first()?
            .message
            .as_ref()?
            .content
            .as_deref()
    }
}

// ---------------------------------------------------------------------------
// Streaming delta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeltaChoice {
    #[serde(default)]
    pub delta: Option<Delta>,
}

/// One `data:` payload of a streaming completion.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeltaChunk {
    #[serde(default)]
    pub choices: Vec<DeltaChoice>,
}

impl DeltaChunk {
    /// `choices[0].delta.content`, if present.
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.as_ref()?.content.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_lowercase_roles() {
        let req = ChatCompletionRequest {
            model: "m1".to_string(),
            models: vec!["m1".to_string(), "m2".to_string()],
            messages: vec![WireMessage::system("be brief"), WireMessage::user("hi")],
            max_tokens: 1800,
            temperature: 0.5,
            stream: true,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "m1");
        assert_eq!(json["models"][1], "m2");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
        assert_eq!(json["max_tokens"], 1800);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn delta_content_present() {
        let chunk: DeltaChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"hi"}}]}"#).unwrap();
        assert_eq!(chunk.content(), Some("hi"));
    }

    #[test]
    fn delta_content_absent_paths_are_none() {
        for payload in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"delta":{}}]}"#,
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":null}}]}"#,
        ] {
            let chunk: DeltaChunk = serde_json::from_str(payload).unwrap();
            assert_eq!(chunk.content(), None, "payload: {payload}");
        }
    }

    #[test]
    fn delta_ignores_unknown_fields() {
        let chunk: DeltaChunk = serde_json::from_str(
            r#"{"id":"gen-1","model":"x","choices":[{"index":0,"delta":{"content":"a"},"finish_reason":null}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.content(), Some("a"));
    }

    #[test]
    fn completion_reply_text() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"model":"m2","choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(resp.reply_text(), Some("hello"));
        assert_eq!(resp.model.as_deref(), Some("m2"));
        assert!(resp.error.is_none());
    }

    #[test]
    fn completion_error_object() {
        let resp: ChatCompletionResponse =
            serde_json::from_str(r#"{"error":{"message":"rate limited","code":429}}"#).unwrap();
        assert!(resp.choices.is_empty());
        assert_eq!(
            resp.error.and_then(|e| e.message).as_deref(),
            Some("rate limited")
        );
    }

    #[test]
    fn completion_without_choices_has_no_reply() {
        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert_eq!(resp.reply_text(), None);
    }
}
