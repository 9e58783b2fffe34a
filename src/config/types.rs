// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Parsed and validated relay configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub models: ModelConfig,
    pub generation: GenerationConfig,
    pub prompts: PromptConfig,
    pub server: ServerConfig,
    /// SHA256 of the raw YAML: "sha256:{hex}".
    pub config_hash: String,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Where and how to reach the chat-completion provider.
#[derive(Clone, PartialEq)]
pub struct UpstreamConfig {
    /// API root, e.g. `https://openrouter.ai/api/v1`. No trailing slash.
    pub base_url: String,
    /// Bearer token. `None` disables chat (every request gets a 500).
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer` (OpenRouter app attribution).
    pub referer: Option<String>,
    /// Sent as `X-Title` (OpenRouter app attribution).
    pub title: Option<String>,
    /// Ceiling for the whole upstream request, streaming included.
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// Keeps the API key out of logs.
impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// Model ids used by model selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Efficient model for most queries.
    pub default: String,
    /// Higher capacity model for data analysis and long queries.
    pub advanced: String,
    /// Offered to the provider after the selected model.
    pub fallback: String,
    /// Queries longer than this many characters use the advanced model.
    pub advanced_threshold_chars: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// System prompt text: `base` followed by the suffix for the context type.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptConfig {
    pub base: String,
    pub general: String,
    pub farm_selected: String,
    pub data_loaded: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}
