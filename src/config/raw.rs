// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Raw YAML deserialization types (internal)
//
// Every section and field is optional here. Defaults and variable
// interpolation are applied when building the public `Config`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RawConfig {
    pub chatrelay: String,
    pub upstream: Option<RawUpstream>,
    pub models: Option<RawModels>,
    pub generation: Option<RawGeneration>,
    pub prompts: Option<RawPrompts>,
    pub server: Option<RawServer>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUpstream {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawModels {
    pub default: Option<String>,
    pub advanced: Option<String>,
    pub fallback: Option<String>,
    pub advanced_threshold_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawGeneration {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPrompts {
    pub base: Option<String>,
    pub general: Option<String>,
    pub farm_selected: Option<String>,
    pub data_loaded: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawServer {
    pub allowed_origins: Option<Vec<String>>,
}
