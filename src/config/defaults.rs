// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Built-in defaults, used for every field the YAML omits.

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable consulted when `upstream.api_key` is omitted.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Fallback for `upstream.referer`.
pub const APP_URL_ENV: &str = "APP_URL";

/// Fallback for `server.allowed_origins`, comma-separated.
pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";

pub const DEFAULT_REFERER: &str = "http://localhost:3000";
pub const DEFAULT_TITLE: &str = "AgriOrbit";
pub const DEFAULT_TIMEOUT_MS: u64 = 90_000;

pub const DEFAULT_MODEL: &str = "opengvlab/internvl3-2b:free";
pub const ADVANCED_MODEL: &str = "google/gemini-2.0-flash-exp:free";
pub const FALLBACK_MODEL: &str = "meta-llama/llama-3.2-3b-instruct:free";
pub const ADVANCED_THRESHOLD_CHARS: usize = 200;

// Kept under the provider limit to avoid truncated replies.
pub const MAX_TOKENS: u32 = 1800;
pub const TEMPERATURE: f32 = 0.7;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

pub const BASE_PROMPT: &str = "You are AgriBot, a helpful assistant specialized in agricultural \
advice and data interpretation. Provide insightful and actionable farming recommendations based \
on location data, soil conditions, and agricultural metrics.";

pub const GENERAL_PROMPT: &str = "Provide general farming information and encourage the user to \
select a farm location on the map for more tailored advice. Explain the benefits of \
location-specific agricultural insights.";

pub const FARM_SELECTED_PROMPT: &str = "The user has selected a farm location. Analyze this \
geographical context to provide location-specific agricultural insights such as suitable crops, \
regional climate patterns, and local best practices. When specific values are provided (like \
NDVI, soil moisture, etc.), interpret them in practical terms for the farmer.";

pub const DATA_LOADED_PROMPT: &str = "The user has loaded farm data. Analyze the provided metrics \
and offer meaningful interpretations. For example, explain what the values mean for crop health, \
soil conditions, or irrigation needs. Translate technical data into practical farming advice. If \
coordinates are provided, consider regional agricultural patterns for that location.";
