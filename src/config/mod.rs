// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Config loader and validator
//
// Loads chatrelay.yaml, resolves variable interpolation, fills defaults,
// validates values, and computes a config hash for startup logs.

mod defaults;
mod error;
mod interpolation;
mod loader;
mod raw;
mod source;
mod types;

pub use defaults::{ALLOWED_ORIGINS_ENV, API_KEY_ENV, APP_URL_ENV};
pub use error::ConfigError;
pub use loader::{compute_hash, load_config};
pub use source::{ConfigSource, FileSource, StringSource, BUILTIN_CONFIG};
pub use types::{
    Config, GenerationConfig, ModelConfig, PromptConfig, ServerConfig, UpstreamConfig,
};

impl Config {
    /// Built-in defaults, with the API key taken from the environment.
    pub fn builtin() -> Result<Config, ConfigError> {
        load_config(&StringSource::builtin())
    }
}
