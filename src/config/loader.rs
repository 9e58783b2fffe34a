// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

use sha2::{Digest, Sha256};

use super::defaults::*;
use super::error::ConfigError;
use super::interpolation::resolve_with;
use super::raw;
use super::source::ConfigSource;
use super::types::*;

/// Load and validate relay config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source and hash it
/// 2. Parse into raw types
/// 3. Resolve `${VAR}` references in string fields
/// 4. Fill omitted fields from the environment or built-in defaults
/// 5. Validate
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    build_config(&raw_yaml, &|name| std::env::var(name).ok())
}

fn split_origins(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
}

pub(crate) fn build_config(
    raw_yaml: &str,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let config_hash = compute_hash(raw_yaml);
    let raw: raw::RawConfig = serde_yaml::from_str(raw_yaml)?;

    if raw.chatrelay != "v1" {
        return Err(ConfigError::Validation(format!(
            "unsupported config version \"{}\", expected \"v1\"",
            raw.chatrelay
        )));
    }

    let resolve = |value: Option<String>| -> Result<Option<String>, ConfigError> {
        value.map(|v| resolve_with(&v, env)).transpose()
    };

    let upstream = {
        let u = raw.upstream.unwrap_or_default();
        let base_url = resolve(u.base_url)?.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = match resolve(u.api_key)? {
            Some(key) => Some(key),
            None => env(API_KEY_ENV),
        }
        .filter(|key| !key.trim().is_empty());

        UpstreamConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            referer: resolve(u.referer)?
                .or_else(|| env(APP_URL_ENV))
                .or_else(|| Some(DEFAULT_REFERER.to_string()))
                .filter(|s| !s.is_empty()),
            title: resolve(u.title)?
                .or_else(|| Some(DEFAULT_TITLE.to_string()))
                .filter(|s| !s.is_empty()),
            timeout_ms: u.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        }
    };

    let models = {
        let m = raw.models.unwrap_or_default();
        ModelConfig {
            default: resolve(m.default)?.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            advanced: resolve(m.advanced)?.unwrap_or_else(|| ADVANCED_MODEL.to_string()),
            fallback: resolve(m.fallback)?.unwrap_or_else(|| FALLBACK_MODEL.to_string()),
            advanced_threshold_chars: m
                .advanced_threshold_chars
                .unwrap_or(ADVANCED_THRESHOLD_CHARS),
        }
    };

    let generation = {
        let g = raw.generation.unwrap_or_default();
        GenerationConfig {
            max_tokens: g.max_tokens.unwrap_or(MAX_TOKENS),
            temperature: g.temperature.unwrap_or(TEMPERATURE),
        }
    };

    let prompts = {
        let p = raw.prompts.unwrap_or_default();
        PromptConfig {
            base: resolve(p.base)?.unwrap_or_else(|| BASE_PROMPT.to_string()),
            general: resolve(p.general)?.unwrap_or_else(|| GENERAL_PROMPT.to_string()),
            farm_selected: resolve(p.farm_selected)?
                .unwrap_or_else(|| FARM_SELECTED_PROMPT.to_string()),
            data_loaded: resolve(p.data_loaded)?
                .unwrap_or_else(|| DATA_LOADED_PROMPT.to_string()),
        }
    };

    let server = {
        let s = raw.server.unwrap_or_default();
        let allowed_origins = match s.allowed_origins {
            Some(entries) => {
                // An entry may hold a comma-separated list, e.g. from ${ALLOWED_ORIGINS}.
                let mut origins = Vec::new();
                for entry in entries {
                    origins.extend(split_origins(&resolve_with(&entry, env)?));
                }
                origins
            }
            // Environment values are taken literally, never interpolated.
            None => match env(ALLOWED_ORIGINS_ENV) {
                Some(list) => split_origins(&list).collect(),
                None => vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
            },
        };
        ServerConfig { allowed_origins }
    };

    let config = Config {
        upstream,
        models,
        generation,
        prompts,
        server,
        config_hash,
    };
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    let base_url = &config.upstream.base_url;
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::Validation(format!(
            "upstream.base_url must start with http:// or https://, got \"{base_url}\""
        )));
    }
    if config.upstream.timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "upstream.timeout_ms must be greater than 0".to_string(),
        ));
    }

    for (field, value) in [
        ("models.default", &config.models.default),
        ("models.advanced", &config.models.advanced),
        ("models.fallback", &config.models.fallback),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} must not be empty")));
        }
    }

    if config.generation.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "generation.max_tokens must be greater than 0".to_string(),
        ));
    }
    let temperature = config.generation.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::Validation(format!(
            "generation.temperature must be within [0, 2], got {temperature}"
        )));
    }

    Ok(())
}

pub fn compute_hash(raw_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_yaml.as_bytes());
    format!("sha256:{:x}", hasher.finalize())
}
