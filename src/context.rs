// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

// Conversation context
//
// Maps the inbound context type to a model choice, an OpenRouter
// fallback chain and a system prompt. Model ids and prompt text come
// from configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, PromptConfig};

/// What the user has loaded in the frontend when asking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    FarmSelected,
    DataLoaded,
    /// Also the fallback for unrecognized values.
    #[default]
    #[serde(other)]
    General,
}

impl ContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::General => "general",
            ContextType::FarmSelected => "farm_selected",
            ContextType::DataLoaded => "data_loaded",
        }
    }
}

/// Pick the model for a query.
///
/// Data analysis and long questions go to the advanced model; everything
/// else goes to the default model. Length is counted in characters.
pub fn select_model<'a>(text: &str, context: ContextType, models: &'a ModelConfig) -> &'a str {
    if context == ContextType::DataLoaded
        || text.chars().count() > models.advanced_threshold_chars
    {
        &models.advanced
    } else {
        &models.default
    }
}

/// Models to offer the provider, in preference order.
pub fn fallback_chain(selected: &str, models: &ModelConfig) -> Vec<String> {
    let mut chain = vec![selected.to_string()];
    if models.fallback != selected {
        chain.push(models.fallback.clone());
    }
    chain
}

/// Build the system prompt for a context type.
pub fn system_prompt(context: ContextType, prompts: &PromptConfig) -> String {
    let suffix = match context {
        ContextType::General => &prompts.general,
        ContextType::FarmSelected => &prompts.farm_selected,
        ContextType::DataLoaded => &prompts.data_loaded,
    };
    if suffix.is_empty() {
        prompts.base.clone()
    } else {
        format!("{} {}", prompts.base, suffix)
    }
}
