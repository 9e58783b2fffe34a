// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use super::error::ConfigError;

/// Minimal document used when no config file is given.
pub const BUILTIN_CONFIG: &str = "chatrelay: v1\n";

/// Abstraction over where config YAML comes from.
pub trait ConfigSource {
    fn load(&self) -> Result<String, ConfigError>;

    /// Human-readable origin for startup logs.
    fn describe(&self) -> String;
}

/// Loads config from a file on disk.
pub struct FileSource {
    pub path: PathBuf,
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Provides config content directly. Used for the built-in defaults and tests.
pub struct StringSource {
    pub content: String,
}

impl StringSource {
    pub fn builtin() -> Self {
        Self {
            content: BUILTIN_CONFIG.to_string(),
        }
    }
}

impl ConfigSource for StringSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(self.content.clone())
    }

    fn describe(&self) -> String {
        if self.content == BUILTIN_CONFIG {
            "<builtin>".to_string()
        } else {
            "<inline>".to_string()
        }
    }
}
