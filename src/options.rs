//! Run configuration

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Controls generated-name length bounds and the string-encryption profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObfuscationLevel {
    Low,
    Medium,
    High,
}

impl ObfuscationLevel {
    /// Inclusive bounds for generated identifier lengths.
    pub fn name_length_range(self) -> (usize, usize) {
        match self {
            ObfuscationLevel::Low => (6, 10),
            ObfuscationLevel::Medium => (10, 19),
            ObfuscationLevel::High => (20, 34),
        }
    }
}

/// Configuration record consumed uniformly by all passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObfuscationOptions {
    pub rename_variables: bool,
    pub encrypt_strings: bool,
    pub level: ObfuscationLevel,
}

impl Default for ObfuscationOptions {
    fn default() -> Self {
        Self {
            rename_variables: true,
            encrypt_strings: true,
            level: ObfuscationLevel::Medium,
        }
    }
}

impl ObfuscationOptions {
    /// Load options from a JSON document, with defaults for missing fields.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
