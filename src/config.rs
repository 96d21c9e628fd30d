//! Tunables for the orchestrator and judge pipeline.
//!
//! Defaults match the behavior the rest of the crate is tested against;
//! a TOML file can override individual fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Crate-wide tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// How many trailing nodes feed the prompt context window.
    pub context_window_nodes: usize,
    /// Per-node character cap when rendering context.
    pub context_preview_chars: usize,
    /// Hard cap on claims submitted for verification.
    pub max_verified_claims: usize,
    /// Character cap on each argument when building judge prompts.
    pub argument_preview_chars: usize,
    /// Character cap on each serialized scrape report in digests.
    pub evidence_preview_chars: usize,
    /// Judge nodes required on the live sequence before a verdict can
    /// finalize (unless the round threshold is met instead).
    pub finalize_min_judge_nodes: usize,
    /// Round count at which a verdict finalizes regardless of judge-node
    /// count.
    pub finalize_min_rounds: u32,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            context_window_nodes: 4,
            context_preview_chars: 300,
            max_verified_claims: 5,
            argument_preview_chars: 500,
            evidence_preview_chars: 300,
            finalize_min_judge_nodes: 2,
            finalize_min_rounds: 2,
        }
    }
}

impl ArbiterConfig {
    /// Load from a TOML file; missing fields fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}
