//! Comparator configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Configuration for the [`Comparator`](crate::Comparator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparatorConfig {
    /// Field paths never compared (volatile fields such as extraction
    /// timestamps). Top-level names or dotted nested paths.
    #[serde(default)]
    pub ignore_fields: BTreeSet<String>,

    /// Recurse into nested maps
    /// Default: true
    #[serde(default = "default_deep_compare")]
    pub deep_compare: bool,

    /// Minimum field-equality ratio for two documents to count as overlapping
    /// (0.0-1.0). Default: 0.9
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Nesting depth beyond which nested maps are reported without detail
    /// Default: 32
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_deep_compare() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.9
}

fn default_max_depth() -> usize {
    32
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            ignore_fields: BTreeSet::new(),
            deep_compare: default_deep_compare(),
            similarity_threshold: default_similarity_threshold(),
            max_depth: default_max_depth(),
        }
    }
}

impl ComparatorConfig {
    /// Top-level comparison only; nested maps are reported as a single change
    pub fn shallow() -> Self {
        Self {
            deep_compare: false,
            ..Self::default()
        }
    }

    /// Deep comparison with a higher similarity bar for overlaps
    pub fn strict() -> Self {
        Self {
            ignore_fields: BTreeSet::new(),
            deep_compare: true,
            similarity_threshold: 0.95,
            max_depth: 64,
        }
    }

    /// Skip a field path
    pub fn ignore(mut self, field: impl Into<String>) -> Self {
        self.ignore_fields.insert(field.into());
        self
    }

    /// Whether a field path is ignored
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_fields.contains(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(format!(
                "similarity_threshold must be between 0.0 and 1.0, got {}",
                self.similarity_threshold
            ));
        }
        if self.deep_compare && self.max_depth == 0 {
            return Err("max_depth must be greater than 0 when deep_compare is on".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
