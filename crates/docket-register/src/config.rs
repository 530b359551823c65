//! Configuration for the register
//!
//! Controls naming used in exports, audit log retention and batch
//! concurrency.

use serde::{Deserialize, Serialize};

/// Configuration for a [`VersionedRegister`](crate::VersionedRegister)
///
/// # Examples
///
/// ```
/// use docket_register::RegisterConfig;
///
/// // Unbounded audit log, 8 adapter calls in flight
/// let config = RegisterConfig::default();
/// assert_eq!(config.max_concurrency, 8);
///
/// // Keep only the latest 1000 audit records
/// let config = RegisterConfig::bounded_audit(1000);
/// assert_eq!(config.audit_capacity, Some(1000));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterConfig {
    /// Name written into exports
    /// Default: "docket"
    #[serde(default = "default_register_name")]
    pub register_name: String,

    /// Schema identifier written into exports
    #[serde(default)]
    pub schema_id: Option<String>,

    /// Maximum retained audit records; older records are dropped
    /// Default: unbounded
    #[serde(default)]
    pub audit_capacity: Option<usize>,

    /// Maximum adapter operations in flight for batch helpers
    /// Default: 8
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Page size used by `list` when the caller gives no limit
    /// Default: 50
    #[serde(default = "default_page_limit")]
    pub default_page_limit: usize,
}

fn default_register_name() -> String {
    "docket".to_string()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_page_limit() -> usize {
    50
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            register_name: default_register_name(),
            schema_id: None,
            audit_capacity: None,
            max_concurrency: default_max_concurrency(),
            default_page_limit: default_page_limit(),
        }
    }
}

impl RegisterConfig {
    /// Default configuration with a bounded audit log
    ///
    /// Trimming is lossy: records beyond `capacity` are discarded oldest
    /// first and cannot be queried or exported afterwards.
    pub fn bounded_audit(capacity: usize) -> Self {
        Self {
            audit_capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Default configuration with batch helpers running one call at a time
    pub fn sequential() -> Self {
        Self {
            max_concurrency: 1,
            ..Self::default()
        }
    }

    /// Set the register name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.register_name = name.into();
        self
    }

    /// Set the schema identifier
    pub fn with_schema_id(mut self, schema_id: impl Into<String>) -> Self {
        self.schema_id = Some(schema_id.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.register_name.trim().is_empty() {
            return Err("register_name must not be empty".to_string());
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        if self.default_page_limit == 0 {
            return Err("default_page_limit must be greater than 0".to_string());
        }
        if self.audit_capacity == Some(0) {
            return Err("audit_capacity must be greater than 0 when set".to_string());
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
