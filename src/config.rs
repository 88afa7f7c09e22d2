//! Reader configuration.

use crate::error::{FlagError, Result};
use crate::types::DEFAULT_OVERRIDE_PREFIX;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Flag reader configuration.
///
/// Only `namespace` is required when deserializing:
///
/// ```json
/// { "namespace": "systemui" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Store namespace the reader is bound to.
    pub namespace: String,

    /// Prefix of override keys.
    /// Default: `flag_override_`
    #[serde(default = "default_override_prefix")]
    pub override_prefix: String,

    /// Catch panics from individual listeners so the rest of a dispatch
    /// still runs.
    /// Default: true
    #[serde(default = "default_isolate_listener_panics")]
    pub isolate_listener_panics: bool,
}

fn default_override_prefix() -> String {
    DEFAULT_OVERRIDE_PREFIX.to_string()
}

fn default_isolate_listener_panics() -> bool {
    true
}

impl ReaderConfig {
    /// Config with defaults for everything but the namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            override_prefix: default_override_prefix(),
            isolate_listener_panics: default_isolate_listener_panics(),
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(FlagError::InvalidNamespace(self.namespace.clone()));
        }
        if self.override_prefix.is_empty() {
            return Err(FlagError::Config(
                "override_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
