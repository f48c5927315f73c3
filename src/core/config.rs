//! Engine configuration.
//!
//! Deployments configure the engine at startup, either in code via the
//! builder methods or from a TOML document:
//!
//! ```
//! use ticket_automation::core::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     system_user_id = "automation"
//!     max_conditions_per_trigger = 16
//! "#).unwrap();
//!
//! assert_eq!(config.system_user_id, "automation");
//! assert_eq!(config.max_actions_per_trigger, 32);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::Identifier;

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Actor id reported for transitions performed by automation itself.
    /// Matched by the `__system` sentinel.
    pub system_user_id: String,

    /// Upper bound on leaf conditions in one trigger definition.
    pub max_conditions_per_trigger: usize,

    /// Upper bound on actions in one trigger definition.
    pub max_actions_per_trigger: usize,

    /// Compare title/content text ignoring case.
    pub case_insensitive_text: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_user_id: "system".to_string(),
            max_conditions_per_trigger: 64,
            max_actions_per_trigger: 32,
            case_insensitive_text: true,
        }
    }
}

impl EngineConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document. Missing keys keep their defaults;
    /// unknown keys are rejected.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML document.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Settings(e.to_string()))
    }

    /// Check values for consistency, reporting every problem at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.system_user_id.trim().is_empty() {
            errors.push("system_user_id must not be empty");
        }
        if self.max_conditions_per_trigger == 0 {
            errors.push("max_conditions_per_trigger must be greater than 0");
        }
        if self.max_actions_per_trigger == 0 {
            errors.push("max_actions_per_trigger must be greater than 0");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Settings(errors.join("; ")))
        }
    }

    /// The system actor as an identifier.
    #[must_use]
    pub fn system_user(&self) -> Identifier {
        Identifier::new(self.system_user_id.as_str())
    }

    /// Set the system actor id.
    #[must_use]
    pub fn with_system_user_id(mut self, id: impl Into<String>) -> Self {
        self.system_user_id = id.into();
        self
    }

    /// Set the condition limit per trigger.
    #[must_use]
    pub fn with_max_conditions(mut self, max: usize) -> Self {
        self.max_conditions_per_trigger = max;
        self
    }

    /// Set the action limit per trigger.
    #[must_use]
    pub fn with_max_actions(mut self, max: usize) -> Self {
        self.max_actions_per_trigger = max;
        self
    }

    /// Compare title/content text exactly.
    #[must_use]
    pub fn case_sensitive_text(mut self) -> Self {
        self.case_insensitive_text = false;
        self
    }
}
