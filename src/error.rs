//! Error types.
//!
//! Two failure classes exist:
//!
//! - [`ConfigError`]: a trigger definition is malformed. Raised while
//!   parsing, before the definition is activated.
//! - [`EvaluationError`]: a condition broke its purity contract while
//!   being evaluated. Isolated to the trigger that owns it.
//!
//! A field missing from a ticket is neither; it reads as
//! `Identifier::UNKNOWN`.

use thiserror::Error;

use crate::core::TriggerId;

/// A trigger definition that cannot be activated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown condition field `{field}`")]
    UnknownField { field: String },

    #[error("unknown op `{op}` for field `{field}`")]
    UnknownOperator { field: String, op: String },

    #[error("op `{op}` is not supported by field `{field}`")]
    UnsupportedOperator { field: String, op: String },

    #[error("malformed condition for field `{field}`: {reason}")]
    MalformedSpec { field: String, reason: String },

    #[error("invalid value `{value}` for `{field}` {op}: {reason}")]
    InvalidValue {
        field: String,
        op: String,
        value: String,
        reason: String,
    },

    #[error("`{kind}` group must contain at least one condition")]
    EmptyGroup { kind: String },

    #[error("trigger `{trigger}` has {count} conditions, the limit is {max}")]
    TooManyConditions { trigger: String, count: usize, max: usize },

    #[error("trigger `{trigger}` has {count} actions, the limit is {max}")]
    TooManyActions { trigger: String, count: usize, max: usize },

    #[error("trigger `{trigger}` does not listen to any event")]
    NoEvents { trigger: String },

    #[error("unknown action `{action}`")]
    UnknownAction { action: String },

    #[error("invalid `{action}` action: {reason}")]
    InvalidAction { action: String, reason: String },

    #[error("condition field name must not be empty")]
    EmptyFieldName,

    #[error("condition field `{field}` has no operators")]
    EmptyField { field: String },

    #[error("condition field `{field}` is already registered")]
    DuplicateField { field: String },

    #[error("{id} is already installed")]
    DuplicateTrigger { id: TriggerId },
}

/// A failure while evaluating an already-parsed trigger.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("condition in trigger `{trigger}` panicked: {message}")]
    ContractViolation { trigger: String, message: String },
}

/// Rejection of a declarative value by a condition factory.
///
/// Factories do not know which field they serve; the parser wraps this
/// into [`ConfigError::InvalidValue`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct ValueError {
    pub reason: String,
}

impl ValueError {
    /// Create a new value error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("invalid engine settings: {0}")]
    Settings(String),

    #[error("failed to parse engine settings: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("malformed trigger definition: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
