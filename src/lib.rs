//! # ticket-automation
//!
//! Trigger automation engine for a ticketing system.
//!
//! Operators author triggers declaratively: the ticket transitions a
//! trigger listens for, a list of field conditions such as
//! `assigneeId is __unassigned`, and the actions to run when every
//! condition holds. The engine validates definitions once, at load time,
//! and evaluates them against every ticket transition.
//!
//! ## Design Principles
//!
//! 1. **Validate at load**: unknown fields, operators and malformed values
//!    are rejected when a trigger is parsed, never during evaluation.
//!
//! 2. **Pure evaluation**: conditions read an immutable snapshot of the
//!    transition. They never do I/O and never mutate the ticket.
//!
//! 3. **Extensible fields**: the condition library is a registry; new
//!    fields plug in without touching the parser or evaluator.
//!
//! ## Modules
//!
//! - `core`: identifiers, ticket snapshots, engine configuration
//! - `error`: configuration and evaluation errors
//! - `triggers`: context, conditions, registry, evaluator, trigger set
//! - `actions`: action parsing and application to snapshots
//! - `engine`: the [`AutomationEngine`] facade

pub mod core;
pub mod error;
pub mod triggers;
pub mod actions;
pub mod engine;

// Re-export commonly used types
pub use crate::core::{EngineConfig, Identifier, Tag, TicketSnapshot, TicketStatus, TriggerId};

pub use crate::error::{ConfigError, Error, EvaluationError, Result, ValueError};

pub use crate::triggers::{
    Condition, ConditionNode, ConditionRegistry, ConditionSpec, CustomerServiceRoster,
    FieldFactories, FiredTrigger, Operator, ParsedTrigger, RoleAuthority, TicketEvent,
    TriggerContext, TriggerDefinition, TriggerEvaluator, TriggerSet,
};

pub use crate::actions::{Action, ActionApplier, ActionParser, ActionSpec};

pub use crate::engine::AutomationEngine;
