//! Trigger conditions and evaluation.
//!
//! Triggers let operators automate ticket handling: "when a ticket is
//! created by a customer and nobody is assigned, assign it to cs1".
//!
//! ## Key Components
//!
//! - [`TriggerContext`]: read-only view of one ticket transition
//! - [`Condition`]: named predicate over a context
//! - [`FieldFactories`]: per-field table from [`Operator`] to condition factory
//! - [`ConditionRegistry`]: turns declarative specs into conditions
//! - [`TriggerEvaluator`]: checks that every condition of a trigger holds
//! - [`TriggerSet`]: installed triggers, indexed by [`TicketEvent`]
//!
//! ## Parse once, evaluate often
//!
//! Definitions are validated when they are loaded. Unknown fields,
//! unknown operators and malformed values are configuration errors at
//! that point; evaluation itself never fails on configuration.
//!
//! ```
//! use ticket_automation::core::{EngineConfig, Identifier, TicketSnapshot};
//! use ticket_automation::triggers::{ConditionRegistry, ConditionSpec, TicketEvent, TriggerContext};
//!
//! let registry = ConditionRegistry::with_builtin_fields(&EngineConfig::default());
//! let unassigned = registry
//!     .parse("assigneeId", &ConditionSpec::new("is", "__unassigned"))
//!     .unwrap();
//!
//! let ticket = TicketSnapshot::new("t1").with_author("u1");
//! let actor = Identifier::new("u1");
//! let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);
//! assert!(unassigned.test(&ctx));
//! ```

mod condition;
mod context;
mod evaluator;
mod event;
pub mod fields;
mod parser;
mod registry;

pub use condition::{
    all, any, factory, not, Condition, ConditionFactory, FieldFactories, Operator, Predicate,
};
pub use context::{CustomerServiceRoster, NoRoles, RoleAuthority, TriggerContext};
pub use evaluator::TriggerEvaluator;
pub use event::TicketEvent;
pub use parser::{ConditionNode, ConditionRegistry, ConditionSpec, GroupKind};
pub use registry::{FiredTrigger, ParsedTrigger, TriggerDefinition, TriggerSet};
