//! Conditions and condition factories.
//!
//! A [`Condition`] is a named, pure predicate over a [`TriggerContext`].
//! Conditions are built once from declarative input by a
//! [`ConditionFactory`] and then reused for every evaluation; they hold no
//! reference to any particular ticket.
//!
//! Each condition field (`authorId`, `status`, ...) maps [`Operator`]s to
//! factories in a [`FieldFactories`] table. Negated operators are derived
//! with [`not`] rather than written by hand:
//!
//! ```
//! use ticket_automation::core::{Identifier, TicketSnapshot};
//! use ticket_automation::triggers::{factory, not, Condition, TicketEvent, TriggerContext};
//!
//! let is = factory(|value| {
//!     let expected = Identifier::new(value);
//!     Ok(Condition::new(format!("author is {value}"), move |ctx| ctx.author_id() == &expected))
//! });
//! let is_not = not(is.clone());
//!
//! let ticket = TicketSnapshot::new("t1").with_author("u1");
//! let actor = Identifier::new("u1");
//! let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);
//!
//! assert!(is("u1").unwrap().test(&ctx));
//! assert!(!is_not("u1").unwrap().test(&ctx));
//! assert_eq!(is_not("u1").unwrap().name(), "not author is u1");
//! ```

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::ValueError;

use super::context::TriggerContext;

/// Predicate signature shared by all conditions.
pub type Predicate = dyn Fn(&TriggerContext<'_>) -> bool + Send + Sync;

/// Builds a condition from a declarative value.
pub type ConditionFactory = Arc<dyn Fn(&str) -> Result<Condition, ValueError> + Send + Sync>;

/// A named, pure predicate over a trigger context.
///
/// `test` must be total and side-effect free: no I/O, no mutation, no
/// panics. A panic is treated as a contract violation by the evaluator.
#[derive(Clone)]
pub struct Condition {
    name: Arc<str>,
    test: Arc<Predicate>,
}

impl Condition {
    /// Create a condition from a name and a predicate.
    pub fn new<F>(name: impl Into<String>, test: F) -> Self
    where
        F: Fn(&TriggerContext<'_>) -> bool + Send + Sync + 'static,
    {
        let test: Arc<Predicate> = Arc::new(test);
        Self {
            name: Arc::from(name.into()),
            test,
        }
    }

    /// A condition that always holds.
    #[must_use]
    pub fn always() -> Self {
        Self::new("always", |_| true)
    }

    /// A condition that never holds.
    #[must_use]
    pub fn never() -> Self {
        Self::new("never", |_| false)
    }

    /// Human-readable name, for logs and debugging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate against a context.
    #[must_use]
    pub fn test(&self, ctx: &TriggerContext<'_>) -> bool {
        (self.test)(ctx)
    }

    /// Logical negation, named `not <name>`.
    #[must_use]
    pub fn negate(&self) -> Self {
        let inner = self.clone();
        Self::new(format!("not {}", self.name), move |ctx| !inner.test(ctx))
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// All conditions must hold. Vacuously true when empty.
pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    let conditions: Arc<[Condition]> = conditions.into_iter().collect();
    let name = format!("all of ({})", joined_names(&conditions));
    Condition::new(name, move |ctx| conditions.iter().all(|c| c.test(ctx)))
}

/// At least one condition must hold. False when empty.
pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    let conditions: Arc<[Condition]> = conditions.into_iter().collect();
    let name = format!("any of ({})", joined_names(&conditions));
    Condition::new(name, move |ctx| conditions.iter().any(|c| c.test(ctx)))
}

fn joined_names(conditions: &[Condition]) -> String {
    conditions
        .iter()
        .map(Condition::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Wrap a closure as a [`ConditionFactory`].
pub fn factory<F>(build: F) -> ConditionFactory
where
    F: Fn(&str) -> Result<Condition, ValueError> + Send + Sync + 'static,
{
    Arc::new(build)
}

/// Negate every condition a factory produces.
///
/// Composes like any other factory: `not(not(f))` builds conditions that
/// agree with `f` on every context.
pub fn not(inner: ConditionFactory) -> ConditionFactory {
    Arc::new(move |value: &str| inner(value).map(|condition| condition.negate()))
}

/// Operator tag of a declarative condition.
///
/// Unknown operator strings never become an `Operator`, so every table
/// lookup is over a closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Is,
    IsNot,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
}

impl Operator {
    /// All operators.
    pub const ALL: [Operator; 6] = [
        Operator::Is,
        Operator::IsNot,
        Operator::Contains,
        Operator::NotContains,
        Operator::StartsWith,
        Operator::EndsWith,
    ];

    /// Declarative name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "isNot",
            Operator::Contains => "contains",
            Operator::NotContains => "notContains",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
        }
    }

    /// Parse a declarative name.
    #[must_use]
    pub fn parse(op: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.as_str() == op)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Factory table of one condition field.
#[derive(Clone, Default)]
pub struct FieldFactories {
    table: FxHashMap<Operator, ConditionFactory>,
}

impl FieldFactories {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator (builder pattern).
    #[must_use]
    pub fn with(mut self, op: Operator, factory: ConditionFactory) -> Self {
        self.insert(op, factory);
        self
    }

    /// Add `op` and its negation `negated_op` from a single factory.
    #[must_use]
    pub fn with_negated(self, op: Operator, negated_op: Operator, factory: ConditionFactory) -> Self {
        let negated = not(factory.clone());
        self.with(op, factory).with(negated_op, negated)
    }

    /// Add or replace an operator.
    pub fn insert(&mut self, op: Operator, factory: ConditionFactory) {
        self.table.insert(op, factory);
    }

    /// Look up the factory for an operator.
    #[must_use]
    pub fn get(&self, op: Operator) -> Option<&ConditionFactory> {
        self.table.get(&op)
    }

    /// Supported operators, in declaration order of [`Operator::ALL`].
    #[must_use]
    pub fn operators(&self) -> Vec<Operator> {
        Operator::ALL
            .into_iter()
            .filter(|op| self.table.contains_key(op))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for FieldFactories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldFactories")
            .field("operators", &self.operators())
            .finish()
    }
}
