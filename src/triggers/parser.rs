//! Condition registry and parser.
//!
//! Turns declarative condition specs into [`Condition`]s. Parsing happens
//! once, when a trigger definition is loaded or saved; a malformed spec is
//! a configuration error raised right there, never deferred to
//! evaluation.
//!
//! A spec goes through three checks, in order:
//!
//! 1. shape: `op` is a non-empty string and `value` is a string
//! 2. operator: `op` names a known [`Operator`] (`UnknownOperator`
//!    otherwise) that the field supports (`UnsupportedOperator`)
//! 3. value: the field's factory accepts the value (`InvalidValue`)
//!
//! ```
//! use ticket_automation::core::EngineConfig;
//! use ticket_automation::error::ConfigError;
//! use ticket_automation::triggers::{ConditionRegistry, ConditionSpec};
//!
//! let registry = ConditionRegistry::with_builtin_fields(&EngineConfig::default());
//!
//! let condition = registry.parse("authorId", &ConditionSpec::new("is", "__currentUser")).unwrap();
//! assert_eq!(condition.name(), "author is current user");
//!
//! let err = registry.parse("authorId", &ConditionSpec::new("matches", "x")).unwrap_err();
//! assert!(matches!(err, ConfigError::UnknownOperator { ref op, .. } if op == "matches"));
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::EngineConfig;
use crate::error::ConfigError;

use super::condition::{self, Condition, FieldFactories, Operator};
use super::fields;

/// Declarative form of a single field condition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    #[serde(default)]
    pub op: Value,
    #[serde(default)]
    pub value: Value,
}

impl ConditionSpec {
    /// Create a spec.
    pub fn new(op: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: Value::String(op.into()),
            value: value.into(),
        }
    }
}

/// How a condition group combines its members.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    All,
    Any,
}

impl GroupKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            GroupKind::All => "all",
            GroupKind::Any => "any",
        }
    }
}

/// A node of a declarative condition tree.
///
/// In JSON both shapes use a `type` key:
///
/// ```json
/// { "type": "any", "conditions": [
///     { "type": "authorId", "op": "is", "value": "__customerService" },
///     { "type": "status", "op": "is", "value": "closed" }
/// ] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    /// A nested `all` / `any` group.
    Group {
        #[serde(rename = "type")]
        kind: GroupKind,
        conditions: Vec<ConditionNode>,
    },
    /// A single field condition.
    Field {
        #[serde(rename = "type")]
        field: String,
        #[serde(flatten)]
        spec: ConditionSpec,
    },
}

impl ConditionNode {
    /// Create a field condition.
    pub fn field(field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field {
            field: field.into(),
            spec: ConditionSpec::new(op, value),
        }
    }

    /// Create an `all` group.
    pub fn all(conditions: impl IntoIterator<Item = ConditionNode>) -> Self {
        Self::Group {
            kind: GroupKind::All,
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Create an `any` group.
    pub fn any(conditions: impl IntoIterator<Item = ConditionNode>) -> Self {
        Self::Group {
            kind: GroupKind::Any,
            conditions: conditions.into_iter().collect(),
        }
    }

    /// Number of field conditions in this tree.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Group { conditions, .. } => conditions.iter().map(Self::leaf_count).sum(),
            Self::Field { .. } => 1,
        }
    }
}

/// Registry of condition fields and their factory tables.
#[derive(Clone, Debug, Default)]
pub struct ConditionRegistry {
    fields: FxHashMap<String, FieldFactories>,
}

impl ConditionRegistry {
    /// Create a registry with no fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in field.
    #[must_use]
    pub fn with_builtin_fields(config: &EngineConfig) -> Self {
        let fields = fields::builtin_fields(config)
            .into_iter()
            .map(|(name, factories)| (name.to_string(), factories))
            .collect();
        Self { fields }
    }

    /// Add a condition field.
    ///
    /// Rejects an empty name, an empty factory table, and a name that is
    /// already registered.
    pub fn register_field(
        &mut self,
        name: impl Into<String>,
        factories: FieldFactories,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName);
        }
        if factories.is_empty() {
            return Err(ConfigError::EmptyField { field: name });
        }
        if self.fields.contains_key(&name) {
            return Err(ConfigError::DuplicateField { field: name });
        }
        self.fields.insert(name, factories);
        Ok(())
    }

    /// Check whether a field is registered.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Operators a field supports, `None` for unknown fields.
    #[must_use]
    pub fn operators(&self, field: &str) -> Option<Vec<Operator>> {
        self.fields.get(field).map(FieldFactories::operators)
    }

    /// Registered field names, sorted.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Parse one field condition.
    pub fn parse(&self, field: &str, spec: &ConditionSpec) -> Result<Condition, ConfigError> {
        let op_name = match &spec.op {
            Value::String(op) if !op.is_empty() => op,
            other => {
                return Err(ConfigError::MalformedSpec {
                    field: field.to_string(),
                    reason: format!("op must be a non-empty string, got {other}"),
                })
            }
        };
        let Value::String(value) = &spec.value else {
            return Err(ConfigError::MalformedSpec {
                field: field.to_string(),
                reason: format!("value must be a string, got {}", spec.value),
            });
        };

        let factories = self
            .fields
            .get(field)
            .ok_or_else(|| ConfigError::UnknownField { field: field.to_string() })?;

        let op = Operator::parse(op_name).ok_or_else(|| ConfigError::UnknownOperator {
            field: field.to_string(),
            op: op_name.clone(),
        })?;

        let factory = factories
            .get(op)
            .ok_or_else(|| ConfigError::UnsupportedOperator {
                field: field.to_string(),
                op: op_name.clone(),
            })?;

        factory(value).map_err(|e| ConfigError::InvalidValue {
            field: field.to_string(),
            op: op_name.clone(),
            value: value.clone(),
            reason: e.reason,
        })
    }

    /// Parse a condition tree. Groups must not be empty.
    pub fn parse_node(&self, node: &ConditionNode) -> Result<Condition, ConfigError> {
        match node {
            ConditionNode::Field { field, spec } => self.parse(field, spec),
            ConditionNode::Group { kind, conditions } => {
                if conditions.is_empty() {
                    return Err(ConfigError::EmptyGroup {
                        kind: kind.as_str().to_string(),
                    });
                }
                let parsed = conditions
                    .iter()
                    .map(|c| self.parse_node(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(match kind {
                    GroupKind::All => condition::all(parsed),
                    GroupKind::Any => condition::any(parsed),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Identifier, TicketSnapshot, TicketStatus};
    use crate::triggers::condition::factory;
    use crate::triggers::context::TriggerContext;
    use crate::triggers::event::TicketEvent;
    use serde_json::json;

    fn registry() -> ConditionRegistry {
        ConditionRegistry::with_builtin_fields(&EngineConfig::default())
    }

    #[test]
    fn test_parse_builtin() {
        let registry = registry();
        let ticket = TicketSnapshot::new("t1").with_author("u1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        let condition = registry
            .parse("authorId", &ConditionSpec::new("is", "__currentUser"))
            .unwrap();
        assert!(condition.test(&ctx));
    }

    #[test]
    fn test_unknown_op_fails_for_every_field() {
        let registry = registry();
        for field in registry.field_names() {
            let err = registry
                .parse(field, &ConditionSpec::new("unknownOp", "x"))
                .unwrap_err();
            assert_eq!(
                err,
                ConfigError::UnknownOperator {
                    field: field.to_string(),
                    op: "unknownOp".to_string(),
                }
            );
        }
    }

    #[test]
    fn test_unsupported_op() {
        let err = registry()
            .parse("authorId", &ConditionSpec::new("contains", "u1"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedOperator { .. }));
    }

    #[test]
    fn test_unknown_field() {
        let err = registry()
            .parse("priority", &ConditionSpec::new("is", "high"))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownField { field: "priority".to_string() });
    }

    #[test]
    fn test_malformed_spec() {
        let registry = registry();

        let err = registry.parse("authorId", &ConditionSpec::new("", "u1")).unwrap_err();
        assert!(matches!(err, ConfigError::MalformedSpec { .. }));

        let err = registry.parse("authorId", &ConditionSpec::new("is", 42)).unwrap_err();
        match err {
            ConfigError::MalformedSpec { field, reason } => {
                assert_eq!(field, "authorId");
                assert!(reason.contains("42"));
            }
            other => panic!("expected MalformedSpec, got {other:?}"),
        }

        let err = registry
            .parse("authorId", &serde_json::from_value(json!({ "op": 123, "value": "x" })).unwrap())
            .unwrap_err();
        match err {
            ConfigError::MalformedSpec { field, reason } => {
                assert_eq!(field, "authorId");
                assert!(reason.contains("123"));
            }
            other => panic!("expected MalformedSpec, got {other:?}"),
        }

        let missing_value: ConditionSpec = serde_json::from_value(json!({ "op": "is" })).unwrap();
        assert!(matches!(
            registry.parse("authorId", &missing_value),
            Err(ConfigError::MalformedSpec { .. })
        ));
    }

    #[test]
    fn test_invalid_value() {
        let err = registry()
            .parse("status", &ConditionSpec::new("is", "open"))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { field, op, value, .. } => {
                assert_eq!(field, "status");
                assert_eq!(op, "is");
                assert_eq!(value, "open");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_register_field() {
        let mut registry = ConditionRegistry::new();
        let urgent = FieldFactories::new().with(
            Operator::Is,
            factory(|value| {
                let wanted = value == "true";
                Ok(Condition::new(format!("urgent is {value}"), move |ctx| {
                    (ctx.status() == TicketStatus::New) == wanted
                }))
            }),
        );

        registry.register_field("urgent", urgent.clone()).unwrap();
        assert!(registry.has_field("urgent"));
        assert_eq!(registry.operators("urgent"), Some(vec![Operator::Is]));

        assert_eq!(
            registry.register_field("urgent", urgent),
            Err(ConfigError::DuplicateField { field: "urgent".to_string() })
        );
        assert_eq!(
            registry.register_field("", FieldFactories::new()),
            Err(ConfigError::EmptyFieldName)
        );
        assert_eq!(
            registry.register_field("empty", FieldFactories::new()),
            Err(ConfigError::EmptyField { field: "empty".to_string() })
        );
    }

    #[test]
    fn test_node_from_json() {
        let node: ConditionNode = serde_json::from_value(json!({
            "type": "any",
            "conditions": [
                { "type": "authorId", "op": "is", "value": "__customerService" },
                { "type": "all", "conditions": [
                    { "type": "status", "op": "is", "value": "new" },
                    { "type": "title", "op": "contains", "value": "refund" }
                ] }
            ]
        }))
        .unwrap();

        assert_eq!(node.leaf_count(), 3);
        let ConditionNode::Group { kind, conditions } = &node else {
            panic!("expected group");
        };
        assert_eq!(*kind, GroupKind::Any);
        assert_eq!(
            conditions[0],
            ConditionNode::field("authorId", "is", "__customerService")
        );
    }

    #[test]
    fn test_parse_node_groups() {
        let registry = registry();
        let ticket = TicketSnapshot::new("t1")
            .with_author("u1")
            .with_title("Refund please");
        let actor = Identifier::new("u2");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        let node = ConditionNode::any([
            ConditionNode::field("authorId", "is", "__currentUser"),
            ConditionNode::all([
                ConditionNode::field("status", "is", "new"),
                ConditionNode::field("title", "contains", "refund"),
            ]),
        ]);
        let condition = registry.parse_node(&node).unwrap();
        assert!(condition.test(&ctx));
        assert_eq!(
            condition.name(),
            "any of (author is current user, all of (status is new, title contains refund))"
        );
    }

    #[test]
    fn test_parse_node_rejects_empty_group() {
        let err = registry().parse_node(&ConditionNode::all([])).unwrap_err();
        assert_eq!(err, ConfigError::EmptyGroup { kind: "all".to_string() });
    }

    #[test]
    fn test_parse_node_propagates_leaf_errors() {
        let node = ConditionNode::any([
            ConditionNode::field("authorId", "is", "u1"),
            ConditionNode::field("authorId", "matches", "u2"),
        ]);
        assert!(matches!(
            registry().parse_node(&node),
            Err(ConfigError::UnknownOperator { .. })
        ));
    }
}
