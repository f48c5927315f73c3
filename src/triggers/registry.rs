//! Trigger definitions and the trigger set.
//!
//! A [`TriggerDefinition`] is the declarative, storable form of a trigger:
//! the events it listens to, a condition tree, and action specs. The
//! engine parses it once into a [`ParsedTrigger`] and keeps that in a
//! [`TriggerSet`], which finds the triggers to run for each transition.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::{smallvec, SmallVec};
use tracing::debug;

use crate::actions::{Action, ActionSpec};
use crate::core::{Identifier, TriggerId};
use crate::error::ConfigError;

use super::condition::Condition;
use super::context::TriggerContext;
use super::evaluator::TriggerEvaluator;
use super::event::TicketEvent;
use super::parser::ConditionNode;

fn enabled_by_default() -> bool {
    true
}

/// Declarative trigger, as authored by an operator and persisted by the
/// trigger-definition store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    pub id: TriggerId,

    /// Human-readable name (for logs).
    pub name: String,

    /// Transitions this trigger listens for.
    pub events: Vec<TicketEvent>,

    /// Conditions, combined with AND.
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,

    /// Actions to run when all conditions hold.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,

    /// Higher priority fires first.
    #[serde(default)]
    pub priority: i32,

    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl TriggerDefinition {
    /// Create a definition listening to one event.
    pub fn new(id: TriggerId, name: impl Into<String>, event: TicketEvent) -> Self {
        Self {
            id,
            name: name.into(),
            events: vec![event],
            conditions: Vec::new(),
            actions: Vec::new(),
            priority: 0,
            enabled: true,
        }
    }

    /// Listen to another event (builder pattern).
    #[must_use]
    pub fn also_on(mut self, event: TicketEvent) -> Self {
        if !self.events.contains(&event) {
            self.events.push(event);
        }
        self
    }

    /// Add a field condition (builder pattern).
    #[must_use]
    pub fn when(mut self, field: impl Into<String>, op: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(ConditionNode::field(field, op, value));
        self
    }

    /// Add a condition tree (builder pattern).
    #[must_use]
    pub fn when_node(mut self, node: ConditionNode) -> Self {
        self.conditions.push(node);
        self
    }

    /// Add an action (builder pattern).
    #[must_use]
    pub fn then(mut self, kind: impl Into<String>, value: impl Into<Value>) -> Self {
        self.actions.push(ActionSpec::new(kind, value));
        self
    }

    /// Set priority (builder pattern).
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark as disabled (builder pattern).
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A trigger with its conditions and actions already parsed.
#[derive(Clone, Debug)]
pub struct ParsedTrigger {
    pub id: TriggerId,
    pub name: String,
    pub events: SmallVec<[TicketEvent; 3]>,
    pub conditions: SmallVec<[Condition; 4]>,
    pub actions: Vec<Action>,
    pub priority: i32,
    pub enabled: bool,
}

impl ParsedTrigger {
    /// Create a parsed trigger with no conditions and no actions.
    pub fn new(id: TriggerId, name: impl Into<String>, event: TicketEvent) -> Self {
        Self {
            id,
            name: name.into(),
            events: smallvec![event],
            conditions: SmallVec::new(),
            actions: Vec::new(),
            priority: 0,
            enabled: true,
        }
    }

    /// Does this trigger listen for `event`?
    #[must_use]
    pub fn listens_to(&self, event: TicketEvent) -> bool {
        self.events.contains(&event)
    }
}

/// A trigger that matched a transition, ready for the action dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredTrigger {
    pub trigger_id: TriggerId,
    pub name: String,
    /// Ticket the transition belongs to.
    pub ticket_id: Identifier,
    pub actions: Vec<Action>,
}

/// Parsed triggers indexed by event.
#[derive(Clone, Debug, Default)]
pub struct TriggerSet {
    triggers: FxHashMap<TriggerId, ParsedTrigger>,
    by_event: FxHashMap<TicketEvent, Vec<TriggerId>>,
}

impl TriggerSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger. Fails if the id is taken.
    pub fn insert(&mut self, trigger: ParsedTrigger) -> Result<TriggerId, ConfigError> {
        let id = trigger.id;
        if self.triggers.contains_key(&id) {
            return Err(ConfigError::DuplicateTrigger { id });
        }
        self.index(&trigger);
        self.triggers.insert(id, trigger);
        Ok(id)
    }

    /// Add or replace a trigger, returning the replaced one.
    pub fn replace(&mut self, trigger: ParsedTrigger) -> Option<ParsedTrigger> {
        let previous = self.remove(trigger.id);
        self.index(&trigger);
        self.triggers.insert(trigger.id, trigger);
        previous
    }

    /// Each trigger appears at most once per event, even when its event
    /// list repeats one.
    fn index(&mut self, trigger: &ParsedTrigger) {
        for event in &trigger.events {
            let list = self.by_event.entry(*event).or_default();
            if !list.contains(&trigger.id) {
                list.push(trigger.id);
            }
        }
    }

    /// Remove a trigger.
    pub fn remove(&mut self, id: TriggerId) -> Option<ParsedTrigger> {
        let trigger = self.triggers.remove(&id)?;
        for event in &trigger.events {
            if let Some(list) = self.by_event.get_mut(event) {
                list.retain(|&tid| tid != id);
                if list.is_empty() {
                    self.by_event.remove(event);
                }
            }
        }
        Some(trigger)
    }

    /// Get a trigger by ID.
    #[must_use]
    pub fn get(&self, id: TriggerId) -> Option<&ParsedTrigger> {
        self.triggers.get(&id)
    }

    /// Enable or disable a trigger.
    pub fn set_enabled(&mut self, id: TriggerId, enabled: bool) {
        if let Some(trigger) = self.triggers.get_mut(&id) {
            trigger.enabled = enabled;
        }
    }

    /// Find every enabled trigger matching the context's transition.
    ///
    /// Results are sorted by priority (higher first), then by trigger ID.
    /// A trigger whose condition panics is logged and skipped; the others
    /// are unaffected.
    pub fn fire(&self, ctx: &TriggerContext<'_>) -> Vec<FiredTrigger> {
        let Some(trigger_ids) = self.by_event.get(&ctx.event()) else {
            return Vec::new();
        };

        let mut matched: Vec<&ParsedTrigger> = trigger_ids
            .iter()
            .filter_map(|id| self.triggers.get(id))
            .filter(|t| t.enabled)
            .filter(|t| TriggerEvaluator::evaluate(t, ctx))
            .collect();

        matched.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id)));

        matched
            .into_iter()
            .map(|t| {
                debug!(trigger_id = %t.id, name = %t.name, ticket = %ctx.ticket_id(), "Trigger fired");
                FiredTrigger {
                    trigger_id: t.id,
                    name: t.name.clone(),
                    ticket_id: ctx.ticket_id().clone(),
                    actions: t.actions.clone(),
                }
            })
            .collect()
    }

    /// Triggers listening for an event.
    pub fn for_event(&self, event: TicketEvent) -> impl Iterator<Item = &ParsedTrigger> {
        self.by_event
            .get(&event)
            .into_iter()
            .flatten()
            .filter_map(|id| self.triggers.get(id))
    }

    /// Get total trigger count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Iterate all triggers.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedTrigger> {
        self.triggers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TicketSnapshot, TicketStatus};

    fn trigger(id: u32, event: TicketEvent) -> ParsedTrigger {
        ParsedTrigger::new(TriggerId::new(id), format!("trigger {id}"), event)
    }

    #[test]
    fn test_definition_builder() {
        let definition = TriggerDefinition::new(TriggerId::new(1), "Auto close", TicketEvent::Updated)
            .also_on(TicketEvent::Replied)
            .also_on(TicketEvent::Updated)
            .when("status", "is", "preFulfilled")
            .then("closeTicket", Value::Null)
            .with_priority(5);

        assert_eq!(definition.events, vec![TicketEvent::Updated, TicketEvent::Replied]);
        assert_eq!(definition.conditions.len(), 1);
        assert_eq!(definition.actions.len(), 1);
        assert_eq!(definition.priority, 5);
        assert!(definition.enabled);
        assert!(!definition.clone().disabled().enabled);
    }

    #[test]
    fn test_definition_from_json_defaults() {
        let definition: TriggerDefinition = serde_json::from_str(
            r#"{ "id": 3, "name": "Noop", "events": ["created"] }"#,
        )
        .unwrap();

        assert_eq!(definition.id, TriggerId::new(3));
        assert!(definition.conditions.is_empty());
        assert!(definition.actions.is_empty());
        assert_eq!(definition.priority, 0);
        assert!(definition.enabled);
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut set = TriggerSet::new();
        set.insert(trigger(1, TicketEvent::Created)).unwrap();

        assert_eq!(
            set.insert(trigger(1, TicketEvent::Updated)),
            Err(ConfigError::DuplicateTrigger { id: TriggerId::new(1) })
        );
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_replace_reindexes_events() {
        let mut set = TriggerSet::new();
        set.insert(trigger(1, TicketEvent::Created)).unwrap();

        let replaced = set.replace(trigger(1, TicketEvent::Replied));
        assert!(replaced.is_some());
        assert_eq!(set.for_event(TicketEvent::Created).count(), 0);
        assert_eq!(set.for_event(TicketEvent::Replied).count(), 1);
    }

    #[test]
    fn test_remove() {
        let mut set = TriggerSet::new();
        let mut multi = trigger(1, TicketEvent::Created);
        multi.events.push(TicketEvent::Updated);
        set.insert(multi).unwrap();

        assert!(set.remove(TriggerId::new(1)).is_some());
        assert!(set.is_empty());
        assert_eq!(set.for_event(TicketEvent::Updated).count(), 0);
        assert!(set.remove(TriggerId::new(1)).is_none());
    }

    #[test]
    fn test_fire_filters_by_event_and_enabled() {
        let mut set = TriggerSet::new();
        set.insert(trigger(1, TicketEvent::Created)).unwrap();
        set.insert(trigger(2, TicketEvent::Updated)).unwrap();
        set.insert(trigger(3, TicketEvent::Created)).unwrap();
        set.set_enabled(TriggerId::new(3), false);

        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        let fired = set.fire(&ctx);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].trigger_id, TriggerId::new(1));
        assert_eq!(fired[0].ticket_id, "t1");

        let ctx = TriggerContext::new(TicketEvent::Replied, &ticket, &actor);
        assert!(set.fire(&ctx).is_empty());
    }

    #[test]
    fn test_repeated_event_fires_once() {
        let mut set = TriggerSet::new();
        let mut repeated = trigger(1, TicketEvent::Created);
        repeated.events.push(TicketEvent::Created);
        set.insert(repeated.clone()).unwrap();

        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);
        assert_eq!(set.fire(&ctx).len(), 1);
        assert_eq!(set.for_event(TicketEvent::Created).count(), 1);

        set.replace(repeated);
        assert_eq!(set.fire(&ctx).len(), 1);
    }

    #[test]
    fn test_fire_orders_by_priority_then_id() {
        let mut set = TriggerSet::new();
        for (id, priority) in [(4, 0), (2, 10), (3, 10), (1, -5)] {
            let mut t = trigger(id, TicketEvent::Updated);
            t.priority = priority;
            set.insert(t).unwrap();
        }

        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Updated, &ticket, &actor);

        let order: Vec<u32> = set.fire(&ctx).iter().map(|f| f.trigger_id.raw()).collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_fire_isolates_contract_violations() {
        let mut set = TriggerSet::new();

        let mut broken = trigger(1, TicketEvent::Updated);
        broken.conditions.push(Condition::new("broken", |_| panic!("bad predicate")));
        set.insert(broken).unwrap();

        let mut healthy = trigger(2, TicketEvent::Updated);
        healthy.conditions.push(Condition::new("is closed", |ctx| {
            ctx.status() == TicketStatus::Closed
        }));
        set.insert(healthy).unwrap();

        let ticket = TicketSnapshot::new("t1").with_status(TicketStatus::Closed);
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Updated, &ticket, &actor);

        let fired = set.fire(&ctx);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].trigger_id, TriggerId::new(2));
    }
}
