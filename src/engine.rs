//! Automation engine facade.
//!
//! `AutomationEngine` ties the pieces together for the two kinds of
//! callers the engine has:
//!
//! - configuration tooling validates definitions with
//!   [`parse_trigger`](AutomationEngine::parse_trigger) before saving them
//! - the event-handling layer loads definitions once and calls
//!   [`fire`](AutomationEngine::fire) for every ticket transition
//!
//! ```
//! use ticket_automation::{AutomationEngine, Identifier, TicketEvent, TicketSnapshot, TriggerContext};
//! use ticket_automation::core::TriggerId;
//! use ticket_automation::triggers::TriggerDefinition;
//!
//! let mut engine = AutomationEngine::default();
//! engine.install(
//!     TriggerDefinition::new(TriggerId::new(1), "Assign new tickets", TicketEvent::Created)
//!         .when("assigneeId", "is", "__unassigned")
//!         .then("updateAssigneeId", "cs1"),
//! ).unwrap();
//!
//! let ticket = TicketSnapshot::new("t1").with_author("u1");
//! let actor = Identifier::new("u1");
//! let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);
//!
//! let fired = engine.fire(&ctx);
//! assert_eq!(fired.len(), 1);
//! assert_eq!(fired[0].name, "Assign new tickets");
//! ```

use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::actions::ActionParser;
use crate::core::{EngineConfig, TriggerId};
use crate::error::{ConfigError, Result};
use crate::triggers::{
    Condition, ConditionRegistry, FieldFactories, FiredTrigger, ParsedTrigger, TicketEvent,
    TriggerContext, TriggerDefinition, TriggerEvaluator, TriggerSet,
};

/// Trigger automation engine.
#[derive(Clone, Debug)]
pub struct AutomationEngine {
    config: EngineConfig,
    conditions: ConditionRegistry,
    triggers: TriggerSet,
}

impl Default for AutomationEngine {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self {
            conditions: ConditionRegistry::with_builtin_fields(&config),
            triggers: TriggerSet::new(),
            config,
        }
    }
}

impl AutomationEngine {
    /// Create an engine with the built-in condition fields.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            conditions: ConditionRegistry::with_builtin_fields(&config),
            triggers: TriggerSet::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn conditions(&self) -> &ConditionRegistry {
        &self.conditions
    }

    #[must_use]
    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    /// Add a custom condition field.
    ///
    /// Register fields before loading definitions that use them.
    pub fn register_field(
        &mut self,
        name: impl Into<String>,
        factories: FieldFactories,
    ) -> std::result::Result<(), ConfigError> {
        self.conditions.register_field(name, factories)
    }

    /// Parse and validate a definition without installing it.
    pub fn parse_trigger(
        &self,
        definition: &TriggerDefinition,
    ) -> std::result::Result<ParsedTrigger, ConfigError> {
        if definition.events.is_empty() {
            return Err(ConfigError::NoEvents {
                trigger: definition.name.clone(),
            });
        }

        let condition_count: usize = definition.conditions.iter().map(|c| c.leaf_count()).sum();
        if condition_count > self.config.max_conditions_per_trigger {
            return Err(ConfigError::TooManyConditions {
                trigger: definition.name.clone(),
                count: condition_count,
                max: self.config.max_conditions_per_trigger,
            });
        }
        if definition.actions.len() > self.config.max_actions_per_trigger {
            return Err(ConfigError::TooManyActions {
                trigger: definition.name.clone(),
                count: definition.actions.len(),
                max: self.config.max_actions_per_trigger,
            });
        }

        let conditions = definition
            .conditions
            .iter()
            .map(|node| self.conditions.parse_node(node))
            .collect::<std::result::Result<SmallVec<[Condition; 4]>, ConfigError>>()?;
        let actions = ActionParser::parse_all(&definition.actions)?;

        let mut events: SmallVec<[TicketEvent; 3]> = SmallVec::new();
        for event in &definition.events {
            if !events.contains(event) {
                events.push(*event);
            }
        }

        debug!(
            trigger_id = %definition.id,
            name = %definition.name,
            conditions = condition_count,
            actions = definition.actions.len(),
            "Parsed trigger definition"
        );

        Ok(ParsedTrigger {
            id: definition.id,
            name: definition.name.clone(),
            events,
            conditions,
            actions,
            priority: definition.priority,
            enabled: definition.enabled,
        })
    }

    /// Parse a definition from its JSON form.
    pub fn parse_trigger_json(&self, json: &str) -> Result<ParsedTrigger> {
        let definition: TriggerDefinition = serde_json::from_str(json)?;
        Ok(self.parse_trigger(&definition)?)
    }

    /// Check whether all of a trigger's conditions hold.
    ///
    /// Ignores the trigger's events and enabled flag; [`fire`](Self::fire)
    /// applies those.
    #[must_use]
    pub fn evaluate(&self, trigger: &ParsedTrigger, ctx: &TriggerContext<'_>) -> bool {
        TriggerEvaluator::evaluate(trigger, ctx)
    }

    /// Parse and install a definition. Fails on any configuration error
    /// or an id that is already installed.
    pub fn install(&mut self, definition: TriggerDefinition) -> std::result::Result<TriggerId, ConfigError> {
        let parsed = self.parse_trigger(&definition)?;
        self.triggers.insert(parsed)
    }

    /// Parse and install a definition, replacing any trigger with its id.
    pub fn upsert(
        &mut self,
        definition: TriggerDefinition,
    ) -> std::result::Result<Option<ParsedTrigger>, ConfigError> {
        let parsed = self.parse_trigger(&definition)?;
        Ok(self.triggers.replace(parsed))
    }

    /// Install many definitions, skipping the ones that fail.
    ///
    /// Returns the rejected definitions with their errors. A broken
    /// definition never blocks its siblings.
    pub fn load(
        &mut self,
        definitions: impl IntoIterator<Item = TriggerDefinition>,
    ) -> Vec<(TriggerId, ConfigError)> {
        let mut rejected = Vec::new();
        for definition in definitions {
            let id = definition.id;
            let name = definition.name.clone();
            if let Err(e) = self.install(definition) {
                warn!(trigger_id = %id, name = %name, error = %e, "Rejected trigger definition");
                rejected.push((id, e));
            }
        }
        info!(
            installed = self.triggers.len(),
            rejected = rejected.len(),
            "Loaded trigger definitions"
        );
        rejected
    }

    /// Remove an installed trigger.
    pub fn uninstall(&mut self, id: TriggerId) -> Option<ParsedTrigger> {
        self.triggers.remove(id)
    }

    /// Enable or disable an installed trigger.
    pub fn set_enabled(&mut self, id: TriggerId, enabled: bool) {
        self.triggers.set_enabled(id, enabled);
    }

    /// Evaluate every installed trigger for one transition.
    pub fn fire(&self, ctx: &TriggerContext<'_>) -> Vec<FiredTrigger> {
        self.triggers.fire(ctx)
    }
}
