//! Trigger evaluation.
//!
//! A trigger matches when every one of its conditions holds (implicit
//! AND, short-circuiting on the first failure). An empty condition list
//! matches everything. Conditions are pure and independent, so their
//! order never changes the outcome.
//!
//! A condition that panics has broken its contract. The evaluator catches
//! the panic, reports it as an [`EvaluationError::ContractViolation`] and
//! treats the trigger as not matching, so sibling triggers still run.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::error::EvaluationError;

use super::condition::Condition;
use super::context::TriggerContext;
use super::registry::ParsedTrigger;

/// Evaluator for parsed triggers.
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    /// Check that every condition holds.
    #[must_use]
    pub fn evaluate_all(conditions: &[Condition], ctx: &TriggerContext<'_>) -> bool {
        conditions.iter().all(|c| c.test(ctx))
    }

    /// Evaluate a trigger, surfacing contract violations.
    pub fn try_evaluate(trigger: &ParsedTrigger, ctx: &TriggerContext<'_>) -> Result<bool, EvaluationError> {
        panic::catch_unwind(AssertUnwindSafe(|| Self::evaluate_all(&trigger.conditions, ctx))).map_err(
            |payload| EvaluationError::ContractViolation {
                trigger: trigger.name.clone(),
                message: panic_message(payload.as_ref()),
            },
        )
    }

    /// Evaluate a trigger. Contract violations are logged and count as a
    /// non-match.
    #[must_use]
    pub fn evaluate(trigger: &ParsedTrigger, ctx: &TriggerContext<'_>) -> bool {
        match Self::try_evaluate(trigger, ctx) {
            Ok(matched) => matched,
            Err(e) => {
                error!(
                    trigger_id = %trigger.id,
                    ticket = %ctx.ticket_id(),
                    error = %e,
                    "Trigger condition violated its contract, treating as not matched"
                );
                false
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Identifier, TicketSnapshot, TriggerId};
    use crate::triggers::event::TicketEvent;

    fn trigger_with(conditions: Vec<Condition>) -> ParsedTrigger {
        let mut trigger = ParsedTrigger::new(TriggerId::new(1), "test", TicketEvent::Created);
        trigger.conditions.extend(conditions);
        trigger
    }

    fn boom() -> Condition {
        Condition::new("boom", |_| panic!("condition exploded"))
    }

    #[test]
    fn test_empty_list_is_vacuously_true() {
        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        assert!(TriggerEvaluator::evaluate_all(&[], &ctx));
        assert!(TriggerEvaluator::evaluate(&trigger_with(Vec::new()), &ctx));
    }

    #[test]
    fn test_single_false_fails_in_any_position() {
        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        for position in 0..4 {
            let mut conditions = vec![Condition::always(); 3];
            conditions.insert(position, Condition::never());
            assert!(
                !TriggerEvaluator::evaluate_all(&conditions, &ctx),
                "false condition at position {position} should fail the trigger"
            );
        }
    }

    #[test]
    fn test_short_circuits() {
        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        // The panicking condition is never reached.
        let trigger = trigger_with(vec![Condition::never(), boom()]);
        assert_eq!(TriggerEvaluator::try_evaluate(&trigger, &ctx), Ok(false));
    }

    #[test]
    fn test_contract_violation_is_reported() {
        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        let trigger = trigger_with(vec![Condition::always(), boom()]);
        assert_eq!(
            TriggerEvaluator::try_evaluate(&trigger, &ctx),
            Err(EvaluationError::ContractViolation {
                trigger: "test".to_string(),
                message: "condition exploded".to_string(),
            })
        );
        assert!(!TriggerEvaluator::evaluate(&trigger, &ctx));
    }

    #[test]
    fn test_formatted_panic_message() {
        let ticket = TicketSnapshot::new("t1");
        let actor = Identifier::new("u1");
        let ctx = TriggerContext::new(TicketEvent::Created, &ticket, &actor);

        let trigger = trigger_with(vec![Condition::new("formatted", |ctx| {
            panic!("bad ticket {}", ctx.ticket_id())
        })]);
        let Err(EvaluationError::ContractViolation { message, .. }) =
            TriggerEvaluator::try_evaluate(&trigger, &ctx)
        else {
            panic!("expected a contract violation");
        };
        assert_eq!(message, "bad ticket t1");
    }
}
