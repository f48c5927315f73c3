//! Applying actions to ticket snapshots.
//!
//! Application is pure: the input snapshot is left untouched and a new
//! snapshot comes back. Persisting it, notifying people and retrying on
//! failure belong to the dispatcher that owns the object store.

use tracing::debug;

use crate::core::{TicketSnapshot, TicketStatus};
use crate::triggers::FiredTrigger;

use super::Action;

/// Applies actions to ticket snapshots.
pub struct ActionApplier;

impl ActionApplier {
    /// Apply actions in order and return the resulting snapshot.
    #[must_use]
    pub fn apply(ticket: &TicketSnapshot, actions: &[Action]) -> TicketSnapshot {
        let mut next = ticket.clone();
        for action in actions {
            Self::apply_one(&mut next, action);
        }
        next
    }

    /// Apply the actions of every fired trigger, in firing order.
    #[must_use]
    pub fn apply_fired(ticket: &TicketSnapshot, fired: &[FiredTrigger]) -> TicketSnapshot {
        let mut next = ticket.clone();
        for trigger in fired {
            debug!(
                trigger_id = %trigger.trigger_id,
                ticket = %ticket.id,
                actions = trigger.actions.len(),
                "Applying trigger actions"
            );
            for action in &trigger.actions {
                Self::apply_one(&mut next, action);
            }
        }
        next
    }

    fn apply_one(ticket: &mut TicketSnapshot, action: &Action) {
        match action {
            Action::UpdateAssigneeId(assignee) => ticket.assignee_id = assignee.clone(),
            Action::UpdateCategoryId(category) => ticket.category_id = Some(category.clone()),
            Action::UpdateGroupId(group) => ticket.group_id = group.clone(),
            Action::ChangeStatus(status) => ticket.status = *status,
            Action::CloseTicket => ticket.status = TicketStatus::Closed,
            Action::AddTag(tag) => ticket.set_tag(tag.clone()),
            Action::RemoveTag(key) => ticket.remove_tag(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Identifier, Tag, TriggerId};

    #[test]
    fn test_apply_leaves_input_untouched() {
        let ticket = TicketSnapshot::new("t1").with_author("u1").with_tag("vip", "no");
        let next = ActionApplier::apply(
            &ticket,
            &[
                Action::UpdateAssigneeId(Some(Identifier::new("cs1"))),
                Action::AddTag(Tag::new("vip", "yes")),
            ],
        );

        assert_eq!(ticket.assignee_id, None);
        assert_eq!(ticket.tag("vip"), Some("no"));
        assert_eq!(next.assignee_id, Some(Identifier::new("cs1")));
        assert_eq!(next.tag("vip"), Some("yes"));
    }

    #[test]
    fn test_apply_each_action() {
        let ticket = TicketSnapshot::new("t1")
            .with_assignee("cs1")
            .with_group("tier1")
            .with_tag("stale", "yes");

        let next = ActionApplier::apply(
            &ticket,
            &[
                Action::UpdateAssigneeId(None),
                Action::UpdateGroupId(None),
                Action::UpdateCategoryId(Identifier::new("billing")),
                Action::ChangeStatus(TicketStatus::WaitingCustomer),
                Action::RemoveTag("stale".to_string()),
            ],
        );

        assert_eq!(next.assignee_id, None);
        assert_eq!(next.group_id, None);
        assert_eq!(next.category_id, Some(Identifier::new("billing")));
        assert_eq!(next.status, TicketStatus::WaitingCustomer);
        assert!(next.tags.is_empty());
    }

    #[test]
    fn test_later_actions_win() {
        let ticket = TicketSnapshot::new("t1");
        let next = ActionApplier::apply(
            &ticket,
            &[Action::ChangeStatus(TicketStatus::Fulfilled), Action::CloseTicket],
        );
        assert_eq!(next.status, TicketStatus::Closed);
    }

    #[test]
    fn test_apply_fired_in_order() {
        let ticket = TicketSnapshot::new("t1");
        let fired = vec![
            FiredTrigger {
                trigger_id: TriggerId::new(1),
                name: "assign".to_string(),
                ticket_id: Identifier::new("t1"),
                actions: vec![Action::UpdateAssigneeId(Some(Identifier::new("cs1")))],
            },
            FiredTrigger {
                trigger_id: TriggerId::new(2),
                name: "reassign".to_string(),
                ticket_id: Identifier::new("t1"),
                actions: vec![Action::UpdateAssigneeId(Some(Identifier::new("cs2")))],
            },
        ];

        let next = ActionApplier::apply_fired(&ticket, &fired);
        assert_eq!(next.assignee_id, Some(Identifier::new("cs2")));
    }
}
