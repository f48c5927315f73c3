//! Evaluation context.
//!
//! A `TriggerContext` is the read-only view of one ticket transition that
//! conditions are evaluated against. It is built once per transition from
//! data the caller has already fetched (the ticket snapshot, the previous
//! snapshot, the acting user and a role authority) and dropped afterwards.
//!
//! No accessor performs I/O or fails. Identifier fields missing from the
//! snapshot read as [`Identifier::UNKNOWN`].

use im::Vector;
use rustc_hash::FxHashSet;

use crate::core::{Identifier, Tag, TicketSnapshot, TicketStatus};

use super::event::TicketEvent;

static UNKNOWN_ID: Identifier = Identifier::UNKNOWN;
static NO_ROLES: NoRoles = NoRoles;

/// Answers role-membership questions about users.
///
/// Implementations must be pre-resolved: lookups are synchronous and
/// happen inside condition predicates.
pub trait RoleAuthority: Send + Sync {
    /// Does `user` hold the customer-service role?
    fn is_customer_service(&self, user: &Identifier) -> bool;
}

/// Role authority that grants no roles.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRoles;

impl RoleAuthority for NoRoles {
    fn is_customer_service(&self, _user: &Identifier) -> bool {
        false
    }
}

/// Pre-fetched set of customer-service members.
#[derive(Clone, Debug, Default)]
pub struct CustomerServiceRoster {
    members: FxHashSet<Identifier>,
}

impl CustomerServiceRoster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member (builder pattern).
    #[must_use]
    pub fn with_member(mut self, user: impl Into<Identifier>) -> Self {
        self.insert(user);
        self
    }

    /// Add a member.
    pub fn insert(&mut self, user: impl Into<Identifier>) {
        self.members.insert(user.into());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<I: Into<Identifier>> FromIterator<I> for CustomerServiceRoster {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl RoleAuthority for CustomerServiceRoster {
    fn is_customer_service(&self, user: &Identifier) -> bool {
        self.members.contains(user)
    }
}

/// Read-only facade over one ticket transition.
#[derive(Clone, Copy)]
pub struct TriggerContext<'a> {
    event: TicketEvent,
    ticket: &'a TicketSnapshot,
    previous: Option<&'a TicketSnapshot>,
    current_user_id: &'a Identifier,
    roles: &'a dyn RoleAuthority,
}

impl<'a> TriggerContext<'a> {
    /// Create a context. Nobody holds any role until
    /// [`with_roles`](Self::with_roles) is called.
    pub fn new(event: TicketEvent, ticket: &'a TicketSnapshot, current_user_id: &'a Identifier) -> Self {
        Self {
            event,
            ticket,
            previous: None,
            current_user_id,
            roles: &NO_ROLES,
        }
    }

    /// Attach the ticket state from before the transition.
    #[must_use]
    pub fn with_previous(mut self, previous: &'a TicketSnapshot) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Attach a role authority.
    #[must_use]
    pub fn with_roles(mut self, roles: &'a dyn RoleAuthority) -> Self {
        self.roles = roles;
        self
    }

    /// The transition being evaluated.
    #[must_use]
    pub fn event(&self) -> TicketEvent {
        self.event
    }

    #[must_use]
    pub fn ticket_id(&self) -> &'a Identifier {
        &self.ticket.id
    }

    #[must_use]
    pub fn author_id(&self) -> &'a Identifier {
        self.ticket.author_id.as_ref().unwrap_or(&UNKNOWN_ID)
    }

    #[must_use]
    pub fn assignee_id(&self) -> &'a Identifier {
        self.ticket.assignee_id.as_ref().unwrap_or(&UNKNOWN_ID)
    }

    /// The actor performing the transition.
    #[must_use]
    pub fn current_user_id(&self) -> &'a Identifier {
        self.current_user_id
    }

    #[must_use]
    pub fn category_id(&self) -> &'a Identifier {
        self.ticket.category_id.as_ref().unwrap_or(&UNKNOWN_ID)
    }

    #[must_use]
    pub fn group_id(&self) -> &'a Identifier {
        self.ticket.group_id.as_ref().unwrap_or(&UNKNOWN_ID)
    }

    #[must_use]
    pub fn status(&self) -> TicketStatus {
        self.ticket.status
    }

    /// Status before the transition; `None` without a previous snapshot.
    #[must_use]
    pub fn previous_status(&self) -> Option<TicketStatus> {
        self.previous.map(|p| p.status)
    }

    #[must_use]
    pub fn title(&self) -> &'a str {
        &self.ticket.title
    }

    #[must_use]
    pub fn content(&self) -> &'a str {
        &self.ticket.content
    }

    #[must_use]
    pub fn tags(&self) -> &'a Vector<Tag> {
        &self.ticket.tags
    }

    /// Ask the role authority whether `user` is customer service.
    #[must_use]
    pub fn is_customer_service(&self, user: &Identifier) -> bool {
        self.roles.is_customer_service(user)
    }
}

impl std::fmt::Debug for TriggerContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerContext")
            .field("event", &self.event)
            .field("ticket", &self.ticket.id)
            .field("current_user_id", self.current_user_id)
            .field("has_previous", &self.previous.is_some())
            .finish_non_exhaustive()
    }
}
