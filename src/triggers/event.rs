//! Ticket transition events.
//!
//! Every evaluation is driven by exactly one transition of one ticket.
//! Triggers declare which transitions they listen for; the trigger set
//! indexes them by event so unrelated triggers are never evaluated.

use serde::{Deserialize, Serialize};

/// Kind of ticket-state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketEvent {
    /// A ticket was opened.
    Created,
    /// A ticket field changed (assignee, category, status, ...).
    Updated,
    /// A reply was posted.
    Replied,
}

impl TicketEvent {
    /// All events.
    pub const ALL: [TicketEvent; 3] = [TicketEvent::Created, TicketEvent::Updated, TicketEvent::Replied];

    /// Declarative name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TicketEvent::Created => "created",
            TicketEvent::Updated => "updated",
            TicketEvent::Replied => "replied",
        }
    }

    /// Parse a declarative name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == value)
    }
}

impl std::fmt::Display for TicketEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
