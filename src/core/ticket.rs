//! Ticket snapshot types.
//!
//! A `TicketSnapshot` is the pre-fetched view of one ticket that the
//! automation engine works on. The snapshot provider (the object layer of
//! the product) fills it in before evaluation; the engine never reaches
//! back into storage.
//!
//! Tags use `im::Vector` so that applying actions to a snapshot produces a
//! new snapshot sharing structure with the old one. The previous and
//! current snapshots of a transition can then both be kept cheaply.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::Identifier;

/// Lifecycle status of a ticket.
///
/// The numeric codes match the values stored by the ticketing product and
/// are ordered: every status below `PreFulfilled` counts as open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TicketStatus {
    /// Just created, nobody replied yet.
    #[default]
    New,
    /// Waiting for customer service to reply.
    WaitingCustomerService,
    /// Waiting for the customer to reply.
    WaitingCustomer,
    /// Customer service considers it solved, pending customer confirmation.
    PreFulfilled,
    /// Solved.
    Fulfilled,
    /// Closed without resolution.
    Closed,
}

impl TicketStatus {
    /// All statuses in code order.
    pub const ALL: [TicketStatus; 6] = [
        TicketStatus::New,
        TicketStatus::WaitingCustomerService,
        TicketStatus::WaitingCustomer,
        TicketStatus::PreFulfilled,
        TicketStatus::Fulfilled,
        TicketStatus::Closed,
    ];

    /// Stored numeric code.
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            TicketStatus::New => 50,
            TicketStatus::WaitingCustomerService => 120,
            TicketStatus::WaitingCustomer => 160,
            TicketStatus::PreFulfilled => 220,
            TicketStatus::Fulfilled => 250,
            TicketStatus::Closed => 280,
        }
    }

    /// Declarative name, as used in trigger definitions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TicketStatus::New => "new",
            TicketStatus::WaitingCustomerService => "waitingCustomerService",
            TicketStatus::WaitingCustomer => "waitingCustomer",
            TicketStatus::PreFulfilled => "preFulfilled",
            TicketStatus::Fulfilled => "fulfilled",
            TicketStatus::Closed => "closed",
        }
    }

    /// Look up a status by numeric code.
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Parse a status from its numeric code (`"50"`) or name (`"new"`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if let Ok(code) = value.parse::<u16>() {
            return Self::from_code(code);
        }
        Self::ALL.into_iter().find(|s| s.name() == value)
    }

    /// Is the ticket still being worked on?
    #[must_use]
    pub fn is_open(self) -> bool {
        self < TicketStatus::PreFulfilled
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A key/value label attached to a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// Create a new tag.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Pre-fetched state of a single ticket.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    /// Ticket identifier.
    pub id: Identifier,

    /// User who opened the ticket.
    pub author_id: Option<Identifier>,

    /// Customer service member the ticket is assigned to.
    pub assignee_id: Option<Identifier>,

    /// Category the ticket is filed under.
    pub category_id: Option<Identifier>,

    /// Customer service group the ticket is routed to.
    pub group_id: Option<Identifier>,

    /// Current lifecycle status.
    #[serde(default)]
    pub status: TicketStatus,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Tags, at most one per key.
    #[serde(default)]
    pub tags: Vector<Tag>,
}

impl TicketSnapshot {
    /// Create a snapshot with only an id; every other field is absent.
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            author_id: None,
            assignee_id: None,
            category_id: None,
            group_id: None,
            status: TicketStatus::default(),
            title: String::new(),
            content: String::new(),
            tags: Vector::new(),
        }
    }

    /// Set the author (builder pattern).
    #[must_use]
    pub fn with_author(mut self, author: impl Into<Identifier>) -> Self {
        self.author_id = Some(author.into());
        self
    }

    /// Set the assignee (builder pattern).
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<Identifier>) -> Self {
        self.assignee_id = Some(assignee.into());
        self
    }

    /// Set the category (builder pattern).
    #[must_use]
    pub fn with_category(mut self, category: impl Into<Identifier>) -> Self {
        self.category_id = Some(category.into());
        self
    }

    /// Set the group (builder pattern).
    #[must_use]
    pub fn with_group(mut self, group: impl Into<Identifier>) -> Self {
        self.group_id = Some(group.into());
        self
    }

    /// Set the status (builder pattern).
    #[must_use]
    pub fn with_status(mut self, status: TicketStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the title (builder pattern).
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the content (builder pattern).
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Add or replace a tag (builder pattern).
    #[must_use]
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_tag(Tag::new(key, value));
        self
    }

    /// Get a tag value by key.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }

    /// Insert a tag, replacing any existing tag with the same key.
    pub fn set_tag(&mut self, tag: Tag) {
        match self.tags.iter().position(|t| t.key == tag.key) {
            Some(index) => {
                self.tags.set(index, tag);
            }
            None => self.tags.push_back(tag),
        }
    }

    /// Remove the tag with the given key, if present.
    pub fn remove_tag(&mut self, key: &str) {
        self.tags.retain(|t| t.key != key);
    }
}
