//! Identifier types.
//!
//! Users, tickets, categories and groups are all referenced by opaque
//! string identifiers issued by the backing store. The engine never
//! interprets them beyond equality.
//!
//! ## Lookup Misses
//!
//! A field that is absent from a ticket snapshot reads as
//! [`Identifier::UNKNOWN`] instead of failing, so conditions can compare
//! against it like any other value.
//!
//! ```
//! use ticket_automation::core::Identifier;
//!
//! let author = Identifier::new("u1");
//! assert_eq!(author, "u1");
//! assert!(!author.is_unknown());
//! assert!(Identifier::UNKNOWN.is_unknown());
//! ```

use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

/// Opaque identifier for a user, ticket, category or group.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Cow<'static, str>);

impl Identifier {
    /// Sentinel read for fields missing from a snapshot.
    pub const UNKNOWN: Identifier = Identifier(Cow::Borrowed("__unknown"));

    /// Create an identifier from an owned or borrowed string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Create an identifier from a static string without allocating.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Borrow the raw identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is the lookup-miss sentinel.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl Borrow<str> for Identifier {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Identifier {
    fn from(id: String) -> Self {
        Self(Cow::Owned(id))
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Identifier {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a trigger definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TriggerId(pub u32);

impl TriggerId {
    /// Create a new trigger ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trigger({})", self.0)
    }
}
