//! Core types: identifiers, ticket snapshots, configuration.
//!
//! Everything here is plain data. The automation machinery in `triggers`
//! and `actions` builds on these types without touching storage.

pub mod ids;
pub mod ticket;
pub mod config;

pub use ids::{Identifier, TriggerId};
pub use ticket::{Tag, TicketSnapshot, TicketStatus};
pub use config::EngineConfig;
