//! Trigger actions.
//!
//! - [`ActionSpec`]: declarative action, stored with the trigger
//! - [`Action`]: parsed action
//! - [`ActionApplier`]: applies actions to a ticket snapshot
//!
//! The engine stops at producing the updated snapshot. Writing it back,
//! sending notifications and retrying belong to the caller's dispatcher,
//! where asynchronous work lives.

mod action;
mod applier;

pub use action::{
    Action, ActionParser, ActionSpec, ADD_TAG, CHANGE_STATUS, CLOSE_TICKET, REMOVE_TAG,
    UPDATE_ASSIGNEE_ID, UPDATE_CATEGORY_ID, UPDATE_GROUP_ID,
};
pub use applier::ActionApplier;
