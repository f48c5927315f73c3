//! Action definitions.
//!
//! Actions are what a matched trigger asks for: reassign, recategorize,
//! change status, tag. Like conditions they are authored declaratively and
//! parsed when the trigger is loaded, so an unknown action type is a
//! configuration error rather than a runtime surprise.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Identifier, Tag, TicketStatus};
use crate::error::ConfigError;
use crate::triggers::fields::UNASSIGNED;

pub const UPDATE_ASSIGNEE_ID: &str = "updateAssigneeId";
pub const UPDATE_CATEGORY_ID: &str = "updateCategoryId";
pub const UPDATE_GROUP_ID: &str = "updateGroupId";
pub const CHANGE_STATUS: &str = "changeStatus";
pub const CLOSE_TICKET: &str = "closeTicket";
pub const ADD_TAG: &str = "addTag";
pub const REMOVE_TAG: &str = "removeTag";

/// Declarative form of an action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
}

impl ActionSpec {
    /// Create a spec.
    pub fn new(kind: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

/// A parsed ticket action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Assign to a user, or unassign with `None`.
    UpdateAssigneeId(Option<Identifier>),
    /// Move to another category.
    UpdateCategoryId(Identifier),
    /// Route to a group, or clear the group with `None`.
    UpdateGroupId(Option<Identifier>),
    /// Set the status.
    ChangeStatus(TicketStatus),
    /// Shorthand for `ChangeStatus(Closed)`.
    CloseTicket,
    /// Set a tag, replacing any tag with the same key.
    AddTag(Tag),
    /// Remove the tag with this key.
    RemoveTag(String),
}

/// Parser for action specs.
pub struct ActionParser;

impl ActionParser {
    /// Parse one action spec.
    pub fn parse(spec: &ActionSpec) -> Result<Action, ConfigError> {
        match spec.kind.as_str() {
            UPDATE_ASSIGNEE_ID => Ok(Action::UpdateAssigneeId(optional_id(spec)?)),
            UPDATE_CATEGORY_ID => {
                let id = non_empty(spec)?;
                Ok(Action::UpdateCategoryId(Identifier::new(id)))
            }
            UPDATE_GROUP_ID => Ok(Action::UpdateGroupId(optional_id(spec)?)),
            CHANGE_STATUS => {
                let value = non_empty(spec)?;
                let status = TicketStatus::parse(value)
                    .ok_or_else(|| invalid(spec, format!("unknown ticket status `{value}`")))?;
                Ok(Action::ChangeStatus(status))
            }
            CLOSE_TICKET => Ok(Action::CloseTicket),
            ADD_TAG => {
                let value = non_empty(spec)?;
                let (key, tag_value) = value
                    .split_once('=')
                    .ok_or_else(|| invalid(spec, "expected `key=value`"))?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(invalid(spec, "tag key must not be empty"));
                }
                Ok(Action::AddTag(Tag::new(key, tag_value.trim())))
            }
            REMOVE_TAG => Ok(Action::RemoveTag(non_empty(spec)?.trim().to_string())),
            _ => Err(ConfigError::UnknownAction {
                action: spec.kind.clone(),
            }),
        }
    }

    /// Parse a list of action specs, stopping at the first error.
    pub fn parse_all(specs: &[ActionSpec]) -> Result<Vec<Action>, ConfigError> {
        specs.iter().map(Self::parse).collect()
    }
}

fn invalid(spec: &ActionSpec, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidAction {
        action: spec.kind.clone(),
        reason: reason.into(),
    }
}

fn non_empty(spec: &ActionSpec) -> Result<&str, ConfigError> {
    match &spec.value {
        Value::String(value) if !value.trim().is_empty() => Ok(value.as_str()),
        Value::String(_) => Err(invalid(spec, "value must not be empty")),
        other => Err(invalid(spec, format!("value must be a string, got {other}"))),
    }
}

fn optional_id(spec: &ActionSpec) -> Result<Option<Identifier>, ConfigError> {
    let value = non_empty(spec)?;
    if value == UNASSIGNED {
        Ok(None)
    } else {
        Ok(Some(Identifier::new(value)))
    }
}
