//! Built-in condition fields.
//!
//! Each field contributes a [`FieldFactories`] table. Identifier fields
//! understand a few reserved *sentinel* values (`__currentUser`,
//! `__assignee`, ...). The factory branches on the raw value once, when
//! the condition is built, and hands back a fixed predicate; evaluation
//! never looks at the declarative value again. Any other value becomes a
//! literal equality test.
//!
//! | field | ops | sentinels |
//! |---|---|---|
//! | `authorId` | is, isNot | `__currentUser`, `__assignee`, `__customerService` |
//! | `assigneeId` | is, isNot | `__currentUser`, `__author`, `__unassigned` |
//! | `currentUserId` | is, isNot | `__author`, `__assignee`, `__customerService`, `__system` |
//! | `categoryId` | is, isNot | |
//! | `groupId` | is, isNot | `__unassigned` |
//! | `status`, `previousStatus` | is, isNot | |
//! | `ticket` | is, isNot | |
//! | `title`, `content` | is, isNot, contains, notContains, startsWith, endsWith | |
//! | `tags` | contains, notContains | |

use std::borrow::Cow;

use crate::core::{EngineConfig, Identifier, TicketStatus};
use crate::error::ValueError;

use super::condition::{factory, Condition, ConditionFactory, FieldFactories, Operator};
use super::context::TriggerContext;
use super::event::TicketEvent;

pub const AUTHOR_ID: &str = "authorId";
pub const ASSIGNEE_ID: &str = "assigneeId";
pub const CURRENT_USER_ID: &str = "currentUserId";
pub const CATEGORY_ID: &str = "categoryId";
pub const GROUP_ID: &str = "groupId";
pub const STATUS: &str = "status";
pub const PREVIOUS_STATUS: &str = "previousStatus";
pub const TICKET: &str = "ticket";
pub const TITLE: &str = "title";
pub const CONTENT: &str = "content";
pub const TAGS: &str = "tags";

/// Sentinel: the user performing the transition.
pub const CURRENT_USER: &str = "__currentUser";
/// Sentinel: the ticket's author.
pub const AUTHOR: &str = "__author";
/// Sentinel: the ticket's assignee.
pub const ASSIGNEE: &str = "__assignee";
/// Sentinel: anyone holding the customer-service role.
pub const CUSTOMER_SERVICE: &str = "__customerService";
/// Sentinel: the field is not set.
pub const UNASSIGNED: &str = "__unassigned";
/// Sentinel: the configured automation actor.
pub const SYSTEM: &str = "__system";

/// Every built-in field, keyed by its declarative name.
pub fn builtin_fields(config: &EngineConfig) -> Vec<(&'static str, FieldFactories)> {
    let case_insensitive = config.case_insensitive_text;
    vec![
        (AUTHOR_ID, author_id()),
        (ASSIGNEE_ID, assignee_id()),
        (CURRENT_USER_ID, current_user_id(config.system_user())),
        (CATEGORY_ID, category_id()),
        (GROUP_ID, group_id()),
        (STATUS, status()),
        (PREVIOUS_STATUS, previous_status()),
        (TICKET, ticket()),
        (TITLE, text(TextField::Title, case_insensitive)),
        (CONTENT, text(TextField::Content, case_insensitive)),
        (TAGS, tags()),
    ]
}

/// `authorId`: who opened the ticket.
pub fn author_id() -> FieldFactories {
    let field = IdField::Author;
    identity(
        field,
        vec![
            (CURRENT_USER, same_as(field, IdField::CurrentUser)),
            (ASSIGNEE, same_as(field, IdField::Assignee)),
            (CUSTOMER_SERVICE, holds_customer_service(field)),
        ],
    )
}

/// `assigneeId`: who the ticket is assigned to.
pub fn assignee_id() -> FieldFactories {
    let field = IdField::Assignee;
    identity(
        field,
        vec![
            (CURRENT_USER, same_as(field, IdField::CurrentUser)),
            (AUTHOR, same_as(field, IdField::Author)),
            (UNASSIGNED, unassigned(field)),
        ],
    )
}

/// `currentUserId`: who performs the transition.
pub fn current_user_id(system_user: Identifier) -> FieldFactories {
    let field = IdField::CurrentUser;
    let system = Condition::new("current user is system", move |ctx| {
        ctx.current_user_id() == &system_user
    });
    identity(
        field,
        vec![
            (AUTHOR, same_as(field, IdField::Author)),
            (ASSIGNEE, same_as(field, IdField::Assignee)),
            (CUSTOMER_SERVICE, holds_customer_service(field)),
            (SYSTEM, system),
        ],
    )
}

/// `categoryId`: literal comparison only.
pub fn category_id() -> FieldFactories {
    identity(IdField::Category, Vec::new())
}

/// `groupId`: the routed customer-service group.
pub fn group_id() -> FieldFactories {
    let field = IdField::Group;
    identity(field, vec![(UNASSIGNED, unassigned(field))])
}

/// `status`: value is a status code (`"50"`) or name (`"new"`).
pub fn status() -> FieldFactories {
    FieldFactories::new().with_negated(Operator::Is, Operator::IsNot, status_is(StatusField::Current))
}

/// `previousStatus`: status before the transition. Never matches `is`
/// when the caller supplied no previous snapshot.
pub fn previous_status() -> FieldFactories {
    FieldFactories::new().with_negated(Operator::Is, Operator::IsNot, status_is(StatusField::Previous))
}

/// `ticket`: the transition kind (`created`, `updated`, `replied`).
pub fn ticket() -> FieldFactories {
    let is = factory(|value| {
        let event = TicketEvent::parse(value)
            .ok_or_else(|| ValueError::new(format!("unknown ticket event `{value}`")))?;
        Ok(Condition::new(format!("ticket is {event}"), move |ctx| ctx.event() == event))
    });
    FieldFactories::new().with_negated(Operator::Is, Operator::IsNot, is)
}

/// `tags`: value is `key` (any value) or `key=value`.
pub fn tags() -> FieldFactories {
    let contains = factory(|value| {
        let (key, expected) = parse_tag_filter(value)?;
        Ok(Condition::new(format!("tags contain {value}"), move |ctx| {
            ctx.tags().iter().any(|tag| {
                tag.key == key && expected.as_ref().map_or(true, |v| &tag.value == v)
            })
        }))
    });
    FieldFactories::new().with_negated(Operator::Contains, Operator::NotContains, contains)
}

/// Identifier-valued ticket fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IdField {
    Author,
    Assignee,
    CurrentUser,
    Category,
    Group,
}

impl IdField {
    fn label(self) -> &'static str {
        match self {
            IdField::Author => "author",
            IdField::Assignee => "assignee",
            IdField::CurrentUser => "current user",
            IdField::Category => "category",
            IdField::Group => "group",
        }
    }

    fn read<'a>(self, ctx: &TriggerContext<'a>) -> &'a Identifier {
        match self {
            IdField::Author => ctx.author_id(),
            IdField::Assignee => ctx.assignee_id(),
            IdField::CurrentUser => ctx.current_user_id(),
            IdField::Category => ctx.category_id(),
            IdField::Group => ctx.group_id(),
        }
    }
}

fn identity(field: IdField, sentinels: Vec<(&'static str, Condition)>) -> FieldFactories {
    let is = factory(move |value| {
        if let Some((_, condition)) = sentinels.iter().find(|(name, _)| *name == value) {
            return Ok(condition.clone());
        }
        if value.is_empty() {
            return Err(ValueError::new("identifier must not be empty"));
        }
        let expected = Identifier::new(value);
        Ok(Condition::new(format!("{} is {value}", field.label()), move |ctx| {
            field.read(ctx) == &expected
        }))
    });
    FieldFactories::new().with_negated(Operator::Is, Operator::IsNot, is)
}

fn same_as(field: IdField, other: IdField) -> Condition {
    Condition::new(format!("{} is {}", field.label(), other.label()), move |ctx| {
        field.read(ctx) == other.read(ctx)
    })
}

fn holds_customer_service(field: IdField) -> Condition {
    Condition::new(format!("{} is customer service", field.label()), move |ctx| {
        ctx.is_customer_service(field.read(ctx))
    })
}

fn unassigned(field: IdField) -> Condition {
    Condition::new(format!("{} is unassigned", field.label()), move |ctx| {
        field.read(ctx).is_unknown()
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusField {
    Current,
    Previous,
}

impl StatusField {
    fn label(self) -> &'static str {
        match self {
            StatusField::Current => "status",
            StatusField::Previous => "previous status",
        }
    }

    fn read(self, ctx: &TriggerContext<'_>) -> Option<TicketStatus> {
        match self {
            StatusField::Current => Some(ctx.status()),
            StatusField::Previous => ctx.previous_status(),
        }
    }
}

fn status_is(field: StatusField) -> ConditionFactory {
    factory(move |value| {
        let status = TicketStatus::parse(value)
            .ok_or_else(|| ValueError::new(format!("unknown ticket status `{value}`")))?;
        Ok(Condition::new(format!("{} is {status}", field.label()), move |ctx| {
            field.read(ctx) == Some(status)
        }))
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextField {
    Title,
    Content,
}

impl TextField {
    fn label(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Content => "content",
        }
    }

    fn read<'a>(self, ctx: &TriggerContext<'a>) -> &'a str {
        match self {
            TextField::Title => ctx.title(),
            TextField::Content => ctx.content(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TextMatch {
    Equals,
    Contains,
    StartsWith,
    EndsWith,
}

impl TextMatch {
    fn verb(self) -> &'static str {
        match self {
            TextMatch::Equals => "is",
            TextMatch::Contains => "contains",
            TextMatch::StartsWith => "starts with",
            TextMatch::EndsWith => "ends with",
        }
    }

    fn matches(self, haystack: &str, needle: &str) -> bool {
        match self {
            TextMatch::Equals => haystack == needle,
            TextMatch::Contains => haystack.contains(needle),
            TextMatch::StartsWith => haystack.starts_with(needle),
            TextMatch::EndsWith => haystack.ends_with(needle),
        }
    }
}

fn text(field: TextField, case_insensitive: bool) -> FieldFactories {
    let build = move |kind: TextMatch| {
        factory(move |value| {
            let needle = fold(value, case_insensitive).into_owned();
            Ok(Condition::new(
                format!("{} {} {value}", field.label(), kind.verb()),
                move |ctx| kind.matches(&fold(field.read(ctx), case_insensitive), &needle),
            ))
        })
    };
    FieldFactories::new()
        .with_negated(Operator::Is, Operator::IsNot, build(TextMatch::Equals))
        .with_negated(Operator::Contains, Operator::NotContains, build(TextMatch::Contains))
        .with(Operator::StartsWith, build(TextMatch::StartsWith))
        .with(Operator::EndsWith, build(TextMatch::EndsWith))
}

fn fold(text: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive {
        Cow::Owned(text.to_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}

fn parse_tag_filter(value: &str) -> Result<(String, Option<String>), ValueError> {
    let (key, expected) = match value.split_once('=') {
        Some((key, expected)) => (key.trim(), Some(expected.trim().to_string())),
        None => (value.trim(), None),
    };
    if key.is_empty() {
        return Err(ValueError::new("tag key must not be empty"));
    }
    Ok((key.to_string(), expected))
}
