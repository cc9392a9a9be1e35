//! Typed command arguments.
//!
//! The wire option list is validated exactly once, at the dispatch
//! boundary, into one record per subcommand; handlers never search untyped
//! `{name, value}` arrays. A failed parse is a user-facing corrective
//! message, not a system error.

use std::fmt;
use wum_discord::CommandOption;
use wum_store::{TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgError(String);

impl ArgError {
    fn missing(option: &str) -> Self {
        Self(format!("Missing required option: {option}."))
    }

    fn invalid(option: &str) -> Self {
        Self(format!("Invalid value for option: {option}."))
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskCommand {
    Create(CreateArgs),
    List(ListArgs),
    Status(StatusArgs),
    Assign(AssignArgs),
    Due(DueArgs),
    Close(CloseArgs),
    Comment(CommentArgs),
}

impl TaskCommand {
    /// Stable label for logs and spans.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "task create",
            Self::List(_) => "task list",
            Self::Status(_) => "task status",
            Self::Assign(_) => "task assign",
            Self::Due(_) => "task due",
            Self::Close(_) => "task close",
            Self::Comment(_) => "task comment",
        }
    }

    /// The list response is only ever shown to the invoking user, so its
    /// deferred acknowledgement carries the ephemeral flag too.
    pub fn ephemeral_ack(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub title: String,
    pub description: Option<String>,
    /// Discord id of the requested assignee.
    pub assignee: Option<String>,
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    pub status: Option<TaskStatus>,
    /// Discord id filter.
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusArgs {
    pub status: TaskStatus,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignArgs {
    /// Discord id of the new assignee.
    pub user: String,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueArgs {
    /// Raw date string; format validation happens in the handler so the
    /// corrective message can name the expected shape.
    pub date: String,
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseArgs {
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentArgs {
    pub content: String,
    pub task_id: Option<String>,
}

/// Parse a `/task` subcommand's option list. `None` means the subcommand
/// name itself is unknown.
pub fn parse_task_command(sub: &CommandOption) -> Option<Result<TaskCommand, ArgError>> {
    let parsed = match sub.name.as_str() {
        "create" => parse_create(sub).map(TaskCommand::Create),
        "list" => parse_list(sub).map(TaskCommand::List),
        "status" => parse_status(sub).map(TaskCommand::Status),
        "assign" => parse_assign(sub).map(TaskCommand::Assign),
        "due" => parse_due(sub).map(TaskCommand::Due),
        "close" => Ok(TaskCommand::Close(CloseArgs {
            task_id: optional_str(sub, "task_id"),
        })),
        "comment" => parse_comment(sub).map(TaskCommand::Comment),
        _ => return None,
    };
    Some(parsed)
}

fn required_str(sub: &CommandOption, name: &str) -> Result<String, ArgError> {
    sub.get_str(name)
        .map(str::to_string)
        .ok_or_else(|| ArgError::missing(name))
}

fn optional_str(sub: &CommandOption, name: &str) -> Option<String> {
    sub.get_str(name).map(str::to_string)
}

fn parse_create(sub: &CommandOption) -> Result<CreateArgs, ArgError> {
    let priority = match sub.get_str("priority") {
        None => TaskPriority::default(),
        Some(raw) => raw.parse().map_err(|_| ArgError::invalid("priority"))?,
    };
    Ok(CreateArgs {
        title: required_str(sub, "title")?,
        description: optional_str(sub, "description"),
        assignee: optional_str(sub, "assignee"),
        priority,
    })
}

fn parse_list(sub: &CommandOption) -> Result<ListArgs, ArgError> {
    let status = match sub.get_str("status") {
        None => None,
        Some(raw) => Some(raw.parse().map_err(|_| ArgError::invalid("status"))?),
    };
    Ok(ListArgs {
        status,
        assignee: optional_str(sub, "assignee"),
    })
}

fn parse_status(sub: &CommandOption) -> Result<StatusArgs, ArgError> {
    let raw = required_str(sub, "status")?;
    Ok(StatusArgs {
        status: raw.parse().map_err(|_| ArgError::invalid("status"))?,
        task_id: optional_str(sub, "task_id"),
    })
}

fn parse_assign(sub: &CommandOption) -> Result<AssignArgs, ArgError> {
    Ok(AssignArgs {
        user: required_str(sub, "user")?,
        task_id: optional_str(sub, "task_id"),
    })
}

fn parse_due(sub: &CommandOption) -> Result<DueArgs, ArgError> {
    Ok(DueArgs {
        date: required_str(sub, "date")?,
        task_id: optional_str(sub, "task_id"),
    })
}

fn parse_comment(sub: &CommandOption) -> Result<CommentArgs, ArgError> {
    Ok(CommentArgs {
        content: required_str(sub, "content")?,
        task_id: optional_str(sub, "task_id"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subcommand(name: &str, options: serde_json::Value) -> CommandOption {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "options": options,
        }))
        .expect("subcommand")
    }

    #[test]
    fn create_parses_with_defaults() {
        let sub = subcommand("create", serde_json::json!([{"name": "title", "value": "t"}]));
        let parsed = parse_task_command(&sub).expect("known").expect("valid");
        assert_eq!(
            parsed,
            TaskCommand::Create(CreateArgs {
                title: "t".to_string(),
                description: None,
                assignee: None,
                priority: TaskPriority::Medium,
            })
        );
        assert!(!parsed.ephemeral_ack());
    }

    #[test]
    fn create_without_title_is_a_corrective_message() {
        let sub = subcommand("create", serde_json::json!([]));
        let err = parse_task_command(&sub)
            .expect("known")
            .expect_err("missing title");
        assert_eq!(err.message(), "Missing required option: title.");
    }

    #[test]
    fn status_rejects_unknown_status_values() {
        let sub = subcommand("status", serde_json::json!([{"name": "status", "value": "done"}]));
        let err = parse_task_command(&sub)
            .expect("known")
            .expect_err("invalid status");
        assert_eq!(err.message(), "Invalid value for option: status.");
    }

    #[test]
    fn list_is_the_only_ephemeral_ack() {
        let list = parse_task_command(&subcommand("list", serde_json::json!([])))
            .expect("known")
            .expect("valid");
        assert!(list.ephemeral_ack());

        let close = parse_task_command(&subcommand("close", serde_json::json!([])))
            .expect("known")
            .expect("valid");
        assert!(!close.ephemeral_ack());
    }

    #[test]
    fn unknown_subcommand_is_none() {
        assert!(parse_task_command(&subcommand("archive", serde_json::json!([]))).is_none());
    }
}
