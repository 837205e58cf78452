//! Error types for board domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing board domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardDomainError {
    /// A task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTaskTitle,

    /// A task template sets a title that is empty after trimming.
    #[error("task template title must not be empty")]
    EmptyTemplateTitle,

    /// A project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// An agent identifier is empty after trimming.
    #[error("agent identifier must not be empty")]
    EmptyAgentId,

    /// An agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// A comment has no text.
    #[error("comment text must not be empty")]
    EmptyComment,
}

/// Error returned while parsing a task column.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown column: {0}")]
pub struct ParseColumnError(pub String);

/// Error returned while parsing a task priority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown priority: {0}")]
pub struct ParsePriorityError(pub String);

/// Error returned while parsing a project or agent status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown status: {0}")]
pub struct ParseStatusError(pub String);
