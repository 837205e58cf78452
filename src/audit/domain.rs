//! Audit entries and ledger queries.

use crate::board::domain::{Column, ProjectId, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Entries returned by a query that does not set a limit.
pub const DEFAULT_AUDIT_LIMIT: usize = 100;

/// Kind of mutation recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// A project was created.
    #[serde(rename = "project.created")]
    ProjectCreated,
    /// Project fields were updated.
    #[serde(rename = "project.updated")]
    ProjectUpdated,
    /// A project and its tasks were deleted.
    #[serde(rename = "project.deleted")]
    ProjectDeleted,
    /// A task was created.
    #[serde(rename = "task.created")]
    TaskCreated,
    /// Task fields were updated directly.
    #[serde(rename = "task.updated")]
    TaskUpdated,
    /// A task was deleted.
    #[serde(rename = "task.deleted")]
    TaskDeleted,
    /// A task moved between columns.
    #[serde(rename = "task.moved")]
    TaskMoved,
    /// A failed task was sent back to `todo` automatically.
    #[serde(rename = "task.retried")]
    TaskRetried,
    /// A completed task spawned its successor.
    #[serde(rename = "task.chained")]
    TaskChained,
    /// A comment was added to a task.
    #[serde(rename = "task.commented")]
    TaskCommented,
    /// A task's dependency list was replaced.
    #[serde(rename = "task.dependencies_changed")]
    TaskDependenciesChanged,
    /// An agent registered with the board.
    #[serde(rename = "agent.registered")]
    AgentRegistered,
    /// Agent fields were updated.
    #[serde(rename = "agent.updated")]
    AgentUpdated,
}

impl AuditAction {
    /// Returns the dotted action name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ProjectCreated => "project.created",
            Self::ProjectUpdated => "project.updated",
            Self::ProjectDeleted => "project.deleted",
            Self::TaskCreated => "task.created",
            Self::TaskUpdated => "task.updated",
            Self::TaskDeleted => "task.deleted",
            Self::TaskMoved => "task.moved",
            Self::TaskRetried => "task.retried",
            Self::TaskChained => "task.chained",
            Self::TaskCommented => "task.commented",
            Self::TaskDependenciesChanged => "task.dependencies_changed",
            Self::AgentRegistered => "agent.registered",
            Self::AgentUpdated => "agent.updated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown audit action name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown audit action: {0}")]
pub struct ParseAuditActionError(pub String);

impl TryFrom<&str> for AuditAction {
    type Error = ParseAuditActionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        const ALL: [AuditAction; 13] = [
            AuditAction::ProjectCreated,
            AuditAction::ProjectUpdated,
            AuditAction::ProjectDeleted,
            AuditAction::TaskCreated,
            AuditAction::TaskUpdated,
            AuditAction::TaskDeleted,
            AuditAction::TaskMoved,
            AuditAction::TaskRetried,
            AuditAction::TaskChained,
            AuditAction::TaskCommented,
            AuditAction::TaskDependenciesChanged,
            AuditAction::AgentRegistered,
            AuditAction::AgentUpdated,
        ];
        let normalized = value.trim().to_ascii_lowercase();
        ALL.into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ParseAuditActionError(value.to_owned()))
    }
}

/// Immutable record of one accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    timestamp: DateTime<Utc>,
    actor_id: String,
    action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<Column>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<Column>,
    #[serde(default)]
    details: String,
}

impl AuditEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(actor_id: impl Into<String>, action: AuditAction, clock: &impl Clock) -> Self {
        Self {
            timestamp: clock.utc(),
            actor_id: actor_id.into(),
            action,
            task_id: None,
            project_id: None,
            from: None,
            to: None,
            details: String::new(),
        }
    }

    /// Records the task the mutation applied to.
    #[must_use]
    pub fn with_task(mut self, task_id: &TaskId) -> Self {
        self.task_id = Some(task_id.clone());
        self
    }

    /// Records the project the mutation applied to.
    #[must_use]
    pub fn with_project(mut self, project_id: &ProjectId) -> Self {
        self.project_id = Some(project_id.clone());
        self
    }

    /// Records a column transition.
    #[must_use]
    pub const fn with_transition(mut self, from: Column, to: Column) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Sets the free-text details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    /// Returns when the mutation was recorded.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns who performed the mutation.
    #[must_use]
    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    /// Returns the mutation kind.
    #[must_use]
    pub const fn action(&self) -> AuditAction {
        self.action
    }

    /// Returns the affected task, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    /// Returns the affected project, if any.
    #[must_use]
    pub const fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    /// Returns the column left by a move, if any.
    #[must_use]
    pub const fn moved_from(&self) -> Option<Column> {
        self.from
    }

    /// Returns the column entered by a move, if any.
    #[must_use]
    pub const fn moved_to(&self) -> Option<Column> {
        self.to
    }

    /// Returns the free-text details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }
}

/// Ledger query. Results are newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    /// Only entries about this task.
    pub task_id: Option<TaskId>,
    /// Only entries by this actor.
    pub actor_id: Option<String>,
    /// Maximum number of entries returned.
    pub limit: usize,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            task_id: None,
            actor_id: None,
            limit: DEFAULT_AUDIT_LIMIT,
        }
    }
}

impl AuditQuery {
    /// Matches every entry, up to the default limit.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches entries about `task_id`.
    #[must_use]
    pub fn for_task(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            ..Self::default()
        }
    }

    /// Matches entries by `actor_id`.
    #[must_use]
    pub fn by_actor(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            ..Self::default()
        }
    }

    /// Sets the maximum number of entries returned.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns `true` when `entry` satisfies every set field.
    #[must_use]
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.task_id
            .as_ref()
            .is_none_or(|task_id| entry.task_id() == Some(task_id))
            && self
                .actor_id
                .as_deref()
                .is_none_or(|actor_id| entry.actor_id() == actor_id)
    }

    /// Selects the matching entries from a chronological sequence, newest
    /// first, truncated to the limit.
    #[must_use]
    pub fn select(&self, entries: Vec<AuditEntry>) -> Vec<AuditEntry> {
        entries
            .into_iter()
            .rev()
            .filter(|entry| self.matches(entry))
            .take(self.limit)
            .collect()
    }
}
