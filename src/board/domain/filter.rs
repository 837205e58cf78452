//! Listing filters for board collections.
//!
//! Every set field must match; an empty filter matches everything.

use super::{Agent, AgentStatus, Column, Priority, Project, ProjectId, ProjectStatus, Task, TaskId};

/// Filter for listing tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Owning project.
    pub project_id: Option<ProjectId>,
    /// Current column.
    pub column: Option<Column>,
    /// Exact assignee.
    pub assignee: Option<String>,
    /// Tag the task must carry.
    pub tag: Option<String>,
    /// Task priority.
    pub priority: Option<Priority>,
    /// Task the listed tasks were chained from.
    pub parent_task_id: Option<TaskId>,
    /// Case-insensitive title substring.
    pub title_contains: Option<String>,
}

impl TaskFilter {
    /// Matches every task.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Matches tasks belonging to `project_id`.
    #[must_use]
    pub fn for_project(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    /// Matches tasks currently in `column`.
    #[must_use]
    pub fn in_column(column: Column) -> Self {
        Self {
            column: Some(column),
            ..Self::default()
        }
    }

    /// Returns `true` when `task` satisfies every set field.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.project_id
            .as_ref()
            .is_none_or(|project_id| task.project_id() == project_id)
            && self.column.is_none_or(|column| task.column() == column)
            && self
                .assignee
                .as_deref()
                .is_none_or(|assignee| task.assignee() == Some(assignee))
            && self
                .tag
                .as_ref()
                .is_none_or(|tag| task.tags().contains(tag))
            && self
                .priority
                .is_none_or(|priority| task.priority() == priority)
            && self
                .parent_task_id
                .as_ref()
                .is_none_or(|parent| task.parent_task_id() == Some(parent))
            && self.title_contains.as_deref().is_none_or(|needle| {
                task.title()
                    .to_lowercase()
                    .contains(&needle.to_lowercase())
            })
    }
}

/// Filter for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Project status.
    pub status: Option<ProjectStatus>,
    /// Exact owner.
    pub owner: Option<String>,
}

impl ProjectFilter {
    /// Matches every project.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns `true` when `project` satisfies every set field.
    #[must_use]
    pub fn matches(&self, project: &Project) -> bool {
        self.status.is_none_or(|status| project.status() == status)
            && self
                .owner
                .as_deref()
                .is_none_or(|owner| project.owner() == Some(owner))
    }
}

/// Filter for listing agents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentFilter {
    /// Presence status.
    pub status: Option<AgentStatus>,
    /// Exact role.
    pub role: Option<String>,
    /// Capability the agent must declare.
    pub capability: Option<String>,
}

impl AgentFilter {
    /// Matches every agent.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns `true` when `agent` satisfies every set field.
    #[must_use]
    pub fn matches(&self, agent: &Agent) -> bool {
        self.status.is_none_or(|status| agent.status() == status)
            && self.role.as_deref().is_none_or(|role| agent.role() == role)
            && self
                .capability
                .as_ref()
                .is_none_or(|capability| agent.capabilities().contains(capability))
    }
}
