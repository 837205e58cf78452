//! Project records and the sanitized client projection.

use super::{BoardDomainError, Column, ParseStatusError, Priority, ProjectId, Task};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// The project is in use.
    #[default]
    Active,
    /// The project is kept for reference only.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseStatusError(value.to_owned())),
        }
    }
}

/// A project grouping tasks on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    id: ProjectId,
    name: String,
    #[serde(default)]
    status: ProjectStatus,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    client_view_enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    name: String,
    owner: Option<String>,
    description: String,
    client_view_enabled: bool,
}

impl NewProject {
    /// Creates a request with the required project name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            description: String::new(),
            client_view_enabled: false,
        }
    }

    /// Sets the project owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Enables the read-only client projection.
    #[must_use]
    pub const fn with_client_view(mut self, enabled: bool) -> Self {
        self.client_view_enabled = enabled;
        self
    }
}

/// Field-level update for a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    /// New name.
    pub name: Option<String>,
    /// New status.
    pub status: Option<ProjectStatus>,
    /// New or cleared owner.
    pub owner: Option<Option<String>>,
    /// New description.
    pub description: Option<String>,
    /// New client-view flag.
    pub client_view_enabled: Option<bool>,
}

impl ProjectPatch {
    /// Trims a new name, rejecting one that is blank.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyProjectName`] when the new name is
    /// empty after trimming.
    pub fn validated(mut self) -> Result<Self, BoardDomainError> {
        if let Some(name) = self.name.take() {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(BoardDomainError::EmptyProjectName);
            }
            self.name = Some(trimmed.to_owned());
        }
        Ok(self)
    }
}

impl Project {
    /// Creates a new active project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyProjectName`] when the name is blank.
    pub fn new(request: NewProject, clock: &impl Clock) -> Result<Self, BoardDomainError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(BoardDomainError::EmptyProjectName);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: ProjectId::generate(),
            name: name.to_owned(),
            status: ProjectStatus::Active,
            owner: request.owner,
            description: request.description,
            client_view_enabled: request.client_view_enabled,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Merges `patch` into the project and bumps `updated_at`.
    pub fn apply_patch(&mut self, patch: ProjectPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(enabled) = patch.client_view_enabled {
            self.client_view_enabled = enabled;
        }
        self.updated_at = now;
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> &ProjectId {
        &self.id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the project status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns whether the client projection is enabled.
    #[must_use]
    pub const fn client_view_enabled(&self) -> bool {
        self.client_view_enabled
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Builds the sanitized client projection over `tasks`.
    ///
    /// Returns `None` when the project has not enabled client view. Tasks
    /// belonging to other projects are skipped.
    #[must_use]
    pub fn client_view<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
    ) -> Option<ProjectClientView> {
        if !self.client_view_enabled {
            return None;
        }
        Some(ProjectClientView {
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            tasks: tasks
                .into_iter()
                .filter(|task| task.project_id() == &self.id)
                .map(ClientTaskView::from)
                .collect(),
        })
    }
}

/// Read-only projection of a project for external viewers.
///
/// Carries no assignees, creators, or comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectClientView {
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Project status.
    pub status: ProjectStatus,
    /// Sanitized task summaries.
    pub tasks: Vec<ClientTaskView>,
}

/// Sanitized summary of a task inside a [`ProjectClientView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientTaskView {
    /// Task title.
    pub title: String,
    /// Current column.
    pub column: Column,
    /// Task priority.
    pub priority: Priority,
    /// Advisory deadline.
    pub deadline: Option<DateTime<Utc>>,
    /// Completion time, if done.
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<&Task> for ClientTaskView {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title().to_owned(),
            column: task.column(),
            priority: task.priority(),
            deadline: task.deadline(),
            completed_at: task.completed_at(),
        }
    }
}
