//! Task aggregate root, comments, and creation/patch payloads.

use super::{BoardDomainError, Column, Priority, ProjectId, TaskId, TaskTemplate};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Author recorded on comments written by the board itself.
pub const SYSTEM_AUTHOR: &str = "system";

/// Retry budget given to tasks that do not set one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// A timestamped note attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Who wrote the comment.
    pub author: String,
    /// Comment body.
    pub text: String,
    /// When the comment was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    /// Creates a comment recorded at `timestamp`.
    #[must_use]
    pub fn new(author: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }

    /// Creates a comment authored by the board itself.
    #[must_use]
    pub fn system(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(SYSTEM_AUTHOR, text, timestamp)
    }

    /// Returns `true` when the board itself wrote this comment.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.author == SYSTEM_AUTHOR
    }
}

/// A comment submitted by a caller. The store assigns the timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    author: String,
    text: String,
}

impl NewComment {
    /// Creates a validated comment payload.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyComment`] when the text is blank.
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Result<Self, BoardDomainError> {
        let body = text.into();
        if body.trim().is_empty() {
            return Err(BoardDomainError::EmptyComment);
        }
        Ok(Self {
            author: author.into(),
            text: body,
        })
    }

    /// Creates a comment payload authored by the board itself.
    ///
    /// System comments are generated internally and never blank.
    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            author: SYSTEM_AUTHOR.to_owned(),
            text: text.into(),
        }
    }

    /// Returns the comment author.
    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the comment body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Stamps the comment with the time it was recorded.
    #[must_use]
    pub fn recorded_at(self, timestamp: DateTime<Utc>) -> Comment {
        Comment::new(self.author, self.text, timestamp)
    }
}

/// Task aggregate root.
///
/// `column` is the single source of truth for lifecycle position. The legacy
/// `status` field only exists in the stored representation, where it always
/// mirrors `column`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredTask", into = "StoredTask")]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    description: String,
    column: Column,
    assignee: Option<String>,
    created_by: Option<String>,
    priority: Priority,
    tags: BTreeSet<String>,
    dependencies: Vec<TaskId>,
    comments: Vec<Comment>,
    next_task: Option<TaskTemplate>,
    parent_task_id: Option<TaskId>,
    deadline: Option<DateTime<Utc>>,
    requires_review: bool,
    max_retries: u32,
    retry_count: u32,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    failed_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored shape of a task, carrying both `column` and the mirrored `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    column: Option<Column>,
    #[serde(default)]
    status: Option<Column>,
    #[serde(default)]
    assignee: Option<String>,
    #[serde(default)]
    created_by: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    dependencies: Vec<TaskId>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_task: Option<TaskTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    parent_task_id: Option<TaskId>,
    #[serde(default)]
    deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    requires_review: bool,
    #[serde(default = "default_max_retries")]
    max_retries: u32,
    #[serde(default)]
    retry_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration_ms: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl From<StoredTask> for Task {
    fn from(stored: StoredTask) -> Self {
        Self {
            id: stored.id,
            project_id: stored.project_id,
            title: stored.title,
            description: stored.description,
            column: stored.column.or(stored.status).unwrap_or_default(),
            assignee: stored.assignee,
            created_by: stored.created_by,
            priority: stored.priority,
            tags: stored.tags,
            dependencies: stored.dependencies,
            comments: stored.comments,
            next_task: stored.next_task,
            parent_task_id: stored.parent_task_id,
            deadline: stored.deadline,
            requires_review: stored.requires_review,
            max_retries: stored.max_retries,
            retry_count: stored.retry_count,
            started_at: stored.started_at,
            completed_at: stored.completed_at,
            failed_at: stored.failed_at,
            duration_ms: stored.duration_ms,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

impl From<Task> for StoredTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            column: Some(task.column),
            status: Some(task.column),
            assignee: task.assignee,
            created_by: task.created_by,
            priority: task.priority,
            tags: task.tags,
            dependencies: task.dependencies,
            comments: task.comments,
            next_task: task.next_task,
            parent_task_id: task.parent_task_id,
            deadline: task.deadline,
            requires_review: task.requires_review,
            max_retries: task.max_retries,
            retry_count: task.retry_count,
            started_at: task.started_at,
            completed_at: task.completed_at,
            failed_at: task.failed_at,
            duration_ms: task.duration_ms,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    project_id: ProjectId,
    title: String,
    description: String,
    column: Option<Column>,
    status: Option<Column>,
    assignee: Option<String>,
    created_by: Option<String>,
    priority: Priority,
    tags: BTreeSet<String>,
    dependencies: Vec<TaskId>,
    next_task: Option<TaskTemplate>,
    deadline: Option<DateTime<Utc>>,
    requires_review: bool,
    max_retries: u32,
}

impl NewTask {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project_id: impl Into<ProjectId>, title: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            title: title.into(),
            description: String::new(),
            column: None,
            status: None,
            assignee: None,
            created_by: None,
            priority: Priority::default(),
            tags: BTreeSet::new(),
            dependencies: Vec::new(),
            next_task: None,
            deadline: None,
            requires_review: false,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the task description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the initial column.
    #[must_use]
    pub const fn with_column(mut self, column: Column) -> Self {
        self.column = Some(column);
        self
    }

    /// Sets the initial column through the legacy `status` field.
    ///
    /// Ignored when [`Self::with_column`] is also used.
    #[must_use]
    pub const fn with_legacy_status(mut self, status: Column) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Records who created the task.
    #[must_use]
    pub fn with_creator(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Sets the tasks this task is blocked by.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = dependencies.into_iter().collect();
        self
    }

    /// Sets the successor template spawned when this task is done.
    #[must_use]
    pub fn with_next_task(mut self, template: TaskTemplate) -> Self {
        self.next_task = Some(template);
        self
    }

    /// Sets the advisory deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets whether the task must pass through review before done.
    #[must_use]
    pub const fn with_requires_review(mut self, requires_review: bool) -> Self {
        self.requires_review = requires_review;
        self
    }

    /// Sets the automatic retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Returns the dependencies requested for the new task.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }
}

/// Field-level update for a task.
///
/// Fields left as `None` are untouched. Clearable fields use a nested
/// `Option`, where `Some(None)` clears the stored value. When both `column`
/// and `status` are supplied, `column` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// Moves the task to another project.
    pub project_id: Option<ProjectId>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New column.
    pub column: Option<Column>,
    /// New column, expressed through the legacy `status` field.
    pub status: Option<Column>,
    /// New or cleared assignee.
    pub assignee: Option<Option<String>>,
    /// New priority.
    pub priority: Option<Priority>,
    /// Replacement tag set.
    pub tags: Option<BTreeSet<String>>,
    /// Replacement dependency list.
    pub dependencies: Option<Vec<TaskId>>,
    /// New or cleared successor template.
    pub next_task: Option<Option<TaskTemplate>>,
    /// New or cleared deadline.
    pub deadline: Option<Option<DateTime<Utc>>>,
    /// New review requirement.
    pub requires_review: Option<bool>,
    /// New retry budget.
    pub max_retries: Option<u32>,
    /// New retry counter.
    pub retry_count: Option<u32>,
    /// New or cleared start time.
    pub started_at: Option<Option<DateTime<Utc>>>,
    /// New or cleared completion time.
    pub completed_at: Option<Option<DateTime<Utc>>>,
    /// New or cleared failure time.
    pub failed_at: Option<Option<DateTime<Utc>>>,
    /// New or cleared duration.
    pub duration_ms: Option<Option<i64>>,
}

impl TaskPatch {
    /// Creates a patch that only changes the column.
    #[must_use]
    pub fn column(column: Column) -> Self {
        Self {
            column: Some(column),
            ..Self::default()
        }
    }

    /// Creates a patch that only replaces the dependency list.
    #[must_use]
    pub fn dependencies(dependencies: Vec<TaskId>) -> Self {
        Self {
            dependencies: Some(dependencies),
            ..Self::default()
        }
    }

    /// Trims a new title, rejecting one that is blank.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTaskTitle`] when the new title is
    /// empty after trimming.
    pub fn validated(mut self) -> Result<Self, BoardDomainError> {
        if let Some(title) = self.title.take() {
            let trimmed = title.trim();
            if trimmed.is_empty() {
                return Err(BoardDomainError::EmptyTaskTitle);
            }
            self.title = Some(trimmed.to_owned());
        }
        Ok(self)
    }
}

impl Task {
    /// Creates a new task from a creation request.
    ///
    /// # Errors
    ///
    /// Returns [`BoardDomainError::EmptyTaskTitle`] when the title is blank.
    pub fn new(request: NewTask, clock: &impl Clock) -> Result<Self, BoardDomainError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(BoardDomainError::EmptyTaskTitle);
        }
        let timestamp = clock.utc();

        Ok(Self {
            id: TaskId::generate(),
            project_id: request.project_id,
            title: title.to_owned(),
            description: request.description,
            column: request.column.or(request.status).unwrap_or_default(),
            assignee: request.assignee,
            created_by: request.created_by,
            priority: request.priority,
            tags: request.tags,
            dependencies: request.dependencies,
            comments: Vec::new(),
            next_task: request.next_task,
            parent_task_id: None,
            deadline: request.deadline,
            requires_review: request.requires_review,
            max_retries: request.max_retries,
            retry_count: 0,
            started_at: None,
            completed_at: None,
            failed_at: None,
            duration_ms: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Builds the successor described by `template`, placed in `todo`.
    ///
    /// Fields the template leaves unset are inherited from `self`. The
    /// successor records `self` as its parent and starts with one system
    /// comment naming its origin.
    #[must_use]
    pub fn spawn_successor(&self, template: &TaskTemplate, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        let origin = Comment::system(
            format!("Chained from task \"{}\" ({})", self.title, self.id),
            timestamp,
        );

        Self {
            id: TaskId::generate(),
            project_id: self.project_id.clone(),
            title: template.title().unwrap_or(&self.title).to_owned(),
            description: template
                .description()
                .unwrap_or(&self.description)
                .to_owned(),
            column: Column::Todo,
            assignee: template
                .assignee()
                .map(str::to_owned)
                .or_else(|| self.assignee.clone()),
            created_by: Some(SYSTEM_AUTHOR.to_owned()),
            priority: template.priority().unwrap_or(self.priority),
            tags: template.tags().unwrap_or(&self.tags).clone(),
            dependencies: Vec::new(),
            comments: vec![origin],
            next_task: template.next_task().cloned(),
            parent_task_id: Some(self.id.clone()),
            deadline: None,
            requires_review: template.requires_review().unwrap_or(false),
            max_retries: template.max_retries().unwrap_or(DEFAULT_MAX_RETRIES),
            retry_count: 0,
            started_at: None,
            completed_at: None,
            failed_at: None,
            duration_ms: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Computes the derived-field update for moving this task to `target`.
    ///
    /// `startedAt` is only set on the first entry into `doing`. Entering
    /// `done` sets `completedAt` and, when the task has started, the elapsed
    /// `durationMs`. Entering `failed` sets `failedAt`.
    #[must_use]
    pub fn transition_patch(&self, target: Column, now: DateTime<Utc>) -> TaskPatch {
        let mut patch = TaskPatch::column(target);
        match target {
            Column::Doing if self.started_at.is_none() => {
                patch.started_at = Some(Some(now));
            }
            Column::Done => {
                patch.completed_at = Some(Some(now));
                if let Some(started_at) = self.started_at {
                    patch.duration_ms = Some(Some((now - started_at).num_milliseconds()));
                }
            }
            Column::Failed => {
                patch.failed_at = Some(Some(now));
            }
            _ => {}
        }
        patch
    }

    /// Merges `patch` into the task and bumps `updated_at`.
    pub fn apply_patch(&mut self, patch: TaskPatch, now: DateTime<Utc>) {
        let TaskPatch {
            project_id,
            title,
            description,
            column,
            status,
            assignee,
            priority,
            tags,
            dependencies,
            next_task,
            deadline,
            requires_review,
            max_retries,
            retry_count,
            started_at,
            completed_at,
            failed_at,
            duration_ms,
        } = patch;

        replace(&mut self.project_id, project_id);
        replace(&mut self.title, title);
        replace(&mut self.description, description);
        replace(&mut self.column, column.or(status));
        replace(&mut self.assignee, assignee);
        replace(&mut self.priority, priority);
        replace(&mut self.tags, tags);
        replace(&mut self.dependencies, dependencies);
        replace(&mut self.next_task, next_task);
        replace(&mut self.deadline, deadline);
        replace(&mut self.requires_review, requires_review);
        replace(&mut self.max_retries, max_retries);
        replace(&mut self.retry_count, retry_count);
        replace(&mut self.started_at, started_at);
        replace(&mut self.completed_at, completed_at);
        replace(&mut self.failed_at, failed_at);
        replace(&mut self.duration_ms, duration_ms);
        self.updated_at = now;
    }

    /// Appends a comment and bumps `updated_at`.
    pub fn push_comment(&mut self, comment: Comment) {
        self.updated_at = comment.timestamp;
        self.comments.push(comment);
    }

    /// Removes `dependency` from the dependency list.
    ///
    /// Returns `true` when the task depended on it.
    pub fn remove_dependency(&mut self, dependency: &str) -> bool {
        let before = self.dependencies.len();
        self.dependencies.retain(|id| id.as_str() != dependency);
        self.dependencies.len() != before
    }

    /// Returns `true` when this task is blocked by `task_id`.
    #[must_use]
    pub fn depends_on(&self, task_id: &TaskId) -> bool {
        self.dependencies.contains(task_id)
    }

    /// Returns `true` while automatic retries remain.
    #[must_use]
    pub const fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the owning project identifier.
    #[must_use]
    pub const fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the canonical lifecycle column.
    #[must_use]
    pub const fn column(&self) -> Column {
        self.column
    }

    /// Returns the legacy status, which always mirrors [`Self::column`].
    #[must_use]
    pub const fn status(&self) -> Column {
        self.column
    }

    /// Returns the assignee, if any.
    #[must_use]
    pub fn assignee(&self) -> Option<&str> {
        self.assignee.as_deref()
    }

    /// Returns who created the task, if recorded.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the tags.
    #[must_use]
    pub const fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns the tasks this task is blocked by, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Returns the comments, oldest first.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Returns the successor template, if any.
    #[must_use]
    pub const fn next_task(&self) -> Option<&TaskTemplate> {
        self.next_task.as_ref()
    }

    /// Returns the task this one was chained from, if any.
    #[must_use]
    pub const fn parent_task_id(&self) -> Option<&TaskId> {
        self.parent_task_id.as_ref()
    }

    /// Returns the advisory deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Returns whether the task must pass through review before done.
    #[must_use]
    pub const fn requires_review(&self) -> bool {
        self.requires_review
    }

    /// Returns the automatic retry budget.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns how many automatic retries have been used.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns when work first started, if it has.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the task was last completed, if it has been.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns when the task last failed, if it is still marked failed.
    #[must_use]
    pub const fn failed_at(&self) -> Option<DateTime<Utc>> {
        self.failed_at
    }

    /// Returns the milliseconds between start and completion, if known.
    #[must_use]
    pub const fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
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
}

fn replace<T>(field: &mut T, value: Option<T>) {
    if let Some(new_value) = value {
        *field = new_value;
    }
}
