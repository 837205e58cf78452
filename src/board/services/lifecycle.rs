//! Task lifecycle engine.
//!
//! Moving a task between columns is the only path that enforces the
//! dependency and review gates and produces the derived timestamps. A move
//! into `failed` may send the task straight back to `todo` while retries
//! remain; a move into `done` notifies dependents and spawns the chained
//! successor, if any.

use crate::board::{
    domain::{Column, NewComment, ParseColumnError, Task, TaskFilter, TaskId, TaskPatch},
    ports::{StoreError, TaskStore},
};
use crate::config::{BoardConfig, MissingDependencyPolicy};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Request to move a task to another column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTaskRequest {
    task_id: TaskId,
    target: Option<String>,
}

impl MoveTaskRequest {
    /// Creates a request naming the target column as text.
    #[must_use]
    pub fn new(task_id: impl Into<TaskId>, target: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            target: Some(target.into()),
        }
    }

    /// Creates a request for an already parsed column.
    #[must_use]
    pub fn column(task_id: impl Into<TaskId>, target: Column) -> Self {
        Self::new(task_id, target.as_str())
    }

    /// Creates a request that carries no target column.
    #[must_use]
    pub fn without_target(task_id: impl Into<TaskId>) -> Self {
        Self {
            task_id: task_id.into(),
            target: None,
        }
    }

    /// Returns the task to move.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the requested column text, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn parse_target(&self) -> Result<Column, TaskLifecycleError> {
        let target = self
            .target
            .as_deref()
            .filter(|target| !target.trim().is_empty())
            .ok_or(TaskLifecycleError::MissingColumn)?;
        Ok(Column::try_from(target)?)
    }
}

/// A dependency preventing a task from entering `doing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyBlocker {
    /// Identifier of the blocking dependency.
    pub id: TaskId,
    /// Dependency title, or `None` when the dependency no longer exists.
    pub title: Option<String>,
    /// Dependency column, or `None` when the dependency no longer exists.
    pub column: Option<Column>,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The task after the move and its side effects.
    pub task: Task,
    /// Column the task occupied before the move.
    pub previous_column: Column,
    /// Whether the task failed and was sent back to `todo` automatically.
    pub retried: bool,
    /// Successor spawned from the task's `nextTask` template.
    pub chained_task: Option<Task>,
}

/// Errors returned by [`TaskLifecycleService::move_task`].
#[derive(Debug, Clone, Error)]
pub enum TaskLifecycleError {
    /// The request did not name a target column.
    #[error("target column is required")]
    MissingColumn,

    /// The target column is not one of the known columns.
    #[error(transparent)]
    UnknownColumn(#[from] ParseColumnError),

    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Dependencies of the task are not done yet.
    #[error("task {task_id} is blocked by {count} unfinished dependencies", count = .blockers.len())]
    DependencyBlocked {
        /// Task that was asked to move.
        task_id: TaskId,
        /// Dependencies preventing the move, in declaration order.
        blockers: Vec<DependencyBlocker>,
    },

    /// The task requires review and is not in `review`.
    #[error("task {0} must pass through review before it can be done")]
    ReviewRequired(TaskId),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskLifecycleError {
    /// Returns `true` when the move failed because the task must be
    /// reviewed first.
    #[must_use]
    pub const fn requires_review(&self) -> bool {
        matches!(self, Self::ReviewRequired(_))
    }

    /// Returns the blocking dependencies of a gated move.
    #[must_use]
    pub fn blockers(&self) -> &[DependencyBlocker] {
        match self {
            Self::DependencyBlocked { blockers, .. } => blockers,
            _ => &[],
        }
    }
}

/// Result type for lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    missing_dependencies: MissingDependencyPolicy,
}

impl<S, C> TaskLifecycleService<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service that treats missing dependencies as
    /// blockers.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            missing_dependencies: MissingDependencyPolicy::Block,
        }
    }

    /// Creates a lifecycle service using the policies in `config`.
    #[must_use]
    pub const fn from_config(store: Arc<S>, clock: Arc<C>, config: &BoardConfig) -> Self {
        Self::new(store, clock).with_missing_dependency_policy(config.missing_dependency_policy())
    }

    /// Sets how the dependency gate treats dependencies that no longer
    /// exist.
    #[must_use]
    pub const fn with_missing_dependency_policy(mut self, policy: MissingDependencyPolicy) -> Self {
        self.missing_dependencies = policy;
        self
    }

    /// Moves a task to another column.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::MissingColumn`] or
    /// [`TaskLifecycleError::UnknownColumn`] for an invalid target,
    /// [`TaskLifecycleError::NotFound`] when the task does not exist,
    /// [`TaskLifecycleError::DependencyBlocked`] or
    /// [`TaskLifecycleError::ReviewRequired`] when a gate rejects the move,
    /// and [`TaskLifecycleError::Store`] when persistence fails. Gate
    /// failures leave the task unchanged.
    pub async fn move_task(&self, request: MoveTaskRequest) -> TaskLifecycleResult<MoveOutcome> {
        let target = request.parse_target()?;
        let task_id = request.task_id;
        let task = self.load(&task_id).await?;
        let previous_column = task.column();

        if target == Column::Doing && !task.dependencies().is_empty() {
            let blockers = self.blockers(&task).await?;
            if !blockers.is_empty() {
                warn!(%task_id, blockers = blockers.len(), "move blocked by dependencies");
                return Err(TaskLifecycleError::DependencyBlocked { task_id, blockers });
            }
        }

        if target == Column::Done && task.requires_review() && previous_column != Column::Review {
            warn!(%task_id, from = %previous_column, "move blocked by review requirement");
            return Err(TaskLifecycleError::ReviewRequired(task_id));
        }

        let patch = task.transition_patch(target, self.clock.utc());
        let moved = self.update(&task_id, patch).await?;
        info!(%task_id, from = %previous_column, to = %target, "task moved");

        let mut outcome = MoveOutcome {
            task: moved,
            previous_column,
            retried: false,
            chained_task: None,
        };
        match target {
            Column::Failed => self.handle_failure(&mut outcome).await?,
            Column::Done => self.handle_completion(&mut outcome).await?,
            _ => {}
        }
        Ok(outcome)
    }

    async fn load(&self, task_id: &TaskId) -> TaskLifecycleResult<Task> {
        self.store
            .get(task_id.as_str())
            .await?
            .ok_or_else(|| TaskLifecycleError::NotFound(task_id.clone()))
    }

    async fn update(&self, task_id: &TaskId, patch: TaskPatch) -> TaskLifecycleResult<Task> {
        self.store
            .update(task_id.as_str(), patch)
            .await?
            .ok_or_else(|| TaskLifecycleError::NotFound(task_id.clone()))
    }

    async fn comment(&self, task_id: &TaskId, text: String) -> TaskLifecycleResult<Task> {
        self.store
            .append_comment(task_id, NewComment::system(text))
            .await?
            .ok_or_else(|| TaskLifecycleError::NotFound(task_id.clone()))
    }

    async fn blockers(&self, task: &Task) -> TaskLifecycleResult<Vec<DependencyBlocker>> {
        let tasks = self.store.list(&TaskFilter::all()).await?;
        let by_id: HashMap<&TaskId, &Task> = tasks.iter().map(|other| (other.id(), other)).collect();

        let blockers = task
            .dependencies()
            .iter()
            .filter_map(|dependency| match by_id.get(dependency) {
                Some(found) if found.column() == Column::Done => None,
                Some(found) => Some(DependencyBlocker {
                    id: dependency.clone(),
                    title: Some(found.title().to_owned()),
                    column: Some(found.column()),
                }),
                None => match self.missing_dependencies {
                    MissingDependencyPolicy::Block => Some(DependencyBlocker {
                        id: dependency.clone(),
                        title: None,
                        column: None,
                    }),
                    MissingDependencyPolicy::Ignore => None,
                },
            })
            .collect();
        Ok(blockers)
    }

    async fn handle_failure(&self, outcome: &mut MoveOutcome) -> TaskLifecycleResult<()> {
        let task_id = outcome.task.id().clone();
        let max_retries = outcome.task.max_retries();

        if !outcome.task.has_retries_left() {
            warn!(%task_id, max_retries, "retries exhausted");
            outcome.task = self
                .comment(
                    &task_id,
                    format!(
                        "Retries exhausted ({max_retries}/{max_retries}); manual intervention required"
                    ),
                )
                .await?;
            return Ok(());
        }

        let attempt = outcome.task.retry_count() + 1;
        let patch = TaskPatch {
            column: Some(Column::Todo),
            retry_count: Some(attempt),
            failed_at: Some(None),
            ..TaskPatch::default()
        };
        self.update(&task_id, patch).await?;
        outcome.task = self
            .comment(
                &task_id,
                format!("Auto-retry {attempt}/{max_retries}: task failed and was returned to todo"),
            )
            .await?;
        outcome.retried = true;
        info!(%task_id, attempt, max_retries, "failed task queued for retry");
        Ok(())
    }

    async fn handle_completion(&self, outcome: &mut MoveOutcome) -> TaskLifecycleResult<()> {
        let completed = &outcome.task;
        let dependents = self.store.list(&TaskFilter::all()).await?;
        for dependent in dependents
            .iter()
            .filter(|dependent| dependent.depends_on(completed.id()))
        {
            let note = format!(
                "Dependency \"{}\" ({}) is done",
                completed.title(),
                completed.id()
            );
            // A dependent deleted since the scan has nothing left to notify.
            self.store
                .append_comment(dependent.id(), NewComment::system(note))
                .await?;
        }

        if let Some(template) = completed.next_task() {
            let spawned = completed.spawn_successor(template, &*self.clock);
            let successor = self.store.create(spawned).await?;
            info!(
                parent = %completed.id(),
                successor = %successor.id(),
                "chained successor created"
            );
            outcome.chained_task = Some(successor);
        }
        Ok(())
    }
}
