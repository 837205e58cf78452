//! Board facade used by transport layers.
//!
//! Every accepted mutation is written to the store first and then recorded
//! in the audit ledger. A failed audit append is reported to the caller, but
//! the store write it describes has already happened.

use super::lifecycle::{MoveOutcome, MoveTaskRequest, TaskLifecycleError, TaskLifecycleService};
use crate::audit::{AuditAction, AuditEntry, AuditError, AuditLedger, AuditQuery};
use crate::board::{
    domain::{
        Agent, AgentFilter, AgentId, AgentPatch, BoardDomainError, Column, NewComment, NewProject,
        NewTask, Project, ProjectClientView, ProjectFilter, ProjectId, ProjectPatch, Task, TaskFilter,
        TaskId, TaskPatch, would_cycle,
    },
    ports::{BoardStore, RecordStore, StoreError},
};
use crate::config::{BoardConfig, MissingDependencyPolicy};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned by [`BoardService`].
#[derive(Debug, Clone, Error)]
pub enum BoardServiceError {
    /// Input validation failed.
    #[error(transparent)]
    Domain(#[from] BoardDomainError),

    /// A move was rejected or failed.
    #[error(transparent)]
    Lifecycle(#[from] TaskLifecycleError),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The audit ledger failed after the mutation was stored.
    #[error(transparent)]
    Audit(#[from] AuditError),

    /// The project does not exist.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    /// The agent does not exist.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// An agent with the same identifier is already registered.
    #[error("agent already registered: {0}")]
    DuplicateAgent(AgentId),

    /// The proposed dependency list would make the task depend on itself.
    #[error("dependencies of task {task_id} would form a cycle")]
    DependencyCycle {
        /// Task being edited.
        task_id: TaskId,
        /// Rejected dependency list.
        dependencies: Vec<TaskId>,
    },

    /// The project has not enabled its client view.
    #[error("client view is disabled for project {0}")]
    ClientViewDisabled(ProjectId),
}

/// Result type for board service operations.
pub type BoardServiceResult<T> = Result<T, BoardServiceError>;

/// Board operations with audit recording.
#[derive(Clone)]
pub struct BoardService<S, L, C>
where
    S: BoardStore,
    L: AuditLedger,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    ledger: Arc<L>,
    clock: Arc<C>,
    lifecycle: TaskLifecycleService<S, C>,
}

impl<S, L, C> BoardService<S, L, C>
where
    S: BoardStore,
    L: AuditLedger,
    C: Clock + Send + Sync,
{
    /// Creates a board service over `store` and `ledger`.
    #[must_use]
    pub fn new(store: Arc<S>, ledger: Arc<L>, clock: Arc<C>) -> Self {
        let lifecycle = TaskLifecycleService::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            ledger,
            clock,
            lifecycle,
        }
    }

    /// Creates a board service using the policies in `config`.
    #[must_use]
    pub fn from_config(
        store: Arc<S>,
        ledger: Arc<L>,
        clock: Arc<C>,
        config: &BoardConfig,
    ) -> Self {
        Self::new(store, ledger, clock)
            .with_missing_dependency_policy(config.missing_dependency_policy())
    }

    /// Sets how moves treat dependencies that no longer exist.
    #[must_use]
    pub fn with_missing_dependency_policy(mut self, policy: MissingDependencyPolicy) -> Self {
        self.lifecycle = self.lifecycle.with_missing_dependency_policy(policy);
        self
    }

    fn projects(&self) -> &dyn RecordStore<Project> {
        &*self.store
    }

    fn tasks(&self) -> &dyn RecordStore<Task> {
        &*self.store
    }

    fn agents(&self) -> &dyn RecordStore<Agent> {
        &*self.store
    }

    async fn record(&self, entry: AuditEntry) -> BoardServiceResult<()> {
        let action = entry.action();
        if let Err(err) = self.ledger.append(entry).await {
            warn!(%action, error = %err, "audit append failed after store write");
            return Err(err.into());
        }
        Ok(())
    }

    fn entry(&self, actor: &str, action: AuditAction) -> AuditEntry {
        AuditEntry::new(actor, action, &*self.clock)
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when the name is blank, or a
    /// store or audit failure.
    pub async fn create_project(
        &self,
        actor: &str,
        request: NewProject,
    ) -> BoardServiceResult<Project> {
        let project = self
            .projects()
            .create(Project::new(request, &*self.clock)?)
            .await?;
        self.record(
            self.entry(actor, AuditAction::ProjectCreated)
                .with_project(project.id())
                .with_details(project.name()),
        )
        .await?;
        Ok(project)
    }

    /// Updates project fields.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when a new name is blank,
    /// [`BoardServiceError::ProjectNotFound`] when the project does not
    /// exist, or a store or audit failure.
    pub async fn update_project(
        &self,
        actor: &str,
        project_id: &ProjectId,
        patch: ProjectPatch,
    ) -> BoardServiceResult<Project> {
        let project = self
            .projects()
            .update(project_id.as_str(), patch.validated()?)
            .await?
            .ok_or_else(|| BoardServiceError::ProjectNotFound(project_id.clone()))?;
        self.record(self.entry(actor, AuditAction::ProjectUpdated).with_project(project_id))
            .await?;
        Ok(project)
    }

    /// Deletes a project and then its tasks, returning how many tasks were
    /// removed.
    ///
    /// The tasks are removed in one write to the task collection, after the
    /// project itself. A failure there leaves the project deleted and every
    /// task in place.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ProjectNotFound`] when the project does
    /// not exist, or a store or audit failure.
    pub async fn delete_project(
        &self,
        actor: &str,
        project_id: &ProjectId,
    ) -> BoardServiceResult<usize> {
        if !self.projects().delete(project_id.as_str()).await? {
            return Err(BoardServiceError::ProjectNotFound(project_id.clone()));
        }

        let removed = self
            .tasks()
            .delete_matching(&TaskFilter::for_project(project_id.clone()))
            .await?;
        info!(%project_id, removed, "project deleted with its tasks");

        self.record(
            self.entry(actor, AuditAction::ProjectDeleted)
                .with_project(project_id)
                .with_details(format!("removed {removed} tasks")),
        )
        .await?;
        Ok(removed)
    }

    /// Lists projects matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn list_projects(&self, filter: &ProjectFilter) -> BoardServiceResult<Vec<Project>> {
        Ok(self.projects().list(filter).await?)
    }

    /// Finds a project by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn get_project(&self, project_id: &ProjectId) -> BoardServiceResult<Option<Project>> {
        Ok(self.projects().get(project_id.as_str()).await?)
    }

    /// Builds the sanitized client view of a project.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::ProjectNotFound`] when the project does
    /// not exist and [`BoardServiceError::ClientViewDisabled`] when it has
    /// not enabled client view.
    pub async fn client_view(&self, project_id: &ProjectId) -> BoardServiceResult<ProjectClientView> {
        let project = self
            .get_project(project_id)
            .await?
            .ok_or_else(|| BoardServiceError::ProjectNotFound(project_id.clone()))?;
        let tasks = self
            .tasks()
            .list(&TaskFilter::for_project(project_id.clone()))
            .await?;
        project
            .client_view(&tasks)
            .ok_or_else(|| BoardServiceError::ClientViewDisabled(project_id.clone()))
    }

    /// Creates a task.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when the title is blank, or a
    /// store or audit failure.
    pub async fn create_task(&self, actor: &str, request: NewTask) -> BoardServiceResult<Task> {
        let task = self.tasks().create(Task::new(request, &*self.clock)?).await?;
        self.record(
            self.entry(actor, AuditAction::TaskCreated)
                .with_task(task.id())
                .with_project(task.project_id())
                .with_details(task.title()),
        )
        .await?;
        Ok(task)
    }

    /// Updates task fields directly, bypassing the lifecycle gates.
    ///
    /// A replacement dependency list is checked for cycles first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Domain`] when a new title is blank,
    /// [`BoardServiceError::DependencyCycle`] when the new dependencies
    /// would form a cycle, [`BoardServiceError::TaskNotFound`] when the task
    /// does not exist, or a store or audit failure.
    pub async fn update_task(
        &self,
        actor: &str,
        task_id: &TaskId,
        patch: TaskPatch,
    ) -> BoardServiceResult<Task> {
        let checked = patch.validated()?;
        if let Some(dependencies) = &checked.dependencies {
            self.ensure_acyclic(task_id, dependencies).await?;
        }
        let task = self
            .tasks()
            .update(task_id.as_str(), checked)
            .await?
            .ok_or_else(|| BoardServiceError::TaskNotFound(task_id.clone()))?;
        self.record(
            self.entry(actor, AuditAction::TaskUpdated)
                .with_task(task_id)
                .with_project(task.project_id()),
        )
        .await?;
        Ok(task)
    }

    /// Replaces a task's dependency list.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::DependencyCycle`] when the list would
    /// form a cycle, [`BoardServiceError::TaskNotFound`] when the task does
    /// not exist, or a store or audit failure.
    pub async fn set_dependencies(
        &self,
        actor: &str,
        task_id: &TaskId,
        dependencies: Vec<TaskId>,
    ) -> BoardServiceResult<Task> {
        self.ensure_acyclic(task_id, &dependencies).await?;
        let details = dependencies
            .iter()
            .map(TaskId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let task = self
            .tasks()
            .update(task_id.as_str(), TaskPatch::dependencies(dependencies))
            .await?
            .ok_or_else(|| BoardServiceError::TaskNotFound(task_id.clone()))?;
        self.record(
            self.entry(actor, AuditAction::TaskDependenciesChanged)
                .with_task(task_id)
                .with_project(task.project_id())
                .with_details(details),
        )
        .await?;
        Ok(task)
    }

    async fn ensure_acyclic(
        &self,
        task_id: &TaskId,
        dependencies: &[TaskId],
    ) -> BoardServiceResult<()> {
        let tasks = self.tasks().list(&TaskFilter::all()).await?;
        if would_cycle(task_id, dependencies, &tasks) {
            warn!(%task_id, "rejected dependency cycle");
            return Err(BoardServiceError::DependencyCycle {
                task_id: task_id.clone(),
                dependencies: dependencies.to_vec(),
            });
        }
        Ok(())
    }

    /// Deletes a task. Other tasks stop depending on it.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::TaskNotFound`] when the task does not
    /// exist, or a store or audit failure.
    pub async fn delete_task(&self, actor: &str, task_id: &TaskId) -> BoardServiceResult<()> {
        if !self.tasks().delete(task_id.as_str()).await? {
            return Err(BoardServiceError::TaskNotFound(task_id.clone()));
        }
        self.record(self.entry(actor, AuditAction::TaskDeleted).with_task(task_id))
            .await
    }

    /// Adds a comment to a task. The comment author is the audit actor.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::TaskNotFound`] when the task does not
    /// exist, or a store or audit failure.
    pub async fn comment_on_task(
        &self,
        task_id: &TaskId,
        comment: NewComment,
    ) -> BoardServiceResult<Task> {
        let entry = self
            .entry(comment.author(), AuditAction::TaskCommented)
            .with_task(task_id)
            .with_details(comment.text());
        let task = self
            .store
            .append_comment(task_id, comment)
            .await?
            .ok_or_else(|| BoardServiceError::TaskNotFound(task_id.clone()))?;
        self.record(entry.with_project(task.project_id())).await?;
        Ok(task)
    }

    /// Moves a task through the lifecycle engine.
    ///
    /// Records the move, and separately any automatic retry or chained
    /// successor it caused.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Lifecycle`] when the move is invalid or
    /// gated, or an audit failure.
    pub async fn move_task(
        &self,
        actor: &str,
        request: MoveTaskRequest,
    ) -> BoardServiceResult<MoveOutcome> {
        let outcome = self.lifecycle.move_task(request).await?;
        let task = &outcome.task;
        let entered = if outcome.retried {
            Column::Failed
        } else {
            task.column()
        };

        self.record(
            self.entry(actor, AuditAction::TaskMoved)
                .with_task(task.id())
                .with_project(task.project_id())
                .with_transition(outcome.previous_column, entered),
        )
        .await?;

        if outcome.retried {
            self.record(
                self.entry(actor, AuditAction::TaskRetried)
                    .with_task(task.id())
                    .with_project(task.project_id())
                    .with_transition(entered, task.column())
                    .with_details(format!(
                        "retry {}/{}",
                        task.retry_count(),
                        task.max_retries()
                    )),
            )
            .await?;
        }

        if let Some(successor) = &outcome.chained_task {
            self.record(
                self.entry(actor, AuditAction::TaskChained)
                    .with_task(successor.id())
                    .with_project(successor.project_id())
                    .with_details(format!("chained from {}", task.id())),
            )
            .await?;
        }
        Ok(outcome)
    }

    /// Lists tasks matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> BoardServiceResult<Vec<Task>> {
        Ok(self.tasks().list(filter).await?)
    }

    /// Finds a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn get_task(&self, task_id: &TaskId) -> BoardServiceResult<Option<Task>> {
        Ok(self.tasks().get(task_id.as_str()).await?)
    }

    /// Registers a new agent.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::DuplicateAgent`] when the identifier is
    /// already registered, or a store or audit failure.
    pub async fn register_agent(&self, agent: Agent) -> BoardServiceResult<Agent> {
        if self.agents().get(agent.id().as_str()).await?.is_some() {
            return Err(BoardServiceError::DuplicateAgent(agent.id().clone()));
        }
        let registered = self.agents().create(agent).await?;
        info!(agent_id = %registered.id(), role = registered.role(), "agent registered");
        self.record(
            self.entry(registered.id().as_str(), AuditAction::AgentRegistered)
                .with_details(format!("{} ({})", registered.name(), registered.role())),
        )
        .await?;
        Ok(registered)
    }

    /// Updates agent fields.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::AgentNotFound`] when the agent does not
    /// exist, or a store or audit failure.
    pub async fn update_agent(
        &self,
        actor: &str,
        agent_id: &AgentId,
        patch: AgentPatch,
    ) -> BoardServiceResult<Agent> {
        let agent = self
            .agents()
            .update(agent_id.as_str(), patch)
            .await?
            .ok_or_else(|| BoardServiceError::AgentNotFound(agent_id.clone()))?;
        self.record(
            self.entry(actor, AuditAction::AgentUpdated)
                .with_details(format!("agent {agent_id} is {}", agent.status())),
        )
        .await?;
        Ok(agent)
    }

    /// Lists agents matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn list_agents(&self, filter: &AgentFilter) -> BoardServiceResult<Vec<Agent>> {
        Ok(self.agents().list(filter).await?)
    }

    /// Finds an agent by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Store`] when the store cannot be read.
    pub async fn get_agent(&self, agent_id: &AgentId) -> BoardServiceResult<Option<Agent>> {
        Ok(self.agents().get(agent_id.as_str()).await?)
    }

    /// Returns audit entries matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BoardServiceError::Audit`] when the ledger cannot be read.
    pub async fn history(&self, query: &AuditQuery) -> BoardServiceResult<Vec<AuditEntry>> {
        Ok(self.ledger.query(query).await?)
    }
}
