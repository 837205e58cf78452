//! Domain model for the task board.
//!
//! Projects, tasks, and agents are plain aggregates with no knowledge of how
//! they are stored. Lifecycle rules that need more than one task live in the
//! services layer; rules about a single task live here.

mod agent;
mod column;
mod error;
mod filter;
mod graph;
mod ids;
mod project;
mod task;
mod template;

pub use agent::{Agent, AgentPatch, AgentStatus};
pub use column::{Column, Priority};
pub use error::{BoardDomainError, ParseColumnError, ParsePriorityError, ParseStatusError};
pub use filter::{AgentFilter, ProjectFilter, TaskFilter};
pub use graph::would_cycle;
pub use ids::{AgentId, ProjectId, TaskId};
pub use project::{
    ClientTaskView, NewProject, Project, ProjectClientView, ProjectPatch, ProjectStatus,
};
pub use task::{
    Comment, DEFAULT_MAX_RETRIES, NewComment, NewTask, SYSTEM_AUTHOR, Task, TaskPatch,
};
pub use template::TaskTemplate;
