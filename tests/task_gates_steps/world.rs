//! Shared world state for task gate BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskboard::audit::adapters::InMemoryAuditLedger;
use taskboard::board::{
    adapters::memory::InMemoryBoardStore,
    domain::{Column, TaskId},
    services::{BoardService, BoardServiceError, MoveOutcome},
};

/// Service type used by the BDD world.
pub type TestBoardService =
    BoardService<InMemoryBoardStore<DefaultClock>, InMemoryAuditLedger, DefaultClock>;

/// Scenario world for task gate behaviour tests.
pub struct GateWorld {
    pub service: TestBoardService,
    pub tasks: HashMap<String, TaskId>,
    pub last_move: Option<Result<MoveOutcome, BoardServiceError>>,
}

impl GateWorld {
    /// Creates a world over an empty board.
    #[must_use]
    pub fn new() -> Self {
        let service = BoardService::new(
            Arc::new(InMemoryBoardStore::new(Arc::new(DefaultClock))),
            Arc::new(InMemoryAuditLedger::new()),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            tasks: HashMap::new(),
            last_move: None,
        }
    }

    /// Looks up the identifier of the task titled `title`.
    ///
    /// # Errors
    ///
    /// Returns an error when no task with that title was created.
    pub fn task_id(&self, title: &str) -> Result<TaskId, eyre::Report> {
        self.tasks
            .get(title)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no task titled {title} in scenario world"))
    }
}

impl Default for GateWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> GateWorld {
    GateWorld::default()
}

/// Parses a column name from a step.
///
/// # Errors
///
/// Returns an error when the name is not a known column.
pub fn column(name: &str) -> Result<Column, eyre::Report> {
    Column::try_from(name).map_err(|err| eyre::eyre!("{err}"))
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
