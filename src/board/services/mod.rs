//! Application services for the board.

mod board;
mod lifecycle;

pub use board::{BoardService, BoardServiceError, BoardServiceResult};
pub use lifecycle::{
    DependencyBlocker, MoveOutcome, MoveTaskRequest, TaskLifecycleError, TaskLifecycleResult,
    TaskLifecycleService,
};
