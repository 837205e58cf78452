//! Dependency cycle detection.

use super::{Task, TaskId};
use std::collections::{HashMap, HashSet};

/// Reports whether giving `task_id` the dependency list `proposed` would
/// close a cycle.
///
/// The walk starts at each proposed dependency and follows the current
/// dependency lists of `tasks`. It answers `true` as soon as `task_id` is
/// reached, which includes a task proposing itself. Identifiers with no
/// matching task are leaves.
#[must_use]
pub fn would_cycle(task_id: &TaskId, proposed: &[TaskId], tasks: &[Task]) -> bool {
    let edges: HashMap<&str, &[TaskId]> = tasks
        .iter()
        .map(|task| (task.id().as_str(), task.dependencies()))
        .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut pending: Vec<&str> = proposed.iter().map(TaskId::as_str).collect();

    while let Some(current) = pending.pop() {
        if current == task_id.as_str() {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(current) {
            pending.extend(next.iter().map(TaskId::as_str));
        }
    }
    false
}
