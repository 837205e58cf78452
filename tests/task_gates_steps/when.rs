//! When steps for task gate scenarios.

use super::world::{GateWorld, run_async};
use rstest_bdd_macros::when;
use taskboard::board::services::MoveTaskRequest;

#[when(r#""{title}" is moved to "{target}""#)]
fn move_task(world: &mut GateWorld, title: String, target: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    let result = run_async(
        world
            .service
            .move_task("scenario", MoveTaskRequest::new(task_id, target)),
    );
    world.last_move = Some(result);
    Ok(())
}
