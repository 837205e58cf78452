//! Then steps for task gate scenarios.

use super::world::{GateWorld, column, run_async};
use rstest_bdd_macros::then;
use taskboard::board::{domain::Task, services::BoardServiceError};

fn last_error(world: &GateWorld) -> Result<&BoardServiceError, eyre::Report> {
    match world.last_move.as_ref() {
        Some(Err(err)) => Ok(err),
        Some(Ok(outcome)) => Err(eyre::eyre!(
            "expected the move to fail, but task reached {}",
            outcome.task.column()
        )),
        None => Err(eyre::eyre!("no move attempted in scenario world")),
    }
}

fn stored_task(world: &GateWorld, title: &str) -> Result<Task, eyre::Report> {
    let task_id = world.task_id(title)?;
    run_async(world.service.get_task(&task_id))?
        .ok_or_else(|| eyre::eyre!("task {title} disappeared"))
}

#[then("the move succeeds")]
fn move_succeeds(world: &GateWorld) -> Result<(), eyre::Report> {
    match world.last_move.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("unexpected move failure: {err}")),
        None => Err(eyre::eyre!("no move attempted in scenario world")),
    }
}

#[then(r#"the move is blocked by "{dependency}""#)]
fn move_blocked_by(world: &GateWorld, dependency: String) -> Result<(), eyre::Report> {
    let dependency_id = world.task_id(&dependency)?;
    let BoardServiceError::Lifecycle(err) = last_error(world)? else {
        return Err(eyre::eyre!("expected a lifecycle rejection"));
    };
    let blocked_by: Vec<_> = err.blockers().iter().map(|blocker| &blocker.id).collect();
    if blocked_by != [&dependency_id] {
        return Err(eyre::eyre!(
            "expected block by {dependency_id}, got {blocked_by:?}"
        ));
    }
    Ok(())
}

#[then("the move is rejected pending review")]
fn move_rejected_for_review(world: &GateWorld) -> Result<(), eyre::Report> {
    match last_error(world)? {
        BoardServiceError::Lifecycle(err) if err.requires_review() => Ok(()),
        other => Err(eyre::eyre!("expected a review rejection, got {other}")),
    }
}

#[then(r#""{title}" is in column "{name}""#)]
fn task_in_column(world: &GateWorld, title: String, name: String) -> Result<(), eyre::Report> {
    let expected = column(&name)?;
    let task = stored_task(world, &title)?;
    if task.column() != expected {
        return Err(eyre::eyre!(
            "expected {title} in {expected}, found {}",
            task.column()
        ));
    }
    Ok(())
}

#[then(r#""{title}" is in column "{name}" after {retries:u32} retry"#)]
fn task_in_column_after_retries(
    world: &GateWorld,
    title: String,
    name: String,
    retries: u32,
) -> Result<(), eyre::Report> {
    let expected = column(&name)?;
    let task = stored_task(world, &title)?;
    if task.column() != expected {
        return Err(eyre::eyre!(
            "expected {title} in {expected}, found {}",
            task.column()
        ));
    }
    if task.retry_count() != retries {
        return Err(eyre::eyre!(
            "expected {retries} retries, found {}",
            task.retry_count()
        ));
    }
    Ok(())
}
