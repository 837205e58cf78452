//! Given steps for task gate scenarios.

use super::world::{GateWorld, column, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskboard::board::domain::NewTask;

fn create(world: &mut GateWorld, title: &str, request: NewTask) -> Result<(), eyre::Report> {
    let task = run_async(world.service.create_task("scenario", request))
        .wrap_err_with(|| format!("create task {title}"))?;
    world.tasks.insert(title.to_owned(), task.id().clone());
    Ok(())
}

#[given(r#"a task "{title}" in column "{name}""#)]
fn task_in_column(world: &mut GateWorld, title: String, name: String) -> Result<(), eyre::Report> {
    let request = NewTask::new("project", title.as_str()).with_column(column(&name)?);
    create(world, &title, request)
}

#[given(r#"a task "{title}" that depends on "{dependency}""#)]
fn task_with_dependency(
    world: &mut GateWorld,
    title: String,
    dependency: String,
) -> Result<(), eyre::Report> {
    let dependency_id = world.task_id(&dependency)?;
    let request = NewTask::new("project", title.as_str()).with_dependencies([dependency_id]);
    create(world, &title, request)
}

#[given(r#"a review-gated task "{title}" in column "{name}""#)]
fn review_gated_task(world: &mut GateWorld, title: String, name: String) -> Result<(), eyre::Report> {
    let request = NewTask::new("project", title.as_str())
        .with_column(column(&name)?)
        .with_requires_review(true);
    create(world, &title, request)
}

#[given(r#"a retrying task "{title}" allowing {retries:u32} retry in column "{name}""#)]
fn task_with_retry_budget(
    world: &mut GateWorld,
    title: String,
    retries: u32,
    name: String,
) -> Result<(), eyre::Report> {
    let request = NewTask::new("project", title.as_str())
        .with_column(column(&name)?)
        .with_max_retries(retries);
    create(world, &title, request)
}
