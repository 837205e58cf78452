//! Board workflows over the file store and JSON Lines ledger.

use std::sync::Arc;

use super::helpers::FileBoard;
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::audit::{AuditAction, AuditQuery, adapters::JsonlAuditLedger};
use taskboard::board::{
    adapters::json_file::JsonFileStore,
    domain::{Column, NewProject, NewTask, Task, TaskFilter, TaskTemplate},
    ports::Collection,
    services::{BoardService, MoveTaskRequest},
};

type FileService = BoardService<JsonFileStore<DefaultClock>, JsonlAuditLedger, DefaultClock>;

async fn service(board: &FileBoard) -> eyre::Result<FileService> {
    let ledger = JsonlAuditLedger::from_config(&board.config).await?;
    Ok(BoardService::from_config(
        Arc::clone(&board.store),
        Arc::new(ledger),
        Arc::new(DefaultClock),
        &board.config,
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn gated_workflow_persists_across_restarts() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let service = service(&board).await?;

    let project = service
        .create_project("lead", NewProject::new("Release"))
        .await?;
    let schema = service
        .create_task("lead", NewTask::new(project.id().clone(), "Schema"))
        .await?;
    let migration = service
        .create_task(
            "lead",
            NewTask::new(project.id().clone(), "Migration")
                .with_dependencies([schema.id().clone()])
                .with_requires_review(true)
                .with_next_task(TaskTemplate::new().with_title("Announce")?),
        )
        .await?;

    let blocked = service
        .move_task("dev", MoveTaskRequest::column(migration.id().clone(), Column::Doing))
        .await;
    ensure!(blocked.is_err());

    service
        .move_task("dev", MoveTaskRequest::column(schema.id().clone(), Column::Done))
        .await?;
    for column in [Column::Doing, Column::Review, Column::Done] {
        service
            .move_task("dev", MoveTaskRequest::column(migration.id().clone(), column))
            .await?;
    }

    let restarted = BoardService::from_config(
        Arc::new(board.reopen().await?),
        Arc::new(JsonlAuditLedger::from_config(&board.config).await?),
        Arc::new(DefaultClock),
        &board.config,
    );
    let Some(done) = restarted.get_task(migration.id()).await? else {
        bail!("migration should persist");
    };
    ensure!(done.column() == Column::Done);
    ensure!(done.duration_ms().is_some());
    ensure!(done.comments().iter().any(|comment| comment.is_system()));

    let tasks = restarted
        .list_tasks(&taskboard::board::domain::TaskFilter::for_project(
            project.id().clone(),
        ))
        .await?;
    ensure!(tasks.len() == 3);
    ensure!(tasks
        .iter()
        .any(|task| task.title() == "Announce" && task.parent_task_id() == Some(migration.id())));

    let history = restarted
        .history(&AuditQuery::for_task(migration.id().clone()))
        .await?;
    let moves = history
        .iter()
        .filter(|entry| entry.action() == AuditAction::TaskMoved)
        .count();
    ensure!(moves == 3);
    ensure!(board.config.ledger_path().exists());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_cascade_keeps_a_restorable_snapshot() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let service = service(&board).await?;
    let project = service
        .create_project("lead", NewProject::new("Sunset"))
        .await?;
    for n in 0..55 {
        service
            .create_task("lead", NewTask::new(project.id().clone(), format!("task {n}")))
            .await?;
    }
    let retained_before = board.store.backups(Collection::Tasks).await?;

    let removed = service.delete_project("lead", project.id()).await?;
    ensure!(removed == 55);
    ensure!(service.list_tasks(&TaskFilter::all()).await?.is_empty());

    let backups = board.store.backups(Collection::Tasks).await?;
    ensure!(backups.len() == retained_before.len());
    let Some(newest) = backups.last() else {
        bail!("the cascade should leave a backup");
    };
    let snapshot: Vec<Task> = serde_json::from_str(&std::fs::read_to_string(newest)?)?;
    ensure!(snapshot.len() == 55);
    ensure!(snapshot.iter().all(|task| task.project_id() == project.id()));
    Ok(())
}
