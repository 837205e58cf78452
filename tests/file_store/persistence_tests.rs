//! Collection file format and failure handling.

use super::helpers::FileBoard;
use eyre::{bail, ensure};
use rstest::rstest;
use taskboard::board::{
    domain::{Column, Project, Task, TaskFilter, TaskPatch},
    ports::{Collection, RecordStore, StoreError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn collections_are_created_on_first_access() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let tasks_path = board.store.collection_path(Collection::Tasks);
    ensure!(!tasks_path.exists());

    let tasks = RecordStore::<Task>::list(&*board.store, &TaskFilter::all()).await?;
    ensure!(tasks.is_empty());
    ensure!(std::fs::read_to_string(&tasks_path)? == "[]\n");
    ensure!(!board.store.collection_path(Collection::Projects).exists());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn documents_are_pretty_camel_case_arrays() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let task = board.add_task("Format check").await?;

    let contents = std::fs::read_to_string(board.store.collection_path(Collection::Tasks))?;
    ensure!(contents.starts_with("[\n"));
    ensure!(contents.ends_with("]\n"));
    ensure!(contents.contains("\"projectId\": \"p\""));
    ensure!(contents.contains("\"column\": \"backlog\""));
    ensure!(contents.contains("\"status\": \"backlog\""));

    let parsed: Vec<Task> = serde_json::from_str(&contents)?;
    ensure!(parsed == vec![task]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn writes_survive_reopening() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let task = board.add_task("Durable").await?;
    RecordStore::<Task>::update(&*board.store, task.id().as_str(), TaskPatch::column(Column::Todo))
        .await?;

    let reopened = board.reopen().await?;
    let found = RecordStore::<Task>::get(&reopened, task.id().as_str()).await?;
    ensure!(found.is_some_and(|stored| stored.column() == Column::Todo));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn corrupt_collections_are_reported_and_left_alone() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let path = board.store.collection_path(Collection::Tasks);
    std::fs::write(&path, "[{\"id\": ")?;

    let listed = RecordStore::<Task>::list(&*board.store, &TaskFilter::all()).await;
    let Err(StoreError::Corrupt { collection, .. }) = listed else {
        bail!("expected corrupt collection, got {listed:?}");
    };
    ensure!(collection == Collection::Tasks);

    let created = board.add_task("Blocked by corruption").await;
    ensure!(created.is_err());
    ensure!(std::fs::read_to_string(&path)? == "[{\"id\": ");
    ensure!(board.store.backups(Collection::Tasks).await?.is_empty());

    let projects = RecordStore::<Project>::list(
        &*board.store,
        &taskboard::board::domain::ProjectFilter::all(),
    )
    .await?;
    ensure!(projects.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn no_temporary_files_remain_after_writes() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    for title in ["one", "two", "three"] {
        board.add_task(title).await?;
    }
    let leftovers = std::fs::read_dir(board.store.data_dir())?
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
        .count();
    ensure!(leftovers == 0);
    Ok(())
}
