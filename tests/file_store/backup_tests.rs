//! Backup snapshots and retention.

use super::helpers::FileBoard;
use eyre::{bail, ensure};
use rstest::rstest;
use taskboard::board::{
    domain::{Task, TaskPatch},
    ports::{Collection, RecordStore},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_write_takes_no_backup() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    board.add_task("first").await?;
    ensure!(board.store.backups(Collection::Tasks).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_backup_directory_lists_no_snapshots() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    std::fs::remove_dir(board.config.backup_dir())?;
    ensure!(board.store.backups(Collection::Agents).await?.is_empty());
    ensure!(board.store.backups(Collection::Tasks).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overwrites_snapshot_the_previous_document() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    board.add_task("first").await?;
    let before = std::fs::read_to_string(board.store.collection_path(Collection::Tasks))?;
    board.add_task("second").await?;

    let backups = board.store.backups(Collection::Tasks).await?;
    let [snapshot] = backups.as_slice() else {
        bail!("expected one backup, found {}", backups.len());
    };
    ensure!(std::fs::read_to_string(snapshot)? == before);
    let name = snapshot.file_name().unwrap_or_default();
    ensure!(name.starts_with("tasks-") && name.ends_with(".json"));
    ensure!(snapshot.parent() == Some(board.config.backup_dir().as_path()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unchanged_writes_take_no_backup() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    board.add_task("only").await?;
    let missing = RecordStore::<Task>::update(&*board.store, "missing", TaskPatch::default()).await?;
    ensure!(missing.is_none());
    ensure!(!RecordStore::<Task>::delete(&*board.store, "missing").await?);
    ensure!(board.store.backups(Collection::Tasks).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn retention_keeps_the_newest_snapshots() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    for n in 0..60 {
        board.add_task(&format!("task {n}")).await?;
    }

    let backups = board.store.backups(Collection::Tasks).await?;
    ensure!(backups.len() == 50);

    let Some(newest) = backups.last() else {
        bail!("backups should not be empty");
    };
    let latest: Vec<Task> = serde_json::from_str(&std::fs::read_to_string(newest)?)?;
    ensure!(latest.len() == 59);

    let Some(oldest) = backups.first() else {
        bail!("backups should not be empty");
    };
    let earliest: Vec<Task> = serde_json::from_str(&std::fs::read_to_string(oldest)?)?;
    ensure!(earliest.len() == 10);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn collections_rotate_independently() -> eyre::Result<()> {
    let board = FileBoard::open(2).await?;
    for n in 0..4 {
        board.add_task(&format!("task {n}")).await?;
    }
    ensure!(board.store.backups(Collection::Tasks).await?.len() == 2);
    ensure!(board.store.backups(Collection::Projects).await?.is_empty());
    Ok(())
}
