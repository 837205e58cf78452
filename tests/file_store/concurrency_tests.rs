//! Parallel writers and readers against one data directory.

use std::sync::Arc;

use super::helpers::FileBoard;
use eyre::ensure;
use mockable::DefaultClock;
use rstest::rstest;
use taskboard::board::{
    domain::{NewComment, NewTask, Task, TaskFilter},
    ports::{RecordStore, TaskStore},
};

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_are_all_persisted() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;

    let mut handles = Vec::new();
    for n in 0..25 {
        let store = Arc::clone(&board.store);
        handles.push(tokio::spawn(async move {
            let task = Task::new(NewTask::new("p", format!("parallel {n}")), &DefaultClock)?;
            RecordStore::<Task>::create(&*store, task).await?;
            Ok::<_, eyre::Report>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let reopened = board.reopen().await?;
    let tasks = RecordStore::<Task>::list(&reopened, &TaskFilter::all()).await?;
    ensure!(tasks.len() == 25);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_comments_on_one_task_are_all_kept() -> eyre::Result<()> {
    let board = FileBoard::open(50).await?;
    let task = board.add_task("busy").await?;

    let mut handles = Vec::new();
    for n in 0..20 {
        let store = Arc::clone(&board.store);
        let task_id = task.id().clone();
        handles.push(tokio::spawn(async move {
            let comment = NewComment::new(format!("agent-{n}"), "progress")?;
            store.append_comment(&task_id, comment).await?;
            Ok::<_, eyre::Report>(())
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let stored = RecordStore::<Task>::get(&*board.store, task.id().as_str()).await?;
    ensure!(stored.is_some_and(|found| found.comments().len() == 20));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_partial_documents() -> eyre::Result<()> {
    let board = FileBoard::open(5).await?;
    board.add_task("seed").await?;

    let writer_store = Arc::clone(&board.store);
    let writer = tokio::spawn(async move {
        for n in 0..30 {
            let task = Task::new(NewTask::new("p", format!("write {n}")), &DefaultClock)?;
            RecordStore::<Task>::create(&*writer_store, task).await?;
        }
        Ok::<_, eyre::Report>(())
    });

    let reader_store = Arc::clone(&board.store);
    let reader = tokio::spawn(async move {
        let mut last_seen = 0;
        for _ in 0..60 {
            let tasks = RecordStore::<Task>::list(&*reader_store, &TaskFilter::all()).await?;
            eyre::ensure!(tasks.len() >= last_seen, "task count went backwards");
            last_seen = tasks.len();
            tokio::task::yield_now().await;
        }
        Ok::<_, eyre::Report>(())
    });

    writer.await??;
    reader.await??;
    Ok(())
}
