//! Store contract tests against the in-memory adapter.

use std::sync::Arc;

use crate::board::{
    adapters::memory::InMemoryBoardStore,
    domain::{
        Agent, AgentFilter, AgentPatch, AgentStatus, Column, NewComment, NewProject, NewTask,
        Project, ProjectFilter, Task, TaskFilter, TaskPatch,
    },
    ports::{Collection, RecordStore, StoreError, TaskStore},
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestStore = InMemoryBoardStore<DefaultClock>;

#[fixture]
fn store() -> TestStore {
    InMemoryBoardStore::new(Arc::new(DefaultClock))
}

fn task(title: &str) -> Task {
    Task::new(NewTask::new("project-1", title), &DefaultClock).expect("valid task")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_returns_records_in_insertion_order(store: TestStore) -> eyre::Result<()> {
    for title in ["first", "second", "third"] {
        RecordStore::<Task>::create(&store, task(title)).await?;
    }
    let titles: Vec<String> = RecordStore::<Task>::list(&store, &TaskFilter::all())
        .await?
        .iter()
        .map(|stored| stored.title().to_owned())
        .collect();
    ensure!(titles == ["first", "second", "third"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_applies_filters(store: TestStore) -> eyre::Result<()> {
    let todo = Task::new(
        NewTask::new("project-1", "Ship it")
            .with_column(Column::Todo)
            .with_assignee("alice")
            .with_tags(["release".to_owned()]),
        &DefaultClock,
    )?;
    RecordStore::<Task>::create(&store, todo.clone()).await?;
    RecordStore::<Task>::create(&store, task("Backlog item")).await?;

    let filter = TaskFilter {
        column: Some(Column::Todo),
        assignee: Some("alice".to_owned()),
        tag: Some("release".to_owned()),
        title_contains: Some("SHIP".to_owned()),
        ..TaskFilter::all()
    };
    let found = RecordStore::<Task>::list(&store, &filter).await?;
    ensure!(found == vec![todo]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_duplicate_task_ids(store: TestStore) -> eyre::Result<()> {
    let original = task("Once");
    RecordStore::<Task>::create(&store, original.clone()).await?;

    let result = RecordStore::<Task>::create(&store, original.clone()).await;
    let Err(StoreError::Duplicate { collection, id }) = result else {
        bail!("expected duplicate error, got {result:?}");
    };
    ensure!(collection == Collection::Tasks);
    ensure!(id == original.id().as_str());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_upserts_agents(store: TestStore) -> eyre::Result<()> {
    let first = Agent::new("agent-1", "Builder", "developer", &DefaultClock)?;
    let renamed = Agent::new("agent-1", "Builder v2", "developer", &DefaultClock)?;
    RecordStore::<Agent>::create(&store, first).await?;
    RecordStore::<Agent>::create(&store, renamed).await?;

    let agents = RecordStore::<Agent>::list(&store, &AgentFilter::all()).await?;
    ensure!(agents.len() == 1);
    ensure!(agents.iter().all(|agent| agent.name() == "Builder v2"));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_keeps_status_mirrored_and_bumps_timestamp(store: TestStore) -> eyre::Result<()> {
    let created = RecordStore::<Task>::create(&store, task("Mirror")).await?;
    ensure!(created.status() == created.column());

    let patch = TaskPatch {
        status: Some(Column::Review),
        ..TaskPatch::default()
    };
    let Some(updated) = RecordStore::<Task>::update(&store, created.id().as_str(), patch).await?
    else {
        bail!("task should exist");
    };
    ensure!(updated.column() == Column::Review);
    ensure!(updated.status() == Column::Review);
    ensure!(updated.updated_at() >= created.updated_at());

    let reloaded = RecordStore::<Task>::get(&store, created.id().as_str()).await?;
    ensure!(reloaded == Some(updated));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn update_and_delete_report_missing_records(store: TestStore) -> eyre::Result<()> {
    let updated = RecordStore::<Project>::update(&store, "missing", Default::default()).await?;
    ensure!(updated.is_none());
    ensure!(!RecordStore::<Project>::delete(&store, "missing").await?);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_task_strips_it_from_dependents(store: TestStore) -> eyre::Result<()> {
    let blocker = RecordStore::<Task>::create(&store, task("Blocker")).await?;
    let keep = RecordStore::<Task>::create(&store, task("Keep")).await?;
    let pending = Task::new(
        NewTask::new("project-1", "Dependent")
            .with_dependencies([blocker.id().clone(), keep.id().clone()]),
        &DefaultClock,
    )?;
    let dependent = RecordStore::<Task>::create(&store, pending).await?;

    ensure!(RecordStore::<Task>::delete(&store, blocker.id().as_str()).await?);

    let Some(reloaded) = RecordStore::<Task>::get(&store, dependent.id().as_str()).await? else {
        bail!("dependent should survive");
    };
    ensure!(reloaded.dependencies() == [keep.id().clone()]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_matching_removes_every_match_and_detaches_them(
    store: TestStore,
) -> eyre::Result<()> {
    let pending_finished = Task::new(
        NewTask::new("project-1", "Finished").with_column(Column::Done),
        &DefaultClock,
    )?;
    let finished = RecordStore::<Task>::create(&store, pending_finished).await?;
    let shipped = Task::new(
        NewTask::new("project-1", "Shipped").with_column(Column::Done),
        &DefaultClock,
    )?;
    RecordStore::<Task>::create(&store, shipped).await?;
    let pending_open = Task::new(
        NewTask::new("project-1", "Open").with_dependencies([finished.id().clone()]),
        &DefaultClock,
    )?;
    let open = RecordStore::<Task>::create(&store, pending_open).await?;

    let done = TaskFilter::in_column(Column::Done);
    ensure!(RecordStore::<Task>::delete_matching(&store, &done).await? == 2);
    ensure!(RecordStore::<Task>::delete_matching(&store, &done).await? == 0);

    let remaining = RecordStore::<Task>::list(&store, &TaskFilter::all()).await?;
    ensure!(remaining.len() == 1);
    let Some(survivor) = remaining.first() else {
        bail!("open task should survive");
    };
    ensure!(survivor.id() == open.id());
    ensure!(survivor.dependencies().is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn append_comment_stamps_and_orders_comments(store: TestStore) -> eyre::Result<()> {
    let created = RecordStore::<Task>::create(&store, task("Discuss")).await?;
    store
        .append_comment(created.id(), NewComment::new("alice", "first")?)
        .await?;
    let Some(updated) = store
        .append_comment(created.id(), NewComment::new("bob", "second")?)
        .await?
    else {
        bail!("task should exist");
    };

    let texts: Vec<&str> = updated
        .comments()
        .iter()
        .map(|comment| comment.text.as_str())
        .collect();
    ensure!(texts == ["first", "second"]);
    let latest = updated
        .comments()
        .last()
        .map(|comment| comment.timestamp);
    ensure!(latest == Some(updated.updated_at()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn append_comment_on_missing_task_returns_none(store: TestStore) -> eyre::Result<()> {
    let result = store
        .append_comment(&"missing".into(), NewComment::system("hello"))
        .await?;
    ensure!(result.is_none());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn collections_are_independent(store: TestStore) -> eyre::Result<()> {
    let project = Project::new(NewProject::new("Board"), &DefaultClock)?;
    RecordStore::<Project>::create(&store, project).await?;
    let agent = Agent::new("agent-1", "Runner", "ops", &DefaultClock)?;
    RecordStore::<Agent>::create(&store, agent).await?;

    let patch = AgentPatch::status(AgentStatus::Offline);
    let updated = RecordStore::<Agent>::update(&store, "agent-1", patch).await?;
    ensure!(updated.is_some_and(|agent| agent.status() == AgentStatus::Offline));
    ensure!(RecordStore::<Project>::list(&store, &ProjectFilter::all()).await?.len() == 1);
    ensure!(RecordStore::<Task>::list(&store, &TaskFilter::all()).await?.is_empty());
    Ok(())
}
