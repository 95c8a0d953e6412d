use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::test;

use client::ClientError;
use model::CreateSnapshotRequest;
use session::error::SNAPSHOTS_FETCH_FAILED;
use session::{SessionError, snapshots::SnapshotSession};

use mock_repo::{MockRepo, asset, date, snapshot, snapshot_page};

fn bound_session(repo: Arc<MockRepo>) -> SnapshotSession<MockRepo> {
    SnapshotSession::new(repo, Some("u-1".to_string()))
}

fn create_request() -> CreateSnapshotRequest {
    CreateSnapshotRequest {
        snapshot_date: date(2024, 7, 31),
        assets: vec![asset("AAPL"), asset("NVDA")],
    }
}

#[test]
async fn load_page_populates_list_and_metadata() {
    let repo = Arc::new(MockRepo::default());
    repo.push_page(Ok(snapshot_page(
        vec![
            snapshot("s2", date(2024, 2, 29), Some(0.2)),
            snapshot("s1", date(2024, 1, 31), Some(0.1)),
        ],
        12,
    )));

    let session = bound_session(repo);
    session.load_page(1).await.unwrap();

    let state = session.state();
    assert_eq!(state.snapshots.len(), 2);
    assert_eq!(state.page, 1);
    assert!(!state.loading);

    let metadata = state.metadata.unwrap();
    assert_eq!(metadata.total_snapshots, 12);
    assert_eq!(metadata.latest_snapshot_date, Some(date(2024, 2, 29)));
}

#[test]
async fn load_page_failure_records_message() {
    let repo = Arc::new(MockRepo::default());
    repo.push_page(Err(ClientError::MissingPayload));

    let session = bound_session(repo);
    assert!(session.load_page(1).await.is_err());

    let state = session.state();
    assert_eq!(state.error.as_deref(), Some(SNAPSHOTS_FETCH_FAILED));
    assert!(!state.loading);
}

#[test]
async fn operations_without_a_bound_universe_fail() {
    let repo = Arc::new(MockRepo::default());
    let session = SnapshotSession::new(repo.clone(), None);

    assert!(matches!(
        session.load_page(1).await,
        Err(SessionError::MissingUniverse)
    ));
    assert!(matches!(
        session.create(&create_request()).await,
        Err(SessionError::MissingUniverse)
    ));

    // The repository must never be touched on that path.
    assert_eq!(repo.page_calls.load(Ordering::SeqCst), 0);
    assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
}

#[test]
async fn create_prepends_and_bumps_metadata_without_refetch() {
    let repo = Arc::new(MockRepo::default());
    repo.push_page(Ok(snapshot_page(
        vec![snapshot("s1", date(2024, 6, 30), Some(0.1))],
        7,
    )));

    let session = bound_session(repo.clone());
    session.load_page(1).await.unwrap();

    let created = session.create(&create_request()).await.unwrap();

    let state = session.state();
    assert_eq!(state.snapshots.len(), 2);
    assert_eq!(state.snapshots[0].id, created.id);

    let metadata = state.metadata.unwrap();
    assert_eq!(metadata.total_snapshots, 8);
    assert_eq!(metadata.latest_snapshot_date, Some(date(2024, 7, 31)));

    // One list fetch, one create; no refetch after the create.
    assert_eq!(repo.page_calls.load(Ordering::SeqCst), 1);
    assert_eq!(repo.create_calls.load(Ordering::SeqCst), 1);
}

#[test]
async fn create_failure_leaves_prior_state_untouched() {
    let repo = Arc::new(MockRepo::default());
    repo.push_page(Ok(snapshot_page(
        vec![snapshot("s1", date(2024, 6, 30), Some(0.1))],
        7,
    )));
    repo.push_create(Err(ClientError::Upstream("duplicate snapshot".to_string())));

    let session = bound_session(repo);
    session.load_page(1).await.unwrap();

    let err = session.create(&create_request()).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Client(ClientError::Upstream(_))
    ));

    let state = session.state();
    assert_eq!(state.snapshots.len(), 1);
    assert_eq!(state.metadata.as_ref().unwrap().total_snapshots, 7);
    assert_eq!(state.error.as_deref(), Some("duplicate snapshot"));
}

#[test]
async fn binding_a_universe_later_enables_creates() {
    let repo = Arc::new(MockRepo::default());
    let session = SnapshotSession::new(repo, None);

    session.bind_universe("u-9");
    let created = session.create(&create_request()).await.unwrap();

    assert_eq!(created.universe_id, "u-9");
    assert_eq!(session.state().metadata.unwrap().total_snapshots, 1);
}
