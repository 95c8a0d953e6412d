use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::test;

use client::ClientError;
use model::{DateRange, Frequency, TimelineFilter};
use session::error::TIMELINE_FETCH_FAILED;
use session::{Phase, RequestCoalescer, TimelineSession};

use mock_repo::{MockRepo, date, snapshot, timeline_data};

fn filter_for(start: chrono::NaiveDate, end: chrono::NaiveDate) -> TimelineFilter {
    TimelineFilter {
        date_range: DateRange {
            start_date: start,
            end_date: end,
        },
        frequency: Frequency::Monthly,
        show_empty_periods: false,
        include_turnover_analysis: true,
    }
}

fn default_session(repo: Arc<MockRepo>) -> TimelineSession<MockRepo> {
    let filter = filter_for(date(2024, 1, 1), date(2024, 6, 30));
    TimelineSession::new(repo, Arc::new(RequestCoalescer::new()), "u-1", Some(filter))
}

fn two_snapshots() -> Vec<model::Snapshot> {
    vec![
        snapshot("s1", date(2024, 1, 31), Some(0.1)),
        snapshot("s2", date(2024, 2, 29), Some(0.2)),
    ]
}

#[test(start_paused = true)]
async fn concurrent_identical_fetches_hit_the_repository_once() {
    let repo = Arc::new(MockRepo::default());
    repo.set_timeline_delay(Duration::from_millis(50));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = default_session(repo.clone());

    tokio::join!(session.load(), session.load());

    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 1);

    let state = session.state();
    assert_eq!(state.phase, Phase::Ready);
    assert_eq!(state.snapshots.len(), 2);
    assert!(state.error.is_none());
}

#[test(start_paused = true)]
async fn different_filters_fetch_independently() {
    let repo = Arc::new(MockRepo::default());
    repo.set_timeline_delay(Duration::from_millis(50));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let coalescer = Arc::new(RequestCoalescer::new());

    let a = TimelineSession::new(
        repo.clone(),
        coalescer.clone(),
        "u-1",
        Some(filter_for(date(2024, 1, 1), date(2024, 6, 30))),
    );
    let b = TimelineSession::new(
        repo.clone(),
        coalescer.clone(),
        "u-1",
        Some(filter_for(date(2023, 1, 1), date(2023, 6, 30))),
    );

    tokio::join!(a.load(), b.load());

    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 2);
    assert_eq!(a.state().phase, Phase::Ready);
    assert_eq!(b.state().phase, Phase::Ready);
}

#[test]
async fn successful_load_computes_turnover_analysis() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = default_session(repo);
    session.load().await;

    let analysis = session.state().analysis.expect("analysis should be present");
    assert!((analysis.average_turnover_rate - 0.15).abs() < 1e-12);
}

#[test]
async fn analysis_is_skipped_when_filter_excludes_it() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let mut filter = filter_for(date(2024, 1, 1), date(2024, 6, 30));
    filter.include_turnover_analysis = false;

    let session = TimelineSession::new(
        repo,
        Arc::new(RequestCoalescer::new()),
        "u-1",
        Some(filter),
    );
    session.load().await;

    let state = session.state();
    assert_eq!(state.phase, Phase::Ready);
    assert!(state.analysis.is_none());
}

#[test(start_paused = true)]
async fn upstream_failure_clears_previous_data() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Ok(timeline_data(two_snapshots())));
    repo.push_timeline(Err(ClientError::Upstream("universe not found".to_string())));

    let session = default_session(repo);

    session.load().await;
    assert_eq!(session.state().phase, Phase::Ready);

    // refetch bypasses the cool-down left by the successful load
    session.refetch().await;

    let state = session.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state.snapshots.is_empty());
    assert!(state.metadata.is_none());
    assert!(state.analysis.is_none());
    assert_eq!(state.error.as_deref(), Some("universe not found"));
}

#[test]
async fn transport_failure_uses_generic_message() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Err(ClientError::MissingPayload));

    let session = default_session(repo);
    session.load().await;

    let state = session.state();
    assert_eq!(state.phase, Phase::Failed);
    assert_eq!(state.error.as_deref(), Some(TIMELINE_FETCH_FAILED));
}

#[test(start_paused = true)]
async fn cooldown_suppresses_back_to_back_loads_but_not_refetch() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Ok(timeline_data(two_snapshots())));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = default_session(repo.clone());

    session.load().await;
    session.load().await; // inside the cool-down window
    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 1);

    session.refetch().await;
    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 2);
}

#[test(start_paused = true)]
async fn cooldown_expires_after_the_window() {
    let repo = Arc::new(MockRepo::default());
    repo.push_timeline(Ok(timeline_data(two_snapshots())));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = default_session(repo.clone());

    session.load().await;
    tokio::time::advance(Duration::from_secs(6)).await;

    session.load().await;
    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 2);
}

#[test(start_paused = true)]
async fn completion_after_shutdown_leaves_state_untouched() {
    let repo = Arc::new(MockRepo::default());
    repo.set_timeline_delay(Duration::from_millis(50));
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = Arc::new(default_session(repo));

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.load().await })
    };

    // Let the fetch start and park on the delay.
    tokio::task::yield_now().await;
    assert_eq!(session.state().phase, Phase::Loading);

    session.shutdown();
    tokio::time::advance(Duration::from_millis(60)).await;
    task.await.unwrap();

    let state = session.state();
    assert_eq!(state.phase, Phase::Loading);
    assert!(state.snapshots.is_empty());
    assert!(state.analysis.is_none());
}

#[test(start_paused = true)]
async fn filter_change_invalidates_an_in_flight_fetch() {
    let repo = Arc::new(MockRepo::default());
    repo.set_timeline_delay(Duration::from_millis(50));
    // Popped by the new-filter fetch (runs undelayed, finishes first).
    repo.push_timeline(Ok(timeline_data(vec![
        snapshot("s9", date(2023, 5, 31), Some(0.3)),
        snapshot("s10", date(2023, 6, 30), Some(0.3)),
    ])));
    // Popped by the old in-flight fetch, whose result must be discarded.
    repo.push_timeline(Ok(timeline_data(two_snapshots())));

    let session = Arc::new(default_session(repo.clone()));

    let task = {
        let session = session.clone();
        tokio::spawn(async move { session.load().await })
    };
    // Let the old fetch start and park on its delay.
    tokio::task::yield_now().await;
    repo.clear_timeline_delay();

    session
        .set_filter(filter_for(date(2023, 1, 1), date(2023, 6, 30)))
        .await;

    // Release the old fetch; its completion is stale by now.
    tokio::time::advance(Duration::from_millis(60)).await;
    task.await.unwrap();

    assert_eq!(repo.timeline_calls.load(Ordering::SeqCst), 2);

    let state = session.state();
    assert_eq!(state.phase, Phase::Ready);
    // The surviving state belongs to the new filter's response.
    assert_eq!(state.snapshots[0].id, "s9");
}
