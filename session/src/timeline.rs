//! Timeline Session
//!
//! Orchestrates the request coalescer, the repository client and the
//! turnover analyzer for one universe + filter pair, and exposes the result
//! as observable state for a presentation layer.
//!
//! State machine: `Idle → Loading → {Ready, Failed}`. `Ready`/`Failed` move
//! back to `Loading` only on an explicit refetch or a filter/universe
//! change, never on their own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, warn};

use analytics::{TurnoverAnalysis, analyze_turnover};
use client::{ClientError, UniverseRepository};
use model::{Snapshot, TimelineFilter, TimelineMetadata};

use crate::coalesce::{FetchOutcome, RequestCoalescer, RequestKey};
use crate::error::{TIMELINE_FETCH_FAILED, user_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Observable session state. Cloned out on read; the presentation layer
/// never holds a live reference into the session.
#[derive(Debug, Clone)]
pub struct TimelineState {
    pub phase: Phase,
    pub snapshots: Vec<Snapshot>,
    pub metadata: Option<TimelineMetadata>,
    pub analysis: Option<TurnoverAnalysis>,
    pub error: Option<String>,
}

impl Default for TimelineState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            snapshots: Vec::new(),
            metadata: None,
            analysis: None,
            error: None,
        }
    }
}

pub struct TimelineSession<R: UniverseRepository> {
    repo: Arc<R>,
    coalescer: Arc<RequestCoalescer>,

    universe_id: Mutex<String>,
    filter: Mutex<TimelineFilter>,
    state: Mutex<TimelineState>,

    /// Bumped on every filter/universe change; an in-flight fetch whose
    /// generation no longer matches discards its result.
    generation: AtomicU64,
    /// Cleared on shutdown; a completion arriving afterwards is a no-op.
    alive: AtomicBool,
}

impl<R: UniverseRepository> TimelineSession<R> {
    /// When no filter is given, the default window (trailing 6 months,
    /// monthly) is fixed at construction time and not re-derived on
    /// later fetches.
    pub fn new(
        repo: Arc<R>,
        coalescer: Arc<RequestCoalescer>,
        universe_id: impl Into<String>,
        filter: Option<TimelineFilter>,
    ) -> Self {
        let filter =
            filter.unwrap_or_else(|| TimelineFilter::default_window(Utc::now().date_naive()));

        Self {
            repo,
            coalescer,
            universe_id: Mutex::new(universe_id.into()),
            filter: Mutex::new(filter),
            state: Mutex::new(TimelineState::default()),
            generation: AtomicU64::new(0),
            alive: AtomicBool::new(true),
        }
    }

    /// Fetch the timeline for the current universe + filter.
    ///
    /// A no-op while an identical fetch is in flight or cooling down; the
    /// session state is left untouched in that case.
    pub async fn load(&self) {
        self.fetch(false).await;
    }

    /// Manual refresh: bypasses the cool-down only. A refetch concurrent
    /// with an active fetch for the same key is still a no-op.
    pub async fn refetch(&self) {
        self.fetch(true).await;
    }

    async fn fetch(&self, bypass_cooldown: bool) {
        let (universe_id, filter) = {
            (self.universe_id.lock().clone(), self.filter.lock().clone())
        };
        let key = RequestKey::timeline(&universe_id, &filter);

        let acquired = if bypass_cooldown {
            self.coalescer.reacquire(&key)
        } else {
            self.coalescer.acquire(&key)
        };

        if !acquired {
            debug!(universe_id = %universe_id, "duplicate timeline fetch suppressed");
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        self.state.lock().phase = Phase::Loading;

        let result = self.repo.get_timeline(&universe_id, &filter).await;

        let outcome = match result {
            Ok(_) => FetchOutcome::Success,
            Err(_) => FetchOutcome::Failure,
        };
        self.coalescer.release(&key, outcome);

        // Torn-down or superseded sessions must not mutate state.
        if !self.alive.load(Ordering::SeqCst)
            || self.generation.load(Ordering::SeqCst) != generation
        {
            debug!(universe_id = %universe_id, "stale timeline result discarded");
            return;
        }

        match result {
            Ok(data) => self.apply_success(&filter, data.snapshots, data.metadata),
            Err(err) => self.apply_failure(&universe_id, err),
        }
    }

    fn apply_success(
        &self,
        filter: &TimelineFilter,
        snapshots: Vec<Snapshot>,
        metadata: TimelineMetadata,
    ) {
        let analysis = if filter.include_turnover_analysis {
            // Too little data is not an error at the session level; the
            // analysis panel simply stays empty.
            analyze_turnover(&snapshots).ok()
        } else {
            None
        };

        let mut state = self.state.lock();
        state.snapshots = snapshots;
        state.metadata = Some(metadata);
        state.analysis = analysis;
        state.error = None;
        state.phase = Phase::Ready;
    }

    /// Failures clear all previously displayed data: stale analysis must
    /// never sit next to a fresh error.
    fn apply_failure(&self, universe_id: &str, err: ClientError) {
        warn!(universe_id = %universe_id, error = %err, "timeline fetch failed");

        let mut state = self.state.lock();
        state.snapshots = Vec::new();
        state.metadata = None;
        state.analysis = None;
        state.error = Some(user_message(&err, TIMELINE_FETCH_FAILED));
        state.phase = Phase::Failed;
    }

    /// Swap the filter and fetch under the new key. Any in-flight fetch for
    /// the old key is invalidated.
    pub async fn set_filter(&self, filter: TimelineFilter) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.filter.lock() = filter;
        self.load().await;
    }

    pub async fn set_universe(&self, universe_id: impl Into<String>) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.universe_id.lock() = universe_id.into();
        self.load().await;
    }

    /// Tear the session down. In-flight fetches resolve without touching
    /// state from this point on.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn state(&self) -> TimelineState {
        self.state.lock().clone()
    }

    pub fn filter(&self) -> TimelineFilter {
        self.filter.lock().clone()
    }

    pub fn universe_id(&self) -> String {
        self.universe_id.lock().clone()
    }
}
