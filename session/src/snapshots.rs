//! Snapshot Session
//!
//! Paginated snapshot listing plus creation of new snapshots. The list is
//! kept most-recent-first by insertion; a successful create is applied as an
//! optimistic local update (prepend + metadata bump) instead of a refetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use client::UniverseRepository;
use model::{CreateSnapshotRequest, Snapshot, SnapshotPageMetadata};

use crate::error::{
    SNAPSHOT_CREATE_FAILED, SNAPSHOTS_FETCH_FAILED, SessionError, user_message,
};

pub const DEFAULT_PER_PAGE: u32 = 20;

#[derive(Debug, Clone)]
pub struct SnapshotListState {
    pub snapshots: Vec<Snapshot>,
    pub metadata: Option<SnapshotPageMetadata>,
    pub page: u32,
    pub per_page: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for SnapshotListState {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            metadata: None,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            loading: false,
            error: None,
        }
    }
}

pub struct SnapshotSession<R: UniverseRepository> {
    repo: Arc<R>,
    universe_id: Mutex<Option<String>>,
    state: Mutex<SnapshotListState>,
    alive: AtomicBool,
}

impl<R: UniverseRepository> SnapshotSession<R> {
    pub fn new(repo: Arc<R>, universe_id: Option<String>) -> Self {
        Self {
            repo,
            universe_id: Mutex::new(universe_id),
            state: Mutex::new(SnapshotListState::default()),
            alive: AtomicBool::new(true),
        }
    }

    fn bound_universe(&self) -> Result<String, SessionError> {
        self.universe_id
            .lock()
            .clone()
            .ok_or(SessionError::MissingUniverse)
    }

    /// Load one page of the snapshot listing.
    pub async fn load_page(&self, page: u32) -> Result<(), SessionError> {
        let universe_id = self.bound_universe()?;
        let per_page = {
            let mut state = self.state.lock();
            state.loading = true;
            state.per_page
        };

        let result = self.repo.get_snapshots(&universe_id, page, per_page).await;

        if !self.alive.load(Ordering::SeqCst) {
            return Ok(());
        }

        match result {
            Ok(page_data) => {
                let mut state = self.state.lock();
                state.snapshots = page_data.snapshots;
                state.metadata = Some(page_data.metadata);
                state.page = page;
                state.error = None;
                state.loading = false;
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.lock();
                state.error = Some(user_message(&err, SNAPSHOTS_FETCH_FAILED));
                state.loading = false;
                Err(err.into())
            }
        }
    }

    /// Create a snapshot and apply it locally without a refetch.
    ///
    /// On success the new snapshot is prepended (newest creation assumed
    /// most recent; the list is not re-sorted), `total_snapshots` grows by
    /// exactly one and `latest_snapshot_date` takes the new snapshot's date.
    /// On failure prior list state is left untouched.
    pub async fn create(&self, request: &CreateSnapshotRequest) -> Result<Snapshot, SessionError> {
        let universe_id = self.bound_universe()?;

        match self.repo.create_snapshot(&universe_id, request).await {
            Ok(created) => {
                if self.alive.load(Ordering::SeqCst) {
                    let mut state = self.state.lock();
                    state.snapshots.insert(0, created.clone());

                    let metadata = state
                        .metadata
                        .get_or_insert_with(SnapshotPageMetadata::default);
                    metadata.total_snapshots += 1;
                    metadata.latest_snapshot_date = Some(created.snapshot_date);

                    state.error = None;
                }

                debug!(universe_id = %universe_id, snapshot_id = %created.id, "snapshot created");
                Ok(created)
            }
            Err(err) => {
                warn!(universe_id = %universe_id, error = %err, "snapshot creation failed");

                if self.alive.load(Ordering::SeqCst) {
                    self.state.lock().error = Some(user_message(&err, SNAPSHOT_CREATE_FAILED));
                }

                Err(err.into())
            }
        }
    }

    pub fn bind_universe(&self, universe_id: impl Into<String>) {
        *self.universe_id.lock() = Some(universe_id.into());
    }

    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    pub fn state(&self) -> SnapshotListState {
        self.state.lock().clone()
    }
}
