use chrono::NaiveDate;

use model::{
    BackfillOutcome, BackfillRequest, Composition, CreateSnapshotRequest, Snapshot, SnapshotPage,
    TimelineData, TimelineFilter,
};

use crate::error::ClientError;

/// Read/write surface of the external snapshot repository.
///
/// Pure I/O adapter contract: no caching, no deduplication, no derived
/// computation. Sessions hold this behind `Arc<R>` so tests can substitute
/// an in-memory mock.
#[async_trait::async_trait]
pub trait UniverseRepository: Send + Sync {
    /// Ordered snapshot sequence for the filter window.
    async fn get_timeline(
        &self,
        universe_id: &str,
        filter: &TimelineFilter,
    ) -> Result<TimelineData, ClientError>;

    /// One page of the snapshot listing, newest first.
    async fn get_snapshots(
        &self,
        universe_id: &str,
        page: u32,
        per_page: u32,
    ) -> Result<SnapshotPage, ClientError>;

    /// Record a new membership snapshot; returns the created snapshot.
    async fn create_snapshot(
        &self,
        universe_id: &str,
        request: &CreateSnapshotRequest,
    ) -> Result<Snapshot, ClientError>;

    /// Membership at (or nearest before) a specific date.
    async fn composition_at(
        &self,
        universe_id: &str,
        date: NaiveDate,
    ) -> Result<Composition, ClientError>;

    /// Ask the repository to reconstruct historical snapshots.
    async fn backfill_history(
        &self,
        universe_id: &str,
        request: &BackfillRequest,
    ) -> Result<BackfillOutcome, ClientError>;
}
