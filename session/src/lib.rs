pub mod backfill;
pub mod coalesce;
pub mod composition;
pub mod error;
pub mod snapshots;
pub mod timeline;

pub use backfill::{BackfillSession, BackfillState};
pub use coalesce::{FetchOutcome, RequestCoalescer, RequestKey};
pub use composition::{CompositionSession, LookupState};
pub use error::SessionError;
pub use snapshots::{SnapshotListState, SnapshotSession};
pub use timeline::{Phase, TimelineSession, TimelineState};
