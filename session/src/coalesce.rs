//! Request Coalescer
//!
//! Keyed in-flight registry that keeps at most one fetch alive per
//! `(universe, filter)` pair and suppresses rapid duplicate triggers with a
//! short cool-down after a success.
//!
//! Not a cache: no response data is stored, only key markers. Single-writer
//! discipline applies: the task that acquired a key is the one that
//! releases it, and sessions always await their fetch to completion so a
//! marked key cannot leak.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use model::TimelineFilter;

/// Cool-down applied after a successful fetch before an identical request
/// may fire again.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Identity of one fetch for deduplication purposes. Keys are namespaced by
/// universe id, so unrelated universes never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub universe_id: String,
    pub query: String,
}

impl RequestKey {
    pub fn timeline(universe_id: &str, filter: &TimelineFilter) -> Self {
        // Canonical field-order rendering; two equal filters always produce
        // the same key.
        let query = format!(
            "timeline:{}:{}:{}:{}:{}",
            filter.date_range.start_date,
            filter.date_range.end_date,
            filter.frequency,
            filter.show_empty_periods,
            filter.include_turnover_analysis,
        );

        Self {
            universe_id: universe_id.to_string(),
            query,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    InFlight,
    CoolingDown(Instant),
}

/// How the guarded fetch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Failure,
}

/// Keyed in-flight / cool-down registry.
///
/// Injected into sessions as `Arc<RequestCoalescer>` rather than held as
/// ambient global state, so tests can assert on its contents directly.
pub struct RequestCoalescer {
    cooldown: Duration,
    entries: Mutex<HashMap<RequestKey, Entry>>,
}

impl RequestCoalescer {
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            cooldown,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Try to claim `key` for a fetch.
    ///
    /// Returns false while an identical fetch is in flight or inside the
    /// cool-down window; the caller must skip its fetch and rely on the
    /// in-flight result (or its own prior state).
    pub fn acquire(&self, key: &RequestKey) -> bool {
        self.try_claim(key, false)
    }

    /// Claim for a manual refresh: ignores the cool-down, but an in-flight
    /// fetch for the same key still suppresses.
    pub fn reacquire(&self, key: &RequestKey) -> bool {
        self.try_claim(key, true)
    }

    fn try_claim(&self, key: &RequestKey, bypass_cooldown: bool) -> bool {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        // Expired cool-downs are swept lazily here rather than by timers.
        entries.retain(|_, e| match e {
            Entry::CoolingDown(until) => *until > now,
            Entry::InFlight => true,
        });

        match entries.get(key) {
            Some(Entry::InFlight) => false,
            Some(Entry::CoolingDown(_)) if !bypass_cooldown => false,
            _ => {
                entries.insert(key.clone(), Entry::InFlight);
                true
            }
        }
    }

    /// Release a previously acquired key.
    ///
    /// Success starts the cool-down window; failure clears immediately so a
    /// failed request is retryable without delay.
    pub fn release(&self, key: &RequestKey, outcome: FetchOutcome) {
        let mut entries = self.entries.lock();

        match outcome {
            FetchOutcome::Success => {
                entries.insert(key.clone(), Entry::CoolingDown(Instant::now() + self.cooldown));
            }
            FetchOutcome::Failure => {
                entries.remove(key);
            }
        }
    }

    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        matches!(self.entries.lock().get(key), Some(Entry::InFlight))
    }

    pub fn is_cooling_down(&self, key: &RequestKey) -> bool {
        match self.entries.lock().get(key) {
            Some(Entry::CoolingDown(until)) => *until > Instant::now(),
            _ => false,
        }
    }

    /// Number of live markers (in-flight or cooling down).
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| match e {
                Entry::CoolingDown(until) => *until > now,
                Entry::InFlight => true,
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RequestCoalescer {
    fn default() -> Self {
        Self::new()
    }
}
