use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// One member of a universe at a given snapshot date.
///
/// Symbols are unique within a snapshot; identity is plain case-sensitive
/// string equality, exactly as stored upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub sector: Option<String>,
    pub weight: Option<f64>,
}

/// Universe membership recorded at one point in time.
///
/// Snapshots are produced upstream (explicit creation or backfill) and are
/// immutable from this side. `assets_added` / `assets_removed` describe the
/// delta versus the immediately preceding snapshot; they are trusted input
/// and never re-derived here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub universe_id: String,
    pub snapshot_date: NaiveDate,
    pub assets: Vec<Asset>,

    #[serde(default)]
    pub assets_added: Vec<String>,
    #[serde(default)]
    pub assets_removed: Vec<String>,

    /// Fraction of membership that changed versus the previous snapshot,
    /// in [0, 1]. Absent on the first snapshot of a universe.
    #[serde(default)]
    pub turnover_rate: Option<f64>,
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> anyhow::Result<Self> {
        if start_date > end_date {
            anyhow::bail!("invalid date range: {} is after {}", start_date, end_date);
        }

        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Trailing window of `months` whole months ending at `end` (inclusive).
    pub fn trailing_months(end: NaiveDate, months: u32) -> Self {
        let start_date = end
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);

        Self {
            start_date,
            end_date: end,
        }
    }
}

/// Sampling frequency requested from the snapshot repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(anyhow::anyhow!("invalid frequency: {}", other)),
        }
    }
}

/// Shape of a timeline query. The analyzer itself is frequency-agnostic; the
/// filter only drives what the repository returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineFilter {
    pub date_range: DateRange,
    pub frequency: Frequency,
    pub show_empty_periods: bool,
    pub include_turnover_analysis: bool,
}

impl TimelineFilter {
    /// Default window used when a session is constructed without an explicit
    /// filter: trailing 6 months ending at `now`, monthly sampling, empty
    /// periods hidden, turnover analysis included. `now` is fixed by the
    /// caller at construction time, not re-evaluated later.
    pub fn default_window(now: NaiveDate) -> Self {
        Self {
            date_range: DateRange::trailing_months(now, 6),
            frequency: Frequency::Monthly,
            show_empty_periods: false,
            include_turnover_analysis: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSnapshotRequest {
    pub snapshot_date: NaiveDate,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackfillRequest {
    pub date_range: DateRange,
    pub frequency: Frequency,
}

/// Metadata accompanying a timeline response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineMetadata {
    pub date_range: DateRange,
    pub frequency: Frequency,
    pub total_snapshots: u64,
}

/// Timeline payload: ordered snapshots plus query metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineData {
    pub snapshots: Vec<Snapshot>,
    pub metadata: TimelineMetadata,
}

/// Metadata accompanying one page of the snapshot listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPageMetadata {
    pub total_snapshots: u64,
    pub date_range: Option<DateRange>,
    pub latest_snapshot_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPage {
    pub snapshots: Vec<Snapshot>,
    pub metadata: SnapshotPageMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionAsset {
    pub symbol: String,
    pub sector: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionContext {
    /// False when the repository answered with the nearest snapshot at or
    /// before the requested date rather than an exact hit.
    pub is_exact_match: bool,
}

/// Point-in-time membership answer for a composition lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub snapshot_date: NaiveDate,
    pub assets: Vec<CompositionAsset>,
    pub context: CompositionContext,
}

/// Result of a historical backfill run, passed through unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackfillOutcome {
    pub snapshots_created: u64,
    pub snapshots_updated: u64,
    pub snapshots_skipped: u64,
    pub processing_time_seconds: f64,
}
