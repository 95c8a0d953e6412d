use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Fewer than two snapshots: no delta exists to analyze. The analyzer
    /// never degrades to a partial or defaulted result.
    #[error("turnover analysis needs at least 2 snapshots, got {count}")]
    InsufficientData { count: usize },

    /// Snapshots were supplied but none carries a turnover rate.
    #[error("no snapshot in the sequence carries a turnover rate")]
    NoTurnoverData,
}
