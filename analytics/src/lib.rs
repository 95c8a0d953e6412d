pub mod error;
pub mod turnover;

pub use error::AnalyticsError;
pub use turnover::{
    AssetStability, PeriodPoint, TurnoverAnalysis, TurnoverTrend, analyze_turnover,
};
