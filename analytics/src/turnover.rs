//! Turnover & Stability Analyzer
//!
//! Pure statistics over an ordered sequence of membership snapshots for one
//! universe.
//!
//! ## What it answers
//! > "How much is this universe churning, in which direction, and which
//! > members actually stick around?"
//!
//! ## Inputs
//! A slice of [`Snapshot`]s in **any order**. The analyzer sorts by
//! `snapshot_date` with a stable sort, so snapshots sharing a date (not
//! expected, but tolerated) keep their input order and results stay
//! deterministic.
//!
//! ## Statistics
//! - `average_turnover_rate`: arithmetic mean of the rates that are present.
//! - `turnover_volatility`: **population** standard deviation (divide by N,
//!   not N-1). This matches the upstream computation exactly; changing it to
//!   a sample statistic breaks parity with historical numbers.
//! - `turnover_trend`: ordinary least-squares slope of rate against its
//!   index in the extracted sequence. Slope above `+0.01` → Increasing,
//!   below `-0.01` → Decreasing, otherwise Stable. The thresholds are fixed
//!   constants, not configuration.
//!
//! ## Stability ranking
//! Symbols are counted across all sorted snapshots (case-sensitive string
//! identity). Ranking uses stable sorts over the first-seen order, so ties
//! resolve the same way on every run:
//! - `most_stable`: top 10 by descending occurrence count
//! - `most_volatile`: bottom 10, least frequent first
//! - `core_holdings`: symbols present in at least `ceil(0.8 * snapshots)`
//!
//! ## Determinism
//! The output is a pure function of the input multiset: calling twice with
//! the same snapshots, in any order, yields an identical result. No I/O, no
//! retained state; safe to call concurrently from any number of sessions.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use model::Snapshot;

use crate::error::AnalyticsError;

/// OLS slope beyond which the turnover trend is called directional.
const TREND_SLOPE_THRESHOLD: f64 = 0.01;

/// Fraction of snapshots a symbol must appear in to count as a core holding.
const CORE_HOLDING_RATIO: f64 = 0.8;

/// How many symbols the stable / volatile rankings report.
const STABILITY_RANK_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnoverTrend {
    Increasing,
    Decreasing,
    Stable,
}

/// One row of the per-snapshot breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodPoint {
    pub date: NaiveDate,
    /// Missing rates are reported as 0.0 here (display convention); they are
    /// still excluded from the aggregate statistics.
    pub turnover_rate: f64,
    pub assets_added_count: usize,
    pub assets_removed_count: usize,
    pub total_assets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetStability {
    pub most_stable: Vec<String>,
    pub most_volatile: Vec<String>,
    pub core_holdings: Vec<String>,
}

/// Derived, ephemeral analysis of one snapshot window. Recomputed whenever
/// the underlying snapshot sequence changes; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnoverAnalysis {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub average_turnover_rate: f64,
    pub turnover_trend: TurnoverTrend,
    pub turnover_volatility: f64,
    pub periods: Vec<PeriodPoint>,
    pub asset_stability: AssetStability,
}

/// Analyze turnover and membership stability for one universe.
///
/// Requires at least two snapshots and at least one present turnover rate;
/// otherwise fails with [`AnalyticsError`] rather than returning a partial
/// analysis.
pub fn analyze_turnover(snapshots: &[Snapshot]) -> Result<TurnoverAnalysis, AnalyticsError> {
    if snapshots.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            count: snapshots.len(),
        });
    }

    // Stable sort: equal dates keep input order.
    let mut sorted: Vec<&Snapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|s| s.snapshot_date);

    let rates: Vec<f64> = sorted.iter().filter_map(|s| s.turnover_rate).collect();
    if rates.is_empty() {
        return Err(AnalyticsError::NoTurnoverData);
    }

    let average_turnover_rate = mean(&rates);
    let turnover_volatility = population_std_dev(&rates, average_turnover_rate);
    let turnover_trend = classify_trend(&rates);

    let periods = sorted
        .iter()
        .map(|s| PeriodPoint {
            date: s.snapshot_date,
            turnover_rate: s.turnover_rate.unwrap_or(0.0),
            assets_added_count: s.assets_added.len(),
            assets_removed_count: s.assets_removed.len(),
            total_assets: s.assets.len(),
        })
        .collect();

    Ok(TurnoverAnalysis {
        period_start: sorted[0].snapshot_date,
        period_end: sorted[sorted.len() - 1].snapshot_date,
        average_turnover_rate,
        turnover_trend,
        turnover_volatility,
        periods,
        asset_stability: rank_stability(&sorted),
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by N). Intentional parity choice,
/// see the module docs.
fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;

    variance.sqrt()
}

/// OLS slope of `values` against their indices 0..N-1.
///
/// A single-element sequence has no defined slope; it is reported as 0.0,
/// which classifies as Stable downstream.
fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }

    let sum_x = (0..values.len()).map(|i| i as f64).sum::<f64>();
    let sum_y = values.iter().sum::<f64>();
    let sum_xy = values
        .iter()
        .enumerate()
        .map(|(i, v)| i as f64 * v)
        .sum::<f64>();
    let sum_x2 = (0..values.len()).map(|i| (i * i) as f64).sum::<f64>();

    (n * sum_xy - sum_x * sum_y) / (n * sum_x2 - sum_x * sum_x)
}

fn classify_trend(rates: &[f64]) -> TurnoverTrend {
    let slope = ols_slope(rates);

    if slope > TREND_SLOPE_THRESHOLD {
        TurnoverTrend::Increasing
    } else if slope < -TREND_SLOPE_THRESHOLD {
        TurnoverTrend::Decreasing
    } else {
        TurnoverTrend::Stable
    }
}

/// Count symbol occurrences across the sorted snapshots and rank them.
///
/// `first_seen` preserves discovery order; both rankings are stable sorts
/// over it, so equal counts always tie-break the same way.
fn rank_stability(sorted: &[&Snapshot]) -> AssetStability {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();

    for snapshot in sorted {
        for asset in &snapshot.assets {
            let symbol = asset.symbol.as_str();
            let entry = counts.entry(symbol).or_insert(0);
            if *entry == 0 {
                first_seen.push(symbol);
            }
            *entry += 1;
        }
    }

    let ranked: Vec<(&str, usize)> = first_seen.iter().map(|s| (*s, counts[s])).collect();

    let mut by_desc = ranked.clone();
    by_desc.sort_by(|a, b| b.1.cmp(&a.1));

    let mut by_asc = ranked.clone();
    by_asc.sort_by(|a, b| a.1.cmp(&b.1));

    let core_min = (CORE_HOLDING_RATIO * sorted.len() as f64).ceil() as usize;

    AssetStability {
        most_stable: by_desc
            .iter()
            .take(STABILITY_RANK_DEPTH)
            .map(|(s, _)| s.to_string())
            .collect(),
        most_volatile: by_asc
            .iter()
            .take(STABILITY_RANK_DEPTH)
            .map(|(s, _)| s.to_string())
            .collect(),
        core_holdings: ranked
            .iter()
            .filter(|(_, count)| *count >= core_min)
            .map(|(s, _)| s.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_of_flat_series_is_zero() {
        assert_eq!(ols_slope(&[0.3, 0.3, 0.3, 0.3]), 0.0);
    }

    #[test]
    fn slope_of_linear_series_matches_step() {
        let slope = ols_slope(&[0.0, 0.1, 0.2, 0.3]);
        assert!((slope - 0.1).abs() < 1e-12);
    }

    #[test]
    fn slope_of_single_point_is_zero() {
        assert_eq!(ols_slope(&[0.42]), 0.0);
    }

    #[test]
    fn population_std_dev_divides_by_n() {
        // Sample stddev of [1, 3] would be sqrt(2); population is 1.
        let m = mean(&[1.0, 3.0]);
        assert!((population_std_dev(&[1.0, 3.0], m) - 1.0).abs() < 1e-12);
    }
}
