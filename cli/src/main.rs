pub mod cli;

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;

use client::UniverseClient;
use common::init_logger;
use model::{BackfillRequest, DateRange, TimelineFilter};
use session::backfill::BackfillSession;
use session::composition::CompositionSession;
use session::snapshots::SnapshotSession;
use session::{Phase, RequestCoalescer, TimelineSession};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger("universes-cli");

    let args = Cli::parse();
    let repo = Arc::new(UniverseClient::new(args.base_url.clone())?);

    match args.command {
        Command::Timeline { months, frequency } => {
            let filter = TimelineFilter {
                date_range: DateRange::trailing_months(Utc::now().date_naive(), months),
                frequency,
                show_empty_periods: false,
                include_turnover_analysis: true,
            };

            let session = TimelineSession::new(
                repo,
                Arc::new(RequestCoalescer::new()),
                args.universe_id,
                Some(filter),
            );
            session.load().await;

            let state = session.state();
            if state.phase == Phase::Failed {
                anyhow::bail!(state.error.unwrap_or_default());
            }

            println!("snapshots: {}", state.snapshots.len());
            match state.analysis {
                Some(analysis) => {
                    println!(
                        "window:     {} .. {}",
                        analysis.period_start, analysis.period_end
                    );
                    println!("avg rate:   {:.4}", analysis.average_turnover_rate);
                    println!("volatility: {:.4}", analysis.turnover_volatility);
                    println!("trend:      {:?}", analysis.turnover_trend);
                    println!("core:       {}", analysis.asset_stability.core_holdings.join(", "));
                    println!("stable:     {}", analysis.asset_stability.most_stable.join(", "));
                    println!("volatile:   {}", analysis.asset_stability.most_volatile.join(", "));
                }
                None => println!("not enough data for a turnover analysis"),
            }
        }

        Command::Snapshots { page } => {
            let session = SnapshotSession::new(repo, Some(args.universe_id));
            session.load_page(page).await?;

            let state = session.state();
            if let Some(metadata) = &state.metadata {
                println!(
                    "page {} of {} snapshots (latest: {})",
                    state.page,
                    metadata.total_snapshots,
                    metadata
                        .latest_snapshot_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            for snapshot in &state.snapshots {
                println!(
                    "{}  assets={:<4} turnover={}",
                    snapshot.snapshot_date,
                    snapshot.assets.len(),
                    snapshot
                        .turnover_rate
                        .map(|r| format!("{:.4}", r))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        Command::Composition { date } => {
            let session = CompositionSession::new(repo, args.universe_id);
            let composition = session.lookup(date).await?;

            println!(
                "composition at {}{}",
                composition.snapshot_date,
                if composition.context.is_exact_match {
                    ""
                } else {
                    " (nearest earlier snapshot)"
                },
            );
            for asset in &composition.assets {
                println!(
                    "{:<8} {:<12} {}",
                    asset.symbol,
                    asset.sector.as_deref().unwrap_or("-"),
                    asset
                        .weight
                        .map(|w| format!("{:.2}%", w * 100.0))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
        }

        Command::Backfill {
            start,
            end,
            frequency,
        } => {
            let request = BackfillRequest {
                date_range: DateRange::new(start, end)?,
                frequency,
            };

            let session = BackfillSession::new(repo, args.universe_id);
            let outcome = session.run(&request).await?;

            println!(
                "backfill done in {:.1}s: {} created, {} updated, {} skipped",
                outcome.processing_time_seconds,
                outcome.snapshots_created,
                outcome.snapshots_updated,
                outcome.snapshots_skipped,
            );
        }
    }

    Ok(())
}
