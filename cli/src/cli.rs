use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use model::Frequency;

#[derive(Parser, Debug)]
#[command(name = "universes", about = "Inspect universe membership history")]
pub struct Cli {
    /// Base URL of the universe API, without a trailing slash.
    #[arg(long, default_value = "http://localhost:8000/api")]
    pub base_url: String,

    /// Universe to operate on.
    #[arg(long)]
    pub universe_id: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch the snapshot timeline and print the turnover analysis.
    Timeline {
        /// Trailing window in months, ending today.
        #[arg(long, default_value_t = 6)]
        months: u32,

        /// Sampling frequency: daily, weekly or monthly.
        #[arg(long, default_value = "monthly")]
        frequency: Frequency,
    },

    /// List one page of recorded snapshots.
    Snapshots {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show universe membership at a specific date.
    Composition {
        #[arg(long)]
        date: NaiveDate,
    },

    /// Reconstruct historical snapshots over a date range.
    Backfill {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        #[arg(long, default_value = "monthly")]
        frequency: Frequency,
    },
}
