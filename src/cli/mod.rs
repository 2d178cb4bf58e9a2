use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::engine::analysis::DEFAULT_BENCHMARK;
use crate::engine::valuation::CostBasisPolicy;

pub mod formatters;

#[derive(Parser)]
#[command(name = "alpha")]
#[command(
    version,
    about = "Portfolio performance tracker comparing positions against a benchmark index"
)]
#[command(
    long_about = "Reconstruct day-by-day portfolio state from a buy/sell ledger with FIFO lot matching, value it against daily closes, and compare returns to a benchmark index."
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the day-by-day portfolio valuation table
    History {
        #[command(flatten)]
        opts: AnalysisOpts,
    },

    /// Print figures for the latest day with complete price data
    Summary {
        #[command(flatten)]
        opts: AnalysisOpts,

        /// Output results in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct AnalysisOpts {
    /// Path to the positions ledger CSV
    #[arg(short = 'p', long = "positions-file")]
    pub positions_file: String,

    /// Start date (YYYY-MM-DD); defaults to the earliest open date minus one day
    #[arg(short, long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD); defaults to today
    #[arg(short, long)]
    pub end: Option<NaiveDate>,

    /// Benchmark symbol for comparison
    #[arg(short, long, default_value = DEFAULT_BENCHMARK)]
    pub benchmark: String,

    /// Offline price file (symbol,date,close CSV) instead of Yahoo Finance
    #[arg(long)]
    pub prices: Option<String>,

    /// Cost basis interpretation for returns
    #[arg(long = "cost-basis", value_enum, default_value_t = CostBasisArg::WindowStart)]
    pub cost_basis: CostBasisArg,
}

/// CLI spelling of the cost-basis policy.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CostBasisArg {
    /// Return measured from the acquisition cost
    Purchase,
    /// Lots held at the window start re-based to the window-start close
    WindowStart,
}

impl From<CostBasisArg> for CostBasisPolicy {
    fn from(arg: CostBasisArg) -> Self {
        match arg {
            CostBasisArg::Purchase => CostBasisPolicy::SincePurchase,
            CostBasisArg::WindowStart => CostBasisPolicy::SinceWindowStart,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_summary_with_defaults() {
        let cli = Cli::try_parse_from(["alpha", "summary", "-p", "ledger.csv"]).unwrap();
        match cli.command {
            Commands::Summary { opts, json } => {
                assert_eq!(opts.positions_file, "ledger.csv");
                assert_eq!(opts.benchmark, "SPY");
                assert!(opts.start.is_none());
                assert!(!json);
            }
            _ => panic!("expected summary command"),
        }
    }

    #[test]
    fn test_cli_parses_history_with_window_and_policy() {
        let cli = Cli::try_parse_from([
            "alpha",
            "history",
            "-p",
            "ledger.csv",
            "-s",
            "2020-01-02",
            "-e",
            "2020-01-10",
            "--cost-basis",
            "purchase",
        ])
        .unwrap();
        match cli.command {
            Commands::History { opts } => {
                assert_eq!(
                    opts.start,
                    Some(NaiveDate::from_ymd_opt(2020, 1, 2).unwrap())
                );
                assert!(matches!(opts.cost_basis, CostBasisArg::Purchase));
            }
            _ => panic!("expected history command"),
        }
    }
}
