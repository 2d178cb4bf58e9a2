use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use alpha::cli::{formatters, AnalysisOpts, Cli, Commands};
use alpha::engine::analysis::{self, Window};
use alpha::engine::valuation::{CostBasisPolicy, PerformanceRow};
use alpha::ledger;
use alpha::pricing::{self, PriceSeries};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::History { opts } => handle_history(&opts).await,
        Commands::Summary { opts, json } => handle_summary(&opts, json).await,
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load the ledger, resolve the window, and gather prices for every held
/// symbol plus the benchmark, either from an offline CSV or Yahoo Finance.
async fn run_pipeline(opts: &AnalysisOpts) -> Result<Vec<PerformanceRow>> {
    let transactions = ledger::load_ledger(&opts.positions_file)?;
    let window = analysis::resolve_window(&transactions, opts.start, opts.end)?;
    info!("analysis window: {} to {}", window.start, window.end);

    let prices = load_prices(opts, &transactions, window).await?;

    let mut calendar =
        pricing::market_calendar(&prices, &opts.benchmark, window.start, window.end);
    if calendar.is_empty() {
        warn!(
            "no {} quotes between {} and {}; falling back to a weekday calendar",
            opts.benchmark, window.start, window.end
        );
        calendar = pricing::weekday_calendar(window.start, window.end);
    }

    let policy: CostBasisPolicy = opts.cost_basis.into();
    analysis::run_analysis(
        &transactions,
        window,
        &calendar,
        &prices,
        &opts.benchmark,
        policy,
    )
}

async fn load_prices(
    opts: &AnalysisOpts,
    transactions: &[ledger::Transaction],
    window: Window,
) -> Result<PriceSeries> {
    if let Some(path) = &opts.prices {
        return pricing::load_price_csv(path);
    }

    let mut symbols = ledger::unique_symbols(transactions);
    if !symbols.contains(&opts.benchmark) {
        symbols.push(opts.benchmark.clone());
    }
    pricing::yahoo::fetch_series(&symbols, window.start, window.end).await
}

async fn handle_history(opts: &AnalysisOpts) -> Result<()> {
    let rows = run_pipeline(opts).await?;
    let history = analysis::portfolio_history(&rows);
    println!("{}", formatters::format_history_table(&history));
    Ok(())
}

async fn handle_summary(opts: &AnalysisOpts, json: bool) -> Result<()> {
    let rows = run_pipeline(opts).await?;
    match analysis::portfolio_summary(&rows) {
        Some(day) => {
            if json {
                println!("{}", formatters::format_summary_json(&day)?);
            } else {
                println!("{}", formatters::format_summary(&day));
            }
            Ok(())
        }
        None => anyhow::bail!("no day in the window has complete price data for every position"),
    }
}
