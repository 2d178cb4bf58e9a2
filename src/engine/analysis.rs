//! End-to-end analysis pipeline.
//!
//! Orchestrates ledger -> simulation -> valuation -> aggregation over
//! pre-fetched prices and a trading calendar, so callers (CLI or tests) own
//! all external inputs and runs are reproducible.

use chrono::{Days, Local, NaiveDate};
use tracing::info;

use crate::error::Result;
use crate::ledger::Transaction;
use crate::pricing::PriceSeries;

use super::portfolio::{self, PortfolioDayRow};
use super::simulator::simulate;
use super::valuation::{join_valuations, CostBasisPolicy, PerformanceRow};

/// Benchmark used when none is given.
pub const DEFAULT_BENCHMARK: &str = "SPY";

/// Resolved analysis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolve the window bounds: start defaults to the earliest ledger open
/// date minus one day, end defaults to today.
pub fn resolve_window(
    transactions: &[Transaction],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Window> {
    let earliest = transactions
        .iter()
        .map(|tx| tx.open_date)
        .min()
        .ok_or_else(|| anyhow::anyhow!("ledger contains no transactions"))?;

    let start = match start {
        Some(date) => date,
        None => earliest
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| anyhow::anyhow!("failed to compute default start date"))?,
    };
    let end = end.unwrap_or_else(|| Local::now().date_naive());

    if start > end {
        anyhow::bail!("analysis start {} is after end {}", start, end);
    }
    Ok(Window { start, end })
}

/// Run the full per-position analysis: simulate positions over the calendar
/// and join valuations. Returns one row per (open lot, trading day).
pub fn run_analysis(
    transactions: &[Transaction],
    window: Window,
    calendar: &[NaiveDate],
    prices: &PriceSeries,
    benchmark: &str,
    policy: CostBasisPolicy,
) -> Result<Vec<PerformanceRow>> {
    info!(
        "analyzing {} transactions from {} to {} against {}",
        transactions.len(),
        window.start,
        window.end,
        benchmark
    );
    let snapshots = simulate(transactions, window.start, calendar)?;
    info!("simulated {} daily position snapshots", snapshots.len());
    Ok(join_valuations(&snapshots, prices, benchmark, window, policy))
}

/// Portfolio-level rows, one per trading day.
pub fn portfolio_history(rows: &[PerformanceRow]) -> Vec<PortfolioDayRow> {
    portfolio::aggregate(rows)
}

/// The most recent day with complete metrics, for "as of" reporting.
pub fn portfolio_summary(rows: &[PerformanceRow]) -> Option<PortfolioDayRow> {
    portfolio::latest_fully_defined_day(rows)
}
