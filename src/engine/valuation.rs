//! Valuation join and per-row return metrics.
//!
//! Merges daily lot snapshots with the close-price series (securities and
//! benchmark in one series), broadcasts the window-start and window-end
//! benchmark reference closes to every row, and derives the return fields.
//! Every market-value field is `None` exactly when a price lookup came back
//! empty; a division by a zero or absent denominator is `None`, never a
//! panic and never zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::pricing::PriceSeries;

use super::analysis::Window;
use super::simulator::DailySnapshot;

/// How a lot's entry cost is measured when comparing against the benchmark.
///
/// The two interpretations answer different questions and are both
/// reportable; neither is "the" correct one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostBasisPolicy {
    /// Return since purchase: cost per share is always the ledger's
    /// acquisition cost.
    SincePurchase,
    /// Return since the window opened: lots already held at the window start
    /// are re-based to the security's window-start close; lots opened inside
    /// the window keep their acquisition cost.
    #[default]
    SinceWindowStart,
}

/// One fully joined (lot, date) record with all derived return fields.
#[derive(Debug, Clone)]
pub struct PerformanceRow {
    pub date: NaiveDate,
    pub symbol: String,
    pub lot_open_date: NaiveDate,
    pub quantity: Decimal,

    pub adjusted_cost_per_share: Option<Decimal>,
    pub adjusted_cost: Option<Decimal>,
    pub security_close: Option<Decimal>,
    pub adjusted_cost_daily: Option<Decimal>,

    pub benchmark_close: Option<Decimal>,
    pub benchmark_start_close: Option<Decimal>,
    pub benchmark_end_close: Option<Decimal>,
    pub ticker_start_close: Option<Decimal>,
    pub equiv_benchmark_shares: Option<Decimal>,
    pub benchmark_start_cost: Option<Decimal>,

    pub benchmark_return: Option<Decimal>,
    pub ticker_return: Option<Decimal>,
    pub ticker_share_value: Option<Decimal>,
    pub benchmark_share_value: Option<Decimal>,
    pub stock_gain_loss: Option<Decimal>,
    pub benchmark_gain_loss: Option<Decimal>,
    pub abs_value_compare: Option<Decimal>,
    pub abs_value_return: Option<Decimal>,
    pub return_vs_benchmark: Option<Decimal>,
}

fn sub(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    Some(a? - b?)
}

fn mul(a: Option<Decimal>, b: Option<Decimal>) -> Option<Decimal> {
    Some(a? * b?)
}

fn div(num: Option<Decimal>, den: Option<Decimal>) -> Option<Decimal> {
    match (num, den) {
        (Some(n), Some(d)) if !d.is_zero() => Some(n / d),
        _ => None,
    }
}

fn ratio_minus_one(num: Option<Decimal>, den: Option<Decimal>) -> Option<Decimal> {
    div(num, den).map(|r| r - Decimal::ONE)
}

/// Entry cost per share for a snapshot under the given policy.
fn cost_per_share(
    snapshot: &DailySnapshot,
    prices: &PriceSeries,
    window: Window,
    policy: CostBasisPolicy,
) -> Option<Decimal> {
    match policy {
        CostBasisPolicy::SincePurchase => Some(snapshot.cost_per_share),
        CostBasisPolicy::SinceWindowStart => {
            match prices.first_close_in(&snapshot.symbol, window.start, window.end) {
                Some((start_date, start_close)) if snapshot.lot_open_date <= start_date => {
                    Some(start_close)
                }
                Some(_) => Some(snapshot.cost_per_share),
                // No priced day for the symbol inside the window: there is no
                // window-start reference to re-base against.
                None => None,
            }
        }
    }
}

/// Left-join snapshots against the price series and compute every derived
/// return field. Rows with missing prices are kept with undefined fields,
/// never dropped.
pub fn join_valuations(
    snapshots: &[DailySnapshot],
    prices: &PriceSeries,
    benchmark: &str,
    window: Window,
    policy: CostBasisPolicy,
) -> Vec<PerformanceRow> {
    // Window reference closes: constants for the whole run, resolved at the
    // window's minimum/maximum priced dates. History on record outside the
    // window must not shift them.
    let benchmark_start_close = prices
        .first_close_in(benchmark, window.start, window.end)
        .map(|(_, c)| c);
    let benchmark_end_close = prices
        .last_close_in(benchmark, window.start, window.end)
        .map(|(_, c)| c);

    snapshots
        .iter()
        .map(|snap| {
            let security_close = prices.close(&snap.symbol, snap.date);
            let benchmark_close = prices.close(benchmark, snap.date);
            let ticker_start_close = prices
                .first_close_in(&snap.symbol, window.start, window.end)
                .map(|(_, c)| c);

            let adjusted_cost_per_share = cost_per_share(snap, prices, window, policy);
            let adjusted_cost = adjusted_cost_per_share.map(|c| c * snap.quantity);
            let adjusted_cost_daily = security_close.map(|p| p * snap.quantity);

            // The benchmark comparison baseline: how many benchmark shares
            // the entry cost would have bought at the window start.
            let equiv_benchmark_shares = div(adjusted_cost, benchmark_start_close);
            let benchmark_start_cost = mul(equiv_benchmark_shares, benchmark_start_close);

            let benchmark_return = ratio_minus_one(benchmark_close, benchmark_start_close);
            let ticker_return = ratio_minus_one(security_close, adjusted_cost_per_share);
            let ticker_share_value = security_close.map(|p| p * snap.quantity);
            let benchmark_share_value = mul(equiv_benchmark_shares, benchmark_close);
            let stock_gain_loss = sub(ticker_share_value, adjusted_cost);
            let benchmark_gain_loss = sub(benchmark_share_value, adjusted_cost);
            let abs_value_compare = sub(ticker_share_value, benchmark_start_cost);
            let abs_value_return = div(abs_value_compare, benchmark_start_cost);
            let return_vs_benchmark = sub(ticker_return, benchmark_return);

            PerformanceRow {
                date: snap.date,
                symbol: snap.symbol.clone(),
                lot_open_date: snap.lot_open_date,
                quantity: snap.quantity,
                adjusted_cost_per_share,
                adjusted_cost,
                security_close,
                adjusted_cost_daily,
                benchmark_close,
                benchmark_start_close,
                benchmark_end_close,
                ticker_start_close,
                equiv_benchmark_shares,
                benchmark_start_cost,
                benchmark_return,
                ticker_return,
                ticker_share_value,
                benchmark_share_value,
                stock_gain_loss,
                benchmark_gain_loss,
                abs_value_compare,
                abs_value_return,
                return_vs_benchmark,
            }
        })
        .collect()
}
