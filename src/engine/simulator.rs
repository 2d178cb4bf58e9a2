//! Day-by-day position simulation.
//!
//! Two phases carry the lot pool as state: phase 0 establishes the balance
//! as of the window start (all sells recorded at or before that date are
//! consumed up front, oldest event date first), then one transition per
//! trading day applies the sells keyed to that day and snapshots the open
//! lots. The walk is strictly sequential; day N's snapshot depends on every
//! resolution through day N.
//!
//! A sell fires on the calendar day equal to its ledger `Open date`. A sell
//! recorded against a non-trading day inside the window never fires; this
//! mirrors the ledger convention of keying sells by intended settlement
//! date.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::Result;
use crate::ledger::{Transaction, TxType};

use super::lots::{aggregate_sell_events, Lot, LotPool, SellEvent};

/// The state of one open lot as of one trading day. Market-value fields are
/// joined on later by the valuation step.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySnapshot {
    pub date: NaiveDate,
    pub symbol: String,
    pub lot_open_date: NaiveDate,
    pub quantity: Decimal,
    pub cost_per_share: Decimal,
}

impl DailySnapshot {
    pub fn adjusted_cost(&self) -> Decimal {
        self.quantity * self.cost_per_share
    }
}

/// Phase 0: the lot pool as of `start_date`, plus the sell events still
/// pending inside the window.
fn starting_balance(
    transactions: &[Transaction],
    start_date: NaiveDate,
) -> Result<(LotPool, Vec<SellEvent>)> {
    let (before, after): (Vec<&Transaction>, Vec<&Transaction>) = transactions
        .iter()
        .partition(|tx| tx.open_date <= start_date);

    let mut pool = LotPool::new();
    for tx in before.iter().filter(|tx| tx.tx_type == TxType::Buy) {
        pool.add(Lot::from_buy(tx));
    }
    for event in aggregate_sell_events(before.iter().copied()) {
        debug!(
            "start balance: consuming {} {} sold on {}",
            event.quantity, event.symbol, event.open_date
        );
        pool.resolve(&event)?;
    }

    for tx in after.iter().filter(|tx| tx.tx_type == TxType::Buy) {
        pool.add(Lot::from_buy(tx));
    }
    let pending = aggregate_sell_events(after.iter().copied());

    Ok((pool, pending))
}

/// Walk the trading calendar, producing one snapshot per open lot per day.
/// An oversell anywhere aborts the run; no partial recovery is attempted.
pub fn simulate(
    transactions: &[Transaction],
    start_date: NaiveDate,
    calendar: &[NaiveDate],
) -> Result<Vec<DailySnapshot>> {
    let (mut pool, pending) = starting_balance(transactions, start_date)?;

    let mut snapshots = Vec::new();
    for &date in calendar {
        for event in pending.iter().filter(|e| e.open_date == date) {
            debug!(
                "applying sell of {} {} on {}",
                event.quantity, event.symbol, date
            );
            pool.resolve(event)?;
        }

        for lot in pool.open_lots_at(date) {
            snapshots.push(DailySnapshot {
                date,
                symbol: lot.symbol.clone(),
                lot_open_date: lot.open_date,
                quantity: lot.remaining_quantity,
                cost_per_share: lot.cost_per_share,
            });
        }
    }

    Ok(snapshots)
}
