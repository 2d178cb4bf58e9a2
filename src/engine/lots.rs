//! FIFO lot tracking.
//!
//! A lot is the still-unsold remainder of one buy transaction, tracked
//! individually so sells can consume the oldest shares first. The pool owns
//! one ordered vector of lots per symbol and mutates it in place; transaction
//! records themselves are never modified.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{AlphaError, Result};
use crate::ledger::{Transaction, TxType};

/// Open remainder of a single buy transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Lot {
    pub symbol: String,
    pub open_date: NaiveDate,
    pub remaining_quantity: Decimal,
    pub cost_per_share: Decimal,
}

impl Lot {
    pub fn from_buy(tx: &Transaction) -> Self {
        debug_assert_eq!(tx.tx_type, TxType::Buy);
        Lot {
            symbol: tx.symbol.clone(),
            open_date: tx.open_date,
            remaining_quantity: tx.quantity,
            cost_per_share: tx.adjusted_cost_per_share,
        }
    }

    pub fn adjusted_cost(&self) -> Decimal {
        self.remaining_quantity * self.cost_per_share
    }
}

/// A sell to be matched against open lots. `open_date` is the ledger's
/// recording date for the sell and is used as the matching key, not
/// necessarily the execution date.
#[derive(Debug, Clone, PartialEq)]
pub struct SellEvent {
    pub symbol: String,
    pub open_date: NaiveDate,
    pub quantity: Decimal,
}

/// Sum raw Sell.FIFO transactions into one event per (symbol, open date),
/// returned in ascending date order.
pub fn aggregate_sell_events<'a, I>(transactions: I) -> Vec<SellEvent>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut grouped: BTreeMap<(NaiveDate, String), Decimal> = BTreeMap::new();
    for tx in transactions {
        if tx.tx_type == TxType::SellFifo {
            *grouped
                .entry((tx.open_date, tx.symbol.clone()))
                .or_insert(Decimal::ZERO) += tx.quantity;
        }
    }
    grouped
        .into_iter()
        .map(|((open_date, symbol), quantity)| SellEvent {
            symbol,
            open_date,
            quantity,
        })
        .collect()
}

/// Open lots per symbol, each vector kept in ascending open-date order.
#[derive(Debug, Clone, Default)]
pub struct LotPool {
    lots: HashMap<String, Vec<Lot>>,
}

impl LotPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a lot, preserving open-date order within its symbol.
    pub fn add(&mut self, lot: Lot) {
        let lots = self.lots.entry(lot.symbol.clone()).or_default();
        let idx = lots.partition_point(|l| l.open_date <= lot.open_date);
        lots.insert(idx, lot);
    }

    /// Match a sell against this pool's lots, oldest first. Only lots opened
    /// on or before the sell's date participate; shares bought later are not
    /// available to it. Fully consumed lots are dropped. Any unmatched
    /// remainder means the ledger records a sell exceeding the quantity open
    /// as of that date and is a hard accounting error.
    pub fn resolve(&mut self, sell: &SellEvent) -> Result<()> {
        let mut unmatched = sell.quantity;

        if let Some(lots) = self.lots.get_mut(&sell.symbol) {
            for lot in lots.iter_mut() {
                if unmatched <= Decimal::ZERO || lot.open_date > sell.open_date {
                    break;
                }
                if lot.remaining_quantity <= unmatched {
                    unmatched -= lot.remaining_quantity;
                    lot.remaining_quantity = Decimal::ZERO;
                } else {
                    lot.remaining_quantity -= unmatched;
                    unmatched = Decimal::ZERO;
                }
            }
            lots.retain(|l| l.remaining_quantity > Decimal::ZERO);
        }

        if unmatched > Decimal::ZERO {
            return Err(AlphaError::Oversell {
                symbol: sell.symbol.clone(),
                date: sell.open_date,
                unmatched,
            }
            .into());
        }
        Ok(())
    }

    /// Total open quantity for a symbol.
    pub fn total_quantity(&self, symbol: &str) -> Decimal {
        self.lots
            .get(symbol)
            .map(|lots| lots.iter().map(|l| l.remaining_quantity).sum())
            .unwrap_or(Decimal::ZERO)
    }

    /// Lots open as of `date`, across all symbols, in (symbol, open date)
    /// order for deterministic output.
    pub fn open_lots_at(&self, date: NaiveDate) -> Vec<&Lot> {
        let mut symbols: Vec<&String> = self.lots.keys().collect();
        symbols.sort();
        symbols
            .into_iter()
            .flat_map(|symbol| self.lots[symbol].iter())
            .filter(|lot| lot.open_date <= date && lot.remaining_quantity > Decimal::ZERO)
            .collect()
    }
}
