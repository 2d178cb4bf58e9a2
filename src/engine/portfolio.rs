//! Portfolio-level aggregation.
//!
//! Collapses per-position performance rows into one row per day. The policy
//! is all-or-nothing: a single position with an undefined return invalidates
//! that day's portfolio summary (date excepted), so partial price data never
//! skews the totals.

use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::valuation::PerformanceRow;

/// Whole-portfolio figures for one trading day.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioDayRow {
    pub date: NaiveDate,
    pub total_value_currently_invested: Option<Decimal>,
    pub current_portfolio_valuation: Option<Decimal>,
    pub current_roi: Option<Decimal>,
    pub current_pl: Option<Decimal>,
    pub estimated_annual_roi: Option<Decimal>,
}

impl PortfolioDayRow {
    fn undefined(date: NaiveDate) -> Self {
        PortfolioDayRow {
            date,
            total_value_currently_invested: None,
            current_portfolio_valuation: None,
            current_roi: None,
            current_pl: None,
            estimated_annual_roi: None,
        }
    }
}

/// Compound a cumulative ROI over `days_elapsed` whole days into an annual
/// estimate: daily rate first, then 365 compounding periods. Undefined for a
/// same-day evaluation.
fn annualize(current_roi: Decimal, days_elapsed: i64) -> Option<Decimal> {
    if days_elapsed == 0 {
        return None;
    }
    let growth = (Decimal::ONE + current_roi).to_f64()?;
    if growth <= 0.0 {
        return None;
    }
    let daily_growth = growth.powf(1.0 / days_elapsed as f64);
    Decimal::from_f64(daily_growth.powf(365.0) - 1.0)
}

/// Aggregate one day's rows. All rows must share `date`.
pub fn aggregate_day(date: NaiveDate, rows: &[&PerformanceRow]) -> PortfolioDayRow {
    if rows.is_empty() || rows.iter().any(|r| r.ticker_return.is_none()) {
        return PortfolioDayRow::undefined(date);
    }

    // A defined ticker return implies both cost and daily value are defined.
    let total_invested: Decimal = rows.iter().filter_map(|r| r.adjusted_cost).sum();
    let valuation: Decimal = rows.iter().filter_map(|r| r.adjusted_cost_daily).sum();

    let current_roi = if total_invested.is_zero() {
        None
    } else {
        Some(valuation / total_invested - Decimal::ONE)
    };
    let current_pl = valuation - total_invested;

    let Some(earliest_open) = rows.iter().map(|r| r.lot_open_date).min() else {
        return PortfolioDayRow::undefined(date);
    };
    let days_elapsed = (date - earliest_open).num_days();
    let estimated_annual_roi = current_roi.and_then(|roi| annualize(roi, days_elapsed));

    PortfolioDayRow {
        date,
        total_value_currently_invested: Some(total_invested),
        current_portfolio_valuation: Some(valuation),
        current_roi,
        current_pl: Some(current_pl),
        estimated_annual_roi,
    }
}

/// One portfolio row per date, in date order. Input rows must already be
/// date-ordered, as produced by the simulation walk.
pub fn aggregate(rows: &[PerformanceRow]) -> Vec<PortfolioDayRow> {
    let mut out = Vec::new();
    for (date, group) in &rows.iter().chunk_by(|r| r.date) {
        let day: Vec<&PerformanceRow> = group.collect();
        out.push(aggregate_day(date, &day));
    }
    out
}

/// Scan backward from the most recent date for the first day whose ticker
/// return is defined for every position; the "as of" day when recent quotes
/// are incomplete.
pub fn latest_fully_defined_day(rows: &[PerformanceRow]) -> Option<PortfolioDayRow> {
    let grouped = rows.iter().chunk_by(|r| r.date);
    let days: Vec<(NaiveDate, Vec<&PerformanceRow>)> = grouped
        .into_iter()
        .map(|(date, group)| (date, group.collect()))
        .collect();

    days.into_iter()
        .rev()
        .find(|(_, group)| !group.is_empty() && group.iter().all(|r| r.ticker_return.is_some()))
        .map(|(date, group)| aggregate_day(date, &group))
}
