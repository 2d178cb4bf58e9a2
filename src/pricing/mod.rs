//! Price data for the analysis window.
//!
//! The core consumes a complete, time-indexed close-price series per symbol
//! (benchmark included) as an external input. Retrieval lives in the
//! `yahoo` submodule; an offline CSV loader covers reproducible runs and
//! tests. A date with no close is simply absent from the series; downstream
//! valuation propagates the gap as undefined, never as zero.

pub mod yahoo;

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Weekday};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::Result;

/// Daily closing prices, one per (symbol, date).
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    closes: BTreeMap<String, BTreeMap<NaiveDate, Decimal>>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: &str, date: NaiveDate, close: Decimal) {
        self.closes
            .entry(symbol.to_string())
            .or_default()
            .insert(date, close);
    }

    pub fn close(&self, symbol: &str, date: NaiveDate) -> Option<Decimal> {
        self.closes.get(symbol)?.get(&date).copied()
    }

    /// Earliest (date, close) for a symbol within [start, end]; the
    /// window-start reference point. Prices on record outside the window do
    /// not participate.
    pub fn first_close_in(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<(NaiveDate, Decimal)> {
        let series = self.closes.get(symbol)?;
        series.range(start..=end).next().map(|(&d, &c)| (d, c))
    }

    /// Latest (date, close) for a symbol within [start, end]; the window-end
    /// reference point.
    pub fn last_close_in(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<(NaiveDate, Decimal)> {
        let series = self.closes.get(symbol)?;
        series.range(start..=end).next_back().map(|(&d, &c)| (d, c))
    }

    /// Dates on record for a symbol within [start, end], ascending.
    pub fn dates_in(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        self.closes
            .get(symbol)
            .map(|series| series.range(start..=end).map(|(&d, _)| d).collect())
            .unwrap_or_default()
    }

    pub fn symbol_count(&self) -> usize {
        self.closes.len()
    }

    pub fn add_history(&mut self, symbol: &str, prices: &[yahoo::HistoricalPrice]) {
        for price in prices {
            self.insert(symbol, price.date, price.close);
        }
    }
}

/// Load a `symbol,date,close` CSV (ISO dates) into a series.
pub fn load_price_csv<P: AsRef<Path>>(path: P) -> Result<PriceSeries> {
    let path = path.as_ref();
    info!("loading price series from {:?}", path);

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open price file {:?}", path))?;

    let mut series = PriceSeries::new();
    let mut rows = 0usize;
    for (idx, result) in reader.records().enumerate() {
        let record = result.context("failed to read price record")?;
        let row = idx + 2;

        let symbol = record
            .get(0)
            .filter(|s| !s.is_empty())
            .with_context(|| format!("price file row {}: missing symbol", row))?;
        let date = record
            .get(1)
            .and_then(|s| NaiveDate::from_str(s).ok())
            .with_context(|| format!("price file row {}: unparseable date", row))?;
        let close = record
            .get(2)
            .and_then(|s| Decimal::from_str(s).ok())
            .with_context(|| format!("price file row {}: unparseable close", row))?;

        series.insert(symbol, date, close);
        rows += 1;
    }

    debug!("loaded {} close prices", rows);
    Ok(series)
}

/// Trading calendar for the window: the dates the benchmark actually has a
/// quote for. The benchmark trades exactly on exchange days, so its own
/// series doubles as the exchange calendar.
pub fn market_calendar(
    prices: &PriceSeries,
    benchmark: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<NaiveDate> {
    prices.dates_in(benchmark, start, end)
}

/// Weekday-only calendar, for when no benchmark series is available.
pub fn weekday_calendar(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|&d| d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_reference_closes_are_clamped_to_the_window() {
        let mut series = PriceSeries::new();
        series.insert("SPY", date(2019, 12, 2), dec!(100));
        series.insert("SPY", date(2020, 1, 3), dec!(201));
        series.insert("SPY", date(2020, 1, 2), dec!(200));
        series.insert("SPY", date(2020, 1, 6), dec!(202));
        series.insert("SPY", date(2020, 2, 3), dec!(210));

        let (start, end) = (date(2020, 1, 1), date(2020, 1, 31));
        assert_eq!(
            series.first_close_in("SPY", start, end),
            Some((date(2020, 1, 2), dec!(200)))
        );
        assert_eq!(
            series.last_close_in("SPY", start, end),
            Some((date(2020, 1, 6), dec!(202)))
        );
        assert_eq!(series.first_close_in("ABC", start, end), None);
    }

    #[test]
    fn test_missing_date_is_none() {
        let mut series = PriceSeries::new();
        series.insert("ABC", date(2020, 1, 2), dec!(110));
        assert_eq!(series.close("ABC", date(2020, 1, 3)), None);
    }

    #[test]
    fn test_market_calendar_is_benchmark_quote_dates() {
        let mut series = PriceSeries::new();
        series.insert("SPY", date(2020, 1, 2), dec!(200));
        series.insert("SPY", date(2020, 1, 3), dec!(200));
        series.insert("SPY", date(2020, 1, 6), dec!(200));
        series.insert("SPY", date(2020, 1, 10), dec!(200));

        let cal = market_calendar(&series, "SPY", date(2020, 1, 3), date(2020, 1, 7));
        assert_eq!(cal, vec![date(2020, 1, 3), date(2020, 1, 6)]);
    }

    #[test]
    fn test_weekday_calendar_skips_weekends() {
        // 2020-01-03 was a Friday
        let cal = weekday_calendar(date(2020, 1, 3), date(2020, 1, 7));
        assert_eq!(cal, vec![date(2020, 1, 3), date(2020, 1, 6), date(2020, 1, 7)]);
    }

    #[test]
    fn test_load_price_csv() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"symbol,date,close\nABC,2020-01-02,110\nSPY,2020-01-02,200.5\n")
            .unwrap();
        file.flush().unwrap();

        let series = load_price_csv(file.path()).unwrap();
        assert_eq!(series.symbol_count(), 2);
        assert_eq!(series.close("ABC", date(2020, 1, 2)), Some(dec!(110)));
        assert_eq!(series.close("SPY", date(2020, 1, 2)), Some(dec!(200.5)));
    }

    #[test]
    fn test_load_price_csv_bad_row_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"symbol,date,close\nABC,not-a-date,110\n").unwrap();
        file.flush().unwrap();

        let err = load_price_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }
}
