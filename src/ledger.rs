//! Positions ledger loader.
//!
//! Parses the tracking CSV (`Symbol, Type, Open date, Qty, Adj cost`) into
//! typed transactions. Dates are day-first; `Adj cost per share` is derived
//! at load time, never supplied.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use itertools::Itertools;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{AlphaError, Result};

/// Transaction kind as recorded in the ledger's `Type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
    Buy,
    SellFifo,
}

impl TxType {
    /// Parse a `Type` cell. Whitespace around the value is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Buy" => Some(TxType::Buy),
            "Sell.FIFO" => Some(TxType::SellFifo),
            _ => None,
        }
    }
}

/// One ledger row. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub symbol: String,
    pub tx_type: TxType,
    pub open_date: NaiveDate,
    pub quantity: Decimal,
    pub adjusted_cost: Decimal,
    pub adjusted_cost_per_share: Decimal,
}

/// Day-first formats accepted in the `Open date` column, ISO as a fallback.
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d/%m/%y", "%Y-%m-%d"];

fn parse_open_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

#[derive(Debug)]
struct ColumnMapping {
    symbol: usize,
    tx_type: usize,
    open_date: usize,
    quantity: usize,
    adjusted_cost: usize,
}

fn find_columns(headers: &csv::StringRecord) -> Result<ColumnMapping> {
    let mut symbol = None;
    let mut tx_type = None;
    let mut open_date = None;
    let mut quantity = None;
    let mut adjusted_cost = None;

    for (idx, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "symbol" => symbol = Some(idx),
            "type" => tx_type = Some(idx),
            "open date" => open_date = Some(idx),
            "qty" => quantity = Some(idx),
            "adj cost" => adjusted_cost = Some(idx),
            _ => {}
        }
    }

    Ok(ColumnMapping {
        symbol: symbol.ok_or_else(|| anyhow::anyhow!("missing 'Symbol' column"))?,
        tx_type: tx_type.ok_or_else(|| anyhow::anyhow!("missing 'Type' column"))?,
        open_date: open_date.ok_or_else(|| anyhow::anyhow!("missing 'Open date' column"))?,
        quantity: quantity.ok_or_else(|| anyhow::anyhow!("missing 'Qty' column"))?,
        adjusted_cost: adjusted_cost.ok_or_else(|| anyhow::anyhow!("missing 'Adj cost' column"))?,
    })
}

fn parse_row(
    record: &csv::StringRecord,
    columns: &ColumnMapping,
    row: usize,
) -> std::result::Result<Transaction, AlphaError> {
    let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

    let err = |message: String| AlphaError::Ledger { row, message };

    let symbol = cell(columns.symbol).to_string();
    if symbol.is_empty() {
        return Err(err("empty symbol".to_string()));
    }

    let type_cell = cell(columns.tx_type);
    let tx_type = TxType::parse(type_cell)
        .ok_or_else(|| err(format!("unknown transaction type '{}'", type_cell)))?;

    let date_cell = cell(columns.open_date);
    let open_date = parse_open_date(date_cell)
        .ok_or_else(|| err(format!("unparseable open date '{}'", date_cell)))?;

    let quantity = Decimal::from_str(cell(columns.quantity))
        .map_err(|_| err(format!("unparseable quantity '{}'", cell(columns.quantity))))?;
    if quantity.is_zero() {
        return Err(err(format!("zero quantity for {}", symbol)));
    }

    let adjusted_cost = Decimal::from_str(cell(columns.adjusted_cost)).map_err(|_| {
        err(format!(
            "unparseable adjusted cost '{}'",
            cell(columns.adjusted_cost)
        ))
    })?;

    Ok(Transaction {
        adjusted_cost_per_share: adjusted_cost / quantity,
        symbol,
        tx_type,
        open_date,
        quantity,
        adjusted_cost,
    })
}

/// Load the positions ledger. Any malformed row is fatal, reported with its
/// row number (header is row 1).
pub fn load_ledger<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    info!("loading positions ledger from {:?}", path);

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open ledger file {:?}", path))?;

    let headers = reader
        .headers()
        .context("failed to read ledger headers")?
        .clone();
    debug!("ledger headers: {:?}", headers);
    let columns = find_columns(&headers)?;

    let mut transactions = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.context("failed to read ledger record")?;
        transactions.push(parse_row(&record, &columns, idx + 2)?);
    }

    info!("loaded {} ledger transactions", transactions.len());
    Ok(transactions)
}

/// Distinct symbols in ledger order.
pub fn unique_symbols(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .map(|tx| tx.symbol.clone())
        .unique()
        .collect()
}
