//! Error handling for the alpha portfolio tracker.
//!
//! Defines structured error types for accounting and data failures and
//! establishes a unified Result type using anyhow for context chaining.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types for the analysis pipeline
#[derive(Error, Debug)]
pub enum AlphaError {
    #[error("ledger error at row {row}: {message}")]
    Ledger { row: usize, message: String },

    #[error(
        "oversell of {symbol} on {date}: {unmatched} shares could not be matched against open lots"
    )]
    Oversell {
        symbol: String,
        date: NaiveDate,
        unmatched: Decimal,
    },

    #[error("pricing error: {0}")]
    Pricing(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = AlphaError::Ledger {
            row: 3,
            message: "unknown transaction type 'Hold'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ledger error at row 3: unknown transaction type 'Hold'"
        );
    }

    #[test]
    fn test_oversell_reports_symbol_date_and_unmatched_quantity() {
        let err = AlphaError::Oversell {
            symbol: "ABC".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            unmatched: dec!(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("ABC"));
        assert!(msg.contains("2020-01-02"));
        assert!(msg.contains('1'));
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::anyhow!("original error")).context("failed to load ledger");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("failed to load ledger"));
        assert!(format!("{:?}", err).contains("original error"));
    }
}
