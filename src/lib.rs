//! Alpha - portfolio performance tracking against a benchmark index
//!
//! This library reconstructs day-by-day position state from a buy/sell
//! transaction ledger using FIFO lot matching, values the positions against
//! daily close prices, and compares portfolio returns to a benchmark index
//! over an arbitrary date range.

pub mod cli;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pricing;
