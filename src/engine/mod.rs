//! Position-state reconstruction and performance metrics.

pub mod analysis;
pub mod lots;
pub mod portfolio;
pub mod simulator;
pub mod valuation;
