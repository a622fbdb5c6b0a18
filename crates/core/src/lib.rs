//! Core types for the loan desk
//!
//! This crate provides the lookup logic shared by every other crate:
//! - Address normalization into canonical regions
//! - Region-tier key composition
//! - Credit-score bands
//! - Reference tables (region tiers, LTV, interest rates)
//! - The `RateCalculator` trait and its table-driven implementation

pub mod credit;
pub mod rates;
pub mod region;
pub mod tables;
pub mod traits;

pub use credit::{credit_range, CreditBand};
pub use rates::{
    CurrentInfo, LtvMatrix, LtvRateQuote, LtvRow, QuotedRate, RateCell,
    RateMatrix, RateRow, DEFAULT_REGIONAL_SURCHARGE, DEFAULT_TIER,
};
pub use region::{normalize_region, region_key, MetroCity, Region, RegionKey};
pub use tables::{LtvTable, OrderedTable, Percent, RateTable, RateTables, RegionTierTable};
pub use traits::{CalculatorError, RateCalculator, TableDrivenCalculator};
