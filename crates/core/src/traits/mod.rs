//! Core traits for the loan desk
//!
//! ```text
//! Lookup:
//!   - RateCalculator: LTV ceilings, base rates, surcharges and grids
//! ```

mod calculator;

pub use calculator::{CalculatorError, RateCalculator, TableDrivenCalculator};
