//! Rate calculator trait for LTV and interest-rate lookup
//!
//! This module provides the lookup interface used by the LTV/rate helper.
//! All values come from the reference tables; nothing is interpolated. A
//! composed key that is absent from a table is reported as "no data".
//!
//! # Example
//!
//! ```ignore
//! use loan_desk_core::traits::RateCalculator;
//!
//! let calc = TableDrivenCalculator::new(tables, 0.5)?;
//! let quote = calc.quote("부산광역시 해운대구", Some(800));
//! ```

use std::sync::Arc;

use crate::credit::CreditBand;
use crate::rates::{
    round2, CurrentInfo, LtvMatrix, LtvRateQuote, LtvRow, QuotedRate, RateCell, RateMatrix,
    RateRow, DEFAULT_TIER,
};
use crate::region::{normalize_region, Region, RegionKey};
use crate::tables::{Percent, RateTables};

/// Calculator error
#[derive(Debug, Clone, PartialEq)]
pub enum CalculatorError {
    /// Invalid input parameter
    InvalidInput { param: String, message: String },
}

impl std::fmt::Display for CalculatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput { param, message } => {
                write!(f, "Invalid input '{}': {}", param, message)
            }
        }
    }
}

impl std::error::Error for CalculatorError {}

/// LTV and rate lookup over reference tables
pub trait RateCalculator: Send + Sync {
    /// Tier for a canonical region; regions missing from the table get tier 1
    fn tier_of(&self, region: &Region) -> u8;

    /// Surcharge in percentage points: 0 for 서울/경기, flat otherwise
    fn regional_adjustment(&self, region: &Region) -> f64;

    /// Base rate at (band label, LTV range)
    fn base_rate(&self, band: &str, ltv_range: &str) -> Option<f64>;

    /// LTV ceiling at (band label, region key)
    fn ltv(&self, band: &str, region_key: &RegionKey) -> Option<Percent>;

    /// Rate grid for every band and LTV range
    fn rate_matrix(&self, credit_score: Option<u32>, region: &Region) -> RateMatrix;

    /// LTV grid for every band and region key
    fn ltv_matrix(&self, region: &Region, credit_score: Option<u32>) -> LtvMatrix;

    /// Total rate at one cell, with the region's surcharge applied
    fn rate(&self, band: &str, ltv_range: &str, region: &Region) -> RateCell {
        match self.base_rate(band, ltv_range) {
            Some(base) => RateCell::with_surcharge(base, self.regional_adjustment(region)),
            None => RateCell::NoData,
        }
    }

    /// Resolve region, tier, band, LTV ceiling and the caller's rate row
    fn quote(&self, address: &str, credit_score: Option<u32>) -> LtvRateQuote {
        let region = normalize_region(address);
        let tier = self.tier_of(&region);
        let region_key = RegionKey::resolve(&region, tier);
        let credit_band = CreditBand::classify(credit_score);

        let ltv = match (credit_band, region_key.as_ref()) {
            (Some(band), Some(key)) => self.ltv(band.label(), key),
            _ => None,
        };

        let matrix = self.rate_matrix(credit_score, &region);
        let rates = matrix
            .current_row()
            .map(|row| {
                matrix
                    .ltv_ranges
                    .iter()
                    .zip(&row.cells)
                    .map(|(range, cell)| QuotedRate {
                        ltv_range: range.clone(),
                        cell: *cell,
                    })
                    .collect()
            })
            .unwrap_or_default();

        LtvRateQuote {
            info: CurrentInfo::new(Some(address), credit_score),
            surcharge: matrix.surcharge,
            region,
            tier,
            region_key,
            credit_band,
            ltv,
            rates,
        }
    }
}

/// Table-driven calculator implementation
#[derive(Debug, Clone)]
pub struct TableDrivenCalculator {
    tables: Arc<RateTables>,
    /// Surcharge outside the capital area
    regional_surcharge: f64,
}

impl TableDrivenCalculator {
    /// Create a calculator over loaded tables
    pub fn new(tables: Arc<RateTables>, regional_surcharge: f64) -> Result<Self, CalculatorError> {
        if !regional_surcharge.is_finite() || regional_surcharge < 0.0 {
            return Err(CalculatorError::InvalidInput {
                param: "regional_surcharge".to_string(),
                message: format!("must be a non-negative number, got {}", regional_surcharge),
            });
        }

        Ok(Self {
            tables,
            regional_surcharge,
        })
    }

    pub fn tables(&self) -> &RateTables {
        &self.tables
    }
}

impl RateCalculator for TableDrivenCalculator {
    fn tier_of(&self, region: &Region) -> u8 {
        self.tables
            .regions
            .get(region.name())
            .copied()
            .unwrap_or(DEFAULT_TIER)
    }

    fn regional_adjustment(&self, region: &Region) -> f64 {
        if region.is_capital_area() {
            0.0
        } else {
            self.regional_surcharge
        }
    }

    fn base_rate(&self, band: &str, ltv_range: &str) -> Option<f64> {
        self.tables
            .rates
            .get(band)
            .and_then(|row| row.get(ltv_range))
            .map(Percent::value)
    }

    fn ltv(&self, band: &str, region_key: &RegionKey) -> Option<Percent> {
        self.tables
            .ltv
            .get(band)
            .and_then(|row| row.get(region_key.as_str()))
            .copied()
    }

    fn rate_matrix(&self, credit_score: Option<u32>, region: &Region) -> RateMatrix {
        let current_band = CreditBand::classify(credit_score);
        let surcharge = self.regional_adjustment(region);
        let ltv_ranges = RateTables::column_union(&self.tables.rates);

        let rows = self
            .tables
            .rates
            .iter()
            .map(|(band, row)| {
                let cells = ltv_ranges
                    .iter()
                    .map(|range| match row.get(range) {
                        Some(base) => RateCell::with_surcharge(base.value(), surcharge),
                        None => {
                            tracing::debug!(band, ltv_range = %range, "No rate entry for cell");
                            RateCell::NoData
                        }
                    })
                    .collect();

                RateRow {
                    band: band.to_string(),
                    is_current: current_band.is_some_and(|b| b.label() == band),
                    cells,
                }
            })
            .collect();

        RateMatrix {
            ltv_ranges,
            rows,
            surcharge: round2(surcharge),
            current_band,
        }
    }

    fn ltv_matrix(&self, region: &Region, credit_score: Option<u32>) -> LtvMatrix {
        let current_band = CreditBand::classify(credit_score);
        let tier = self.tier_of(region);
        let current_region_key = RegionKey::resolve(region, tier);
        let region_keys = RateTables::column_union(&self.tables.ltv);

        let rows = self
            .tables
            .ltv
            .iter()
            .map(|(band, row)| LtvRow {
                band: band.to_string(),
                is_current: current_band.is_some_and(|b| b.label() == band),
                cells: region_keys.iter().map(|key| row.get(key).copied()).collect(),
            })
            .collect();

        LtvMatrix {
            region_keys,
            rows,
            region: region.clone(),
            tier,
            current_region_key,
            current_band,
        }
    }
}
