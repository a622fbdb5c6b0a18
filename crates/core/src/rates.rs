//! Rate and LTV lookup results

use serde::Serialize;

use crate::credit::CreditBand;
use crate::region::{Region, RegionKey};
use crate::tables::Percent;

/// Flat surcharge (percentage points) outside 서울/경기
pub const DEFAULT_REGIONAL_SURCHARGE: f64 = 0.5;

/// Tier assumed when a region is missing from the tier table
pub const DEFAULT_TIER: u8 = 1;

/// Placeholder shown for missing values
pub const PLACEHOLDER: &str = "-";

/// Shown in place of an unclassified credit band
pub const UNCLASSIFIED_LABEL: &str = "미확인";

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One cell of the rate grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RateCell {
    Rate {
        base: f64,
        surcharge: f64,
        /// base + surcharge, rounded to 2 decimals
        total: f64,
    },
    /// No entry for this (band, LTV range) pair
    NoData,
}

impl RateCell {
    pub fn with_surcharge(base: f64, surcharge: f64) -> Self {
        Self::Rate {
            base,
            surcharge,
            total: round2(base + surcharge),
        }
    }

    pub fn total(&self) -> Option<f64> {
        match self {
            Self::Rate { total, .. } => Some(*total),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }

    /// "4.90%", or "-" when there is no data
    pub fn display(&self) -> String {
        match self {
            Self::Rate { total, .. } => format!("{:.2}%", total),
            Self::NoData => PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateRow {
    /// Credit-band label as it appears in the table
    pub band: String,
    /// The caller's own band
    pub is_current: bool,
    /// One cell per entry of [`RateMatrix::ltv_ranges`]
    pub cells: Vec<RateCell>,
}

/// Rate grid: credit bands x LTV ranges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateMatrix {
    pub ltv_ranges: Vec<String>,
    pub rows: Vec<RateRow>,
    pub surcharge: f64,
    pub current_band: Option<CreditBand>,
}

impl RateMatrix {
    pub fn current_row(&self) -> Option<&RateRow> {
        self.rows.iter().find(|row| row.is_current)
    }

    pub fn cell(&self, band: &str, ltv_range: &str) -> Option<&RateCell> {
        let col = self.ltv_ranges.iter().position(|r| r == ltv_range)?;
        self.rows
            .iter()
            .find(|row| row.band == band)
            .and_then(|row| row.cells.get(col))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtvRow {
    pub band: String,
    pub is_current: bool,
    /// One cell per entry of [`LtvMatrix::region_keys`]; `None` when absent
    pub cells: Vec<Option<Percent>>,
}

/// LTV grid: credit bands x region-tier keys
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtvMatrix {
    pub region_keys: Vec<String>,
    pub rows: Vec<LtvRow>,
    pub region: Region,
    pub tier: u8,
    pub current_region_key: Option<RegionKey>,
    pub current_band: Option<CreditBand>,
}

impl LtvMatrix {
    /// The ceiling at the caller's (band, region key) intersection
    pub fn current_ltv(&self) -> Option<Percent> {
        let key = self.current_region_key.as_ref()?;
        let col = self.region_keys.iter().position(|k| k == key.as_str())?;
        self.rows
            .iter()
            .find(|row| row.is_current)
            .and_then(|row| row.cells.get(col).copied().flatten())
    }
}

/// Header line describing the case being priced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentInfo {
    pub address: String,
    pub credit_score: String,
}

impl CurrentInfo {
    pub fn new(address: Option<&str>, credit_score: Option<u32>) -> Self {
        let address = address
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(PLACEHOLDER)
            .to_string();

        let credit_score = match credit_score.filter(|s| *s > 0) {
            Some(score) => {
                let band = CreditBand::classify(Some(score))
                    .map_or(UNCLASSIFIED_LABEL, |b| b.label());
                format!("N{}점 ({})", score, band)
            }
            None => PLACEHOLDER.to_string(),
        };

        Self {
            address,
            credit_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotedRate {
    pub ltv_range: String,
    pub cell: RateCell,
}

/// Everything the LTV/rate helper knows about one case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LtvRateQuote {
    pub info: CurrentInfo,
    pub region: Region,
    pub tier: u8,
    pub region_key: Option<RegionKey>,
    pub credit_band: Option<CreditBand>,
    /// LTV ceiling at (band, region key), if both resolve and the cell exists
    pub ltv: Option<Percent>,
    pub surcharge: f64,
    /// The caller's band row of the rate grid; empty when unclassified
    pub rates: Vec<QuotedRate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_cell_total_rounds() {
        let cell = RateCell::with_surcharge(4.333, 0.5);
        assert_eq!(cell.total(), Some(4.83));
        assert_eq!(RateCell::with_surcharge(4.4, 0.5).display(), "4.90%");
        assert_eq!(RateCell::NoData.display(), "-");
        assert!(RateCell::NoData.total().is_none());
    }

    #[test]
    fn test_rate_cell_serialization() {
        let json = serde_json::to_value(RateCell::NoData).unwrap();
        assert_eq!(json, serde_json::json!({"status": "no_data"}));
        let json = serde_json::to_value(RateCell::with_surcharge(5.0, 0.0)).unwrap();
        assert_eq!(json["status"], "rate");
        assert_eq!(json["total"], 5.0);
    }

    #[test]
    fn test_current_info() {
        let info = CurrentInfo::new(Some("서울 강남구 역삼동"), Some(870));
        assert_eq!(info.address, "서울 강남구 역삼동");
        assert_eq!(info.credit_score, "N870점 (N865점 이상 (1-2구간))");

        let info = CurrentInfo::new(None, None);
        assert_eq!(info.address, "-");
        assert_eq!(info.credit_score, "-");

        let info = CurrentInfo::new(Some("  "), Some(600));
        assert_eq!(info.address, "-");
        assert_eq!(info.credit_score, "N600점 (미확인)");
    }
}
