//! Credit-score bands
//!
//! Four fixed, non-overlapping bands with inclusive lower bounds. Scores
//! below the lowest band have no rate entry and stay unclassified.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditBand {
    #[serde(rename = "N865점 이상 (1-2구간)")]
    Band1To2,
    #[serde(rename = "N790점 이상 (3-4구간)")]
    Band3To4,
    #[serde(rename = "N710점 이상 (5-6구간)")]
    Band5To6,
    #[serde(rename = "N685점 이상 (7구간)")]
    Band7,
}

impl CreditBand {
    /// Bands in descending threshold order; classification walks this list
    pub const ALL: [CreditBand; 4] = [
        CreditBand::Band1To2,
        CreditBand::Band3To4,
        CreditBand::Band5To6,
        CreditBand::Band7,
    ];

    /// Inclusive lower bound
    pub fn min_score(&self) -> u32 {
        match self {
            Self::Band1To2 => 865,
            Self::Band3To4 => 790,
            Self::Band5To6 => 710,
            Self::Band7 => 685,
        }
    }

    /// Display label, also the row key in the LTV and rate tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::Band1To2 => "N865점 이상 (1-2구간)",
            Self::Band3To4 => "N790점 이상 (3-4구간)",
            Self::Band5To6 => "N710점 이상 (5-6구간)",
            Self::Band7 => "N685점 이상 (7구간)",
        }
    }

    /// Classify a score. A missing or zero score is unclassified.
    pub fn classify(score: Option<u32>) -> Option<Self> {
        let score = score.filter(|s| *s > 0)?;
        Self::ALL.into_iter().find(|band| score >= band.min_score())
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|band| band.label() == label)
    }
}

impl fmt::Display for CreditBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Band label for a score, or `None` when unclassified
pub fn credit_range(score: Option<u32>) -> Option<&'static str> {
    CreditBand::classify(score).map(|band| band.label())
}
