//! Reference table loading
//!
//! The three tables are JSON documents shipped as static resources:
//! - regional_tiers.json - normalized region name -> tier
//! - ltv_data.json - credit band -> region-tier key -> LTV
//! - interest_rate_data.json - credit band -> LTV range -> base rate

use loan_desk_core::{CreditBand, LtvTable, RateTable, RateTables, RegionTierTable};
use serde::de::DeserializeOwned;

use crate::ConfigError;

/// Raw JSON text of the three tables
#[derive(Debug, Clone, Copy)]
pub struct TableSources<'a> {
    pub regional_tiers: &'a str,
    pub ltv: &'a str,
    pub interest_rates: &'a str,
}

fn parse_table<T: DeserializeOwned>(name: &str, content: &str) -> Result<T, ConfigError> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", name, e)))
}

/// Parse and validate the three tables
pub fn parse_rate_tables(sources: TableSources<'_>) -> Result<RateTables, ConfigError> {
    let regions: RegionTierTable = parse_table("regional_tiers", sources.regional_tiers)?;
    let ltv: LtvTable = parse_table("ltv_data", sources.ltv)?;
    let rates: RateTable = parse_table("interest_rate_data", sources.interest_rates)?;

    let tables = RateTables::new(regions, ltv, rates);
    validate_rate_tables(&tables)?;
    Ok(tables)
}

/// Structural checks. Empty rate or LTV tables are rejected; rows whose
/// label is not a known credit band are kept but can never be the
/// caller's current row, so they are only warned about.
pub fn validate_rate_tables(tables: &RateTables) -> Result<(), ConfigError> {
    if tables.rates.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "interest_rate_data".to_string(),
            message: "table has no credit band rows".to_string(),
        });
    }
    if tables.ltv.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "ltv_data".to_string(),
            message: "table has no credit band rows".to_string(),
        });
    }

    for (name, labels) in [
        ("interest_rate_data", tables.rates.keys().collect::<Vec<_>>()),
        ("ltv_data", tables.ltv.keys().collect::<Vec<_>>()),
    ] {
        for label in labels {
            if CreditBand::from_label(label).is_none() {
                tracing::warn!(table = name, band = label, "Unrecognized credit band row");
            }
        }
    }

    if let Some((region, _)) = tables.regions.iter().find(|(_, tier)| **tier == 0) {
        return Err(ConfigError::InvalidValue {
            field: format!("regional_tiers.{}", region),
            message: "tier must be 1 or greater".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TablesConfig;
    use loan_desk_core::Percent;

    const REGIONS: &str = r#"{"서울": 1, "경기": 2}"#;
    const LTV: &str = r#"{"N865점 이상 (1-2구간)": {"서울_1급지": "80%"}}"#;
    const RATES: &str = r#"{"N865점 이상 (1-2구간)": {"~70%": "4.9%"}}"#;

    #[test]
    fn test_parse_rate_tables() {
        let tables = parse_rate_tables(TableSources {
            regional_tiers: REGIONS,
            ltv: LTV,
            interest_rates: RATES,
        })
        .unwrap();
        assert_eq!(tables.regions.get("경기"), Some(&2));
        assert_eq!(
            tables
                .rates
                .get("N865점 이상 (1-2구간)")
                .and_then(|row| row.get("~70%")),
            Some(&Percent::new(4.9))
        );
    }

    #[test]
    fn test_parse_error_names_table() {
        let err = parse_rate_tables(TableSources {
            regional_tiers: REGIONS,
            ltv: LTV,
            interest_rates: r#"{"band": {"~70%": "abc"}}"#,
        })
        .unwrap_err();
        assert!(err.to_string().contains("interest_rate_data"));
    }

    #[test]
    fn test_rejects_empty_rate_table() {
        let err = parse_rate_tables(TableSources {
            regional_tiers: REGIONS,
            ltv: LTV,
            interest_rates: "{}",
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_rejects_zero_tier() {
        let err = parse_rate_tables(TableSources {
            regional_tiers: r#"{"서울": 0}"#,
            ltv: LTV,
            interest_rates: RATES,
        })
        .unwrap_err();
        assert!(err.to_string().contains("regional_tiers.서울"));
    }

    #[test]
    fn test_shipped_tables_load() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/tables");
        let [regional_tiers, ltv, interest_rates] = TablesConfig::in_dir(dir)
            .paths()
            .map(|path| std::fs::read_to_string(path).unwrap());
        let tables = parse_rate_tables(TableSources {
            regional_tiers: &regional_tiers,
            ltv: &ltv,
            interest_rates: &interest_rates,
        })
        .unwrap();

        for band in CreditBand::ALL {
            assert!(tables.rates.contains_key(band.label()), "{}", band);
            assert!(tables.ltv.contains_key(band.label()), "{}", band);
        }
        assert_eq!(tables.regions.get("서울"), Some(&1));
    }
}
