//! LTV/rate helper service
//!
//! Owns the reference tables for the process. The tables are read on first
//! use and cached; concurrent first callers wait on the same load. A failed
//! load is logged, reported as [`ToolError::NotReady`] and retried by the
//! next caller.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

use loan_desk_config::{parse_rate_tables, Settings, TableSources, TablesConfig};
use loan_desk_core::{
    normalize_region, LtvMatrix, LtvRateQuote, RateCalculator, RateMatrix, RateTables,
    TableDrivenCalculator,
};

use crate::ToolError;

pub struct LtvRateService {
    tables: TablesConfig,
    regional_surcharge: f64,
    calculator: OnceCell<Arc<TableDrivenCalculator>>,
}

impl LtvRateService {
    /// Service that loads its tables from `tables` on first use
    pub fn new(tables: TablesConfig, regional_surcharge: f64) -> Self {
        Self {
            tables,
            regional_surcharge,
            calculator: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.tables.clone(), settings.rates.regional_surcharge)
    }

    /// Service over tables that are already in memory
    pub fn with_tables(tables: RateTables, regional_surcharge: f64) -> Result<Self, ToolError> {
        let calculator = TableDrivenCalculator::new(Arc::new(tables), regional_surcharge)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

        Ok(Self {
            tables: TablesConfig::default(),
            regional_surcharge,
            calculator: OnceCell::new_with(Some(Arc::new(calculator))),
        })
    }

    /// Whether the tables have been loaded
    pub fn is_ready(&self) -> bool {
        self.calculator.initialized()
    }

    /// The calculator, loading the tables if this is the first call
    pub async fn calculator(&self) -> Result<Arc<TableDrivenCalculator>, ToolError> {
        self.calculator
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    async fn load(&self) -> Result<Arc<TableDrivenCalculator>, ToolError> {
        match self.try_load().await {
            Ok(calculator) => {
                let tables = calculator.tables();
                tracing::info!(
                    dir = %self.tables.dir.display(),
                    regions = tables.regions.len(),
                    ltv_bands = tables.ltv.len(),
                    rate_bands = tables.rates.len(),
                    "Loaded LTV/rate reference tables"
                );
                Ok(Arc::new(calculator))
            }
            Err(e) => {
                tracing::error!(
                    dir = %self.tables.dir.display(),
                    error = %e,
                    "Failed to load LTV/rate reference tables"
                );
                metrics::counter!("table_load_failures_total").increment(1);
                Err(e)
            }
        }
    }

    async fn try_load(&self) -> Result<TableDrivenCalculator, ToolError> {
        let [tiers_path, ltv_path, rates_path] = self.tables.paths();
        let (regional_tiers, ltv, interest_rates) = tokio::try_join!(
            read_table(&tiers_path),
            read_table(&ltv_path),
            read_table(&rates_path),
        )?;

        let tables = parse_rate_tables(TableSources {
            regional_tiers: &regional_tiers,
            ltv: &ltv,
            interest_rates: &interest_rates,
        })
        .map_err(|e| ToolError::NotReady(e.to_string()))?;

        TableDrivenCalculator::new(Arc::new(tables), self.regional_surcharge)
            .map_err(|e| ToolError::InvalidInput(e.to_string()))
    }

    /// Region, tier, band, LTV ceiling and the caller's rate row
    pub async fn quote(
        &self,
        address: Option<&str>,
        credit_score: Option<u32>,
    ) -> Result<LtvRateQuote, ToolError> {
        let calculator = self.calculator().await?;
        let quote = calculator.quote(address.unwrap_or_default(), credit_score);

        tracing::debug!(
            region = %quote.region,
            tier = quote.tier,
            region_key = ?quote.region_key,
            band = ?quote.credit_band,
            "Computed LTV/rate quote"
        );
        metrics::counter!("ltv_rate_requests_total", "kind" => "quote").increment(1);
        Ok(quote)
    }

    /// Rate grid with the caller's band flagged
    pub async fn rate_matrix(
        &self,
        address: Option<&str>,
        credit_score: Option<u32>,
    ) -> Result<RateMatrix, ToolError> {
        let calculator = self.calculator().await?;
        let region = normalize_region(address.unwrap_or_default());
        metrics::counter!("ltv_rate_requests_total", "kind" => "rates").increment(1);
        Ok(calculator.rate_matrix(credit_score, &region))
    }

    /// LTV grid with the caller's band and region key flagged
    pub async fn ltv_matrix(
        &self,
        address: Option<&str>,
        credit_score: Option<u32>,
    ) -> Result<LtvMatrix, ToolError> {
        let calculator = self.calculator().await?;
        let region = normalize_region(address.unwrap_or_default());
        metrics::counter!("ltv_rate_requests_total", "kind" => "ltv").increment(1);
        Ok(calculator.ltv_matrix(&region, credit_score))
    }
}

async fn read_table(path: &Path) -> Result<String, ToolError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ToolError::NotReady(format!("{}: {}", path.display(), e)))
}
