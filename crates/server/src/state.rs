//! Application State
//!
//! Shared state across all handlers. The services are built once here and
//! handed to the router; nothing is looked up through globals.

use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use std::sync::Arc;

use loan_desk_config::{load_settings, Settings};
use loan_desk_tools::{FeedWizard, LtvRateService, ToolError};

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration wrapped in RwLock for reload support
    pub config: Arc<RwLock<Settings>>,
    /// LTV/rate helper over the lazily loaded reference tables
    pub ltv_rate: Arc<LtvRateService>,
    /// Feed message renderer
    pub feeds: Arc<FeedWizard>,
    /// Prometheus handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Environment name for config reload
    env: Option<String>,
}

impl AppState {
    /// Build the services described by `config`
    pub fn new(config: Settings) -> Result<Self, ToolError> {
        let ltv_rate = LtvRateService::from_settings(&config);
        let feeds = FeedWizard::from_settings(&config.feeds)?;
        Ok(Self::with_services(config, ltv_rate, feeds))
    }

    /// State over already constructed services
    pub fn with_services(config: Settings, ltv_rate: LtvRateService, feeds: FeedWizard) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            ltv_rate: Arc::new(ltv_rate),
            feeds: Arc::new(feeds),
            metrics: None,
            env: None,
        }
    }

    pub fn with_env(mut self, env: Option<String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }

    /// Reload configuration from files.
    ///
    /// Server and observability settings apply on restart. Table and
    /// template locations are fixed for the life of their services.
    pub fn reload_config(&self) -> Result<(), String> {
        let new_config = load_settings(self.env.as_deref())
            .map_err(|e| format!("Failed to reload config: {}", e))?;

        let mut config = self.config.write();
        *config = new_config;

        tracing::info!("Configuration reloaded successfully");
        Ok(())
    }
}
