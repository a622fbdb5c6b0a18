//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::{env, rates, server, tables};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Reference table locations
    #[serde(default)]
    pub tables: TablesConfig,

    /// Regional pricing
    #[serde(default)]
    pub rates: RatesConfig,

    /// Feed wizard
    #[serde(default)]
    pub feeds: FeedsConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_rates()?;
        self.validate_tables()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if self.server.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.timeout_seconds".to_string(),
                message: "Timeout cannot be 0".to_string(),
            });
        }

        if self.environment.is_production() && !self.server.cors_enabled {
            return Err(ConfigError::InvalidValue {
                field: "server.cors_enabled".to_string(),
                message: "CORS must be enabled in production".to_string(),
            });
        }

        Ok(())
    }

    fn validate_rates(&self) -> Result<(), ConfigError> {
        let surcharge = self.rates.regional_surcharge;
        if !surcharge.is_finite() || !(0.0..=rates::MAX_REGIONAL_SURCHARGE).contains(&surcharge) {
            return Err(ConfigError::InvalidValue {
                field: "rates.regional_surcharge".to_string(),
                message: format!(
                    "Must be between 0.0 and {}, got {}",
                    rates::MAX_REGIONAL_SURCHARGE,
                    surcharge
                ),
            });
        }
        Ok(())
    }

    fn validate_tables(&self) -> Result<(), ConfigError> {
        if self.tables.dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("tables.dir".to_string()));
        }

        // Missing files only matter once the tables are first used; strict
        // environments check up front.
        if self.environment.is_strict() {
            for path in self.tables.paths() {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound(path.display().to_string()));
                }
            }
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    server::DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    server::DEFAULT_PORT
}
fn default_timeout() -> u64 {
    server::DEFAULT_TIMEOUT_SECONDS
}
fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_timeout(),
            cors_enabled: default_true(),
            // Empty by default - must be explicitly configured for production
            cors_origins: Vec::new(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Reference table locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Directory holding the three JSON tables
    #[serde(default = "default_tables_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_regional_tiers_file")]
    pub regional_tiers_file: String,

    #[serde(default = "default_ltv_file")]
    pub ltv_file: String,

    #[serde(default = "default_interest_rate_file")]
    pub interest_rate_file: String,
}

fn default_tables_dir() -> PathBuf {
    PathBuf::from(tables::DEFAULT_DIR)
}
fn default_regional_tiers_file() -> String {
    tables::REGIONAL_TIERS_FILE.to_string()
}
fn default_ltv_file() -> String {
    tables::LTV_FILE.to_string()
}
fn default_interest_rate_file() -> String {
    tables::INTEREST_RATE_FILE.to_string()
}

impl TablesConfig {
    /// Config rooted at `dir` with the standard file names
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn regional_tiers_path(&self) -> PathBuf {
        self.dir.join(&self.regional_tiers_file)
    }

    pub fn ltv_path(&self) -> PathBuf {
        self.dir.join(&self.ltv_file)
    }

    pub fn interest_rate_path(&self) -> PathBuf {
        self.dir.join(&self.interest_rate_file)
    }

    /// Region tiers, LTV, interest rates
    pub fn paths(&self) -> [PathBuf; 3] {
        [
            self.regional_tiers_path(),
            self.ltv_path(),
            self.interest_rate_path(),
        ]
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            dir: default_tables_dir(),
            regional_tiers_file: default_regional_tiers_file(),
            ltv_file: default_ltv_file(),
            interest_rate_file: default_interest_rate_file(),
        }
    }
}

/// Regional pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Surcharge (percentage points) outside 서울/경기
    #[serde(default = "default_regional_surcharge")]
    pub regional_surcharge: f64,
}

fn default_regional_surcharge() -> f64 {
    rates::REGIONAL_SURCHARGE
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            regional_surcharge: default_regional_surcharge(),
        }
    }
}

/// Feed wizard configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedsConfig {
    /// Override for the embedded feed templates
    #[serde(default)]
    pub templates_path: Option<PathBuf>,
}

/// Load settings from configuration files and environment.
///
/// Priority: env vars > config/{env}.* > config/default.* > defaults
pub fn load_settings(env_name: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    // Load default config
    builder = builder.add_source(File::with_name("config/default").required(false));

    // Load environment-specific config
    if let Some(env_name) = env_name {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    // Load from environment variables
    builder = builder.add_source(
        Environment::with_prefix(env::PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}
