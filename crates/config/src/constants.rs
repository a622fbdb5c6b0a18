//! Centralized constants for the loan desk
//!
//! Single source of truth for default values used across crates.

/// Regional pricing
pub mod rates {
    /// Surcharge (percentage points) applied outside 서울/경기
    pub const REGIONAL_SURCHARGE: f64 = loan_desk_core::DEFAULT_REGIONAL_SURCHARGE;

    /// Upper bound accepted by settings validation
    pub const MAX_REGIONAL_SURCHARGE: f64 = 5.0;
}

/// Reference table files
pub mod tables {
    /// Directory holding the three JSON tables
    pub const DEFAULT_DIR: &str = "config/tables";

    /// Normalized region name -> tier
    pub const REGIONAL_TIERS_FILE: &str = "regional_tiers.json";

    /// Credit band -> region-tier key -> LTV
    pub const LTV_FILE: &str = "ltv_data.json";

    /// Credit band -> LTV range -> base rate
    pub const INTEREST_RATE_FILE: &str = "interest_rate_data.json";
}

/// Feed wizard
pub mod feeds {
    /// Signature used when a case has no referrer
    pub const DEFAULT_REFERRER: &str = "래퍼명";

    /// Greeting used when a case has no borrower name
    pub const UNKNOWN_CUSTOMER: &str = "OOO고객";

    /// Date placeholder for missing or unparseable event dates
    pub const DATE_PLACEHOLDER: &str = "MM/DD(요일)";
}

/// Server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
}

/// Environment variable names
pub mod env {
    /// Prefix for settings overrides (LOAN_DESK__SERVER__PORT=9000)
    pub const PREFIX: &str = "LOAN_DESK";

    /// Selects config/{env}.yaml
    pub const ENVIRONMENT: &str = "LOAN_DESK_ENV";
}
