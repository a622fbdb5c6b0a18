//! Loan desk helper tools
//!
//! Services behind the loan desk's two helper modals:
//! - [`ltv_rate`] - LTV ceilings and interest-rate grids for a case
//! - [`feed`] - templated status messages for a case's referrer

pub mod feed;
pub mod ltv_rate;

pub use feed::{
    customer_names, format_amount, format_date, CaseEvent, CaseSnapshot, FeedError, FeedKind,
    FeedWizard, PriorLoan, SecurityProvider,
};
pub use ltv_rate::LtvRateService;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    /// Reference data could not be loaded; callers may retry
    #[error("Service not ready: {0}")]
    NotReady(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Feed(#[from] FeedError),
}
