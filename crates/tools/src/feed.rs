//! Feed wizard
//!
//! Builds the short status messages sent to a case's referrer at each step
//! of the loan process (credit check, review, approval, signing, payout).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use loan_desk_config::constants::feeds::{DATE_PLACEHOLDER, DEFAULT_REFERRER, UNKNOWN_CUSTOMER};
use loan_desk_config::{FeedTemplatesConfig, FeedsConfig};

use crate::ToolError;

/// Feed message kinds, in wizard order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    #[serde(rename = "신용조회")]
    CreditCheck,
    #[serde(rename = "결과 확인")]
    CreditResult,
    #[serde(rename = "심사서류")]
    ReviewDocuments,
    #[serde(rename = "심사접수")]
    ReviewSubmitted,
    #[serde(rename = "승인")]
    Approval,
    #[serde(rename = "자서일정")]
    SigningSchedule,
    #[serde(rename = "자서완료")]
    SigningComplete,
    #[serde(rename = "기표")]
    Disbursement,
}

impl FeedKind {
    pub const ALL: [FeedKind; 8] = [
        FeedKind::CreditCheck,
        FeedKind::CreditResult,
        FeedKind::ReviewDocuments,
        FeedKind::ReviewSubmitted,
        FeedKind::Approval,
        FeedKind::SigningSchedule,
        FeedKind::SigningComplete,
        FeedKind::Disbursement,
    ];

    /// Button label, also the template key
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreditCheck => "신용조회",
            Self::CreditResult => "결과 확인",
            Self::ReviewDocuments => "심사서류",
            Self::ReviewSubmitted => "심사접수",
            Self::Approval => "승인",
            Self::SigningSchedule => "자서일정",
            Self::SigningComplete => "자서완료",
            Self::Disbursement => "기표",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeedKind {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == s.trim())
            .ok_or_else(|| FeedError::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Unknown feed kind: {0}")]
    UnknownKind(String),

    #[error("No template for feed kind: {0}")]
    MissingTemplate(FeedKind),

    #[error("Feed templates unavailable: {0}")]
    Templates(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityProvider {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriorLoan {
    /// "선설정" (kept) or "대환" (refinanced)
    #[serde(default)]
    pub loan_type: String,
    #[serde(default)]
    pub financial_company: String,
    /// 만원
    #[serde(default)]
    pub amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseEvent {
    /// "authorizing" (자서) or "journalizing" (기표)
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub date: Option<String>,
}

/// The parts of a case record the feed templates read
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseSnapshot {
    pub borrower_name: Option<String>,
    pub borrower_credit_score: Option<u32>,
    pub address_main: Option<String>,
    pub address_detail: Option<String>,
    pub price_type: Option<String>,
    /// 만원
    pub price_amount: Option<u64>,
    /// 만원
    pub loan_amount: Option<u64>,
    pub interest_rate: Option<f64>,
    pub referrer: Option<String>,
    pub missing_documents: Option<String>,
    pub security_providers: Vec<SecurityProvider>,
    pub prior_loans: Vec<PriorLoan>,
    pub events: Vec<CaseEvent>,
}

impl CaseSnapshot {
    fn event_date(&self, event_type: &str) -> Option<&str> {
        self.events
            .iter()
            .find(|e| e.event_type == event_type)
            .and_then(|e| e.date.as_deref())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Thousands-separated amount in 만원: 12000 -> "12,000만"
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}만", grouped)
}

fn korean_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "일",
        Weekday::Mon => "월",
        Weekday::Tue => "화",
        Weekday::Wed => "수",
        Weekday::Thu => "목",
        Weekday::Fri => "금",
        Weekday::Sat => "토",
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

/// "MM/DD(요일)"; the literal placeholder when missing or unparseable
pub fn format_date(date: Option<&str>) -> String {
    match date.and_then(parse_date) {
        Some(d) => format!(
            "{:02}/{:02}({})",
            d.month(),
            d.day(),
            korean_weekday(d.weekday())
        ),
        None => DATE_PLACEHOLDER.to_string(),
    }
}

/// Borrower and security providers joined by "/", addressed as 고객
pub fn customer_names(case: &CaseSnapshot) -> String {
    let Some(borrower) = non_empty(&case.borrower_name) else {
        return UNKNOWN_CUSTOMER.to_string();
    };

    let names: Vec<&str> = std::iter::once(borrower)
        .chain(
            case.security_providers
                .iter()
                .map(|p| p.name.trim())
                .filter(|n| !n.is_empty()),
        )
        .collect();

    format!("{}고객", names.join("/"))
}

fn prior_loan_lines(case: &CaseSnapshot) -> String {
    case.prior_loans
        .iter()
        .filter(|loan| loan.loan_type == "선설정")
        .map(|loan| format!("선설정 {} {}", loan.financial_company, format_amount(loan.amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn refinance_block(case: &CaseSnapshot) -> String {
    let lines: Vec<String> = case
        .prior_loans
        .iter()
        .filter(|loan| loan.loan_type == "대환")
        .map(|loan| format!("{} {} 대환", loan.financial_company, format_amount(loan.amount)))
        .collect();

    if lines.is_empty() {
        String::new()
    } else {
        format!("-\n{}\n-", lines.join("\n"))
    }
}

/// Every placeholder any template may reference
fn placeholders(case: &CaseSnapshot) -> HashMap<String, String> {
    let credit_score = match case.borrower_credit_score.filter(|s| *s > 0) {
        Some(score) => format!("N{}", score),
        None => "미확인".to_string(),
    };

    let address = match (non_empty(&case.address_main), non_empty(&case.address_detail)) {
        (Some(main), Some(detail)) => format!("{} {}", main, detail),
        _ => "주소 미확인".to_string(),
    };

    let price_info = match case.price_amount.filter(|a| *a > 0) {
        Some(amount) => {
            let price_type = non_empty(&case.price_type).unwrap_or_default();
            format!("{} {}", price_type, format_amount(amount))
                .trim()
                .to_string()
        }
        None => String::new(),
    };

    let loan_amount = case
        .loan_amount
        .filter(|a| *a > 0)
        .map_or_else(|| "OOO".to_string(), format_amount);

    let interest_rate = case
        .interest_rate
        .filter(|r| *r > 0.0)
        .map_or_else(|| "O.OO".to_string(), |r| format!("{:.2}", r));

    let journalizing_date = format_date(case.event_date("journalizing"));
    let completion_note = match non_empty(&case.missing_documents) {
        Some(docs) => format!("{} 미비사항있습니다.", docs),
        None => format!("{} 기표예정입니다.", journalizing_date),
    };

    HashMap::from([
        ("customer_names".to_string(), customer_names(case)),
        (
            "referrer".to_string(),
            non_empty(&case.referrer).unwrap_or(DEFAULT_REFERRER).to_string(),
        ),
        ("credit_score".to_string(), credit_score),
        ("address".to_string(), address),
        ("price_info".to_string(), price_info),
        ("prior_loans".to_string(), prior_loan_lines(case)),
        ("refinance_block".to_string(), refinance_block(case)),
        ("loan_amount".to_string(), loan_amount),
        ("interest_rate".to_string(), interest_rate),
        (
            "authorizing_date".to_string(),
            format_date(case.event_date("authorizing")),
        ),
        ("journalizing_date".to_string(), journalizing_date),
        ("completion_note".to_string(), completion_note),
    ])
}

/// Renders feed messages from templates
pub struct FeedWizard {
    templates: FeedTemplatesConfig,
}

impl FeedWizard {
    pub fn new(templates: FeedTemplatesConfig) -> Self {
        for kind in FeedKind::ALL {
            if templates.get_template(kind.label()).is_none() {
                tracing::warn!(kind = %kind, "Feed template missing");
            }
        }
        Self { templates }
    }

    pub fn from_settings(config: &FeedsConfig) -> Result<Self, ToolError> {
        let templates = FeedTemplatesConfig::load_or_embedded(config.templates_path.as_deref())
            .map_err(|e| FeedError::Templates(e.to_string()))?;
        Ok(Self::new(templates))
    }

    /// Kinds that have a template, in wizard order
    pub fn kinds(&self) -> Vec<FeedKind> {
        FeedKind::ALL
            .into_iter()
            .filter(|kind| self.templates.get_template(kind.label()).is_some())
            .collect()
    }

    pub fn render(&self, kind: FeedKind, case: &CaseSnapshot) -> Result<String, FeedError> {
        let message = self
            .templates
            .build_message(kind.label(), &placeholders(case))
            .ok_or(FeedError::MissingTemplate(kind))?;

        metrics::counter!("feed_messages_total", "kind" => kind.label()).increment(1);
        Ok(message)
    }
}
