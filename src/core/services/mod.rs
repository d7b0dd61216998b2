pub mod deduction_service;
pub mod holding_service;
pub mod income_service;
pub mod income_source_service;
pub mod record_service;
pub mod summary_service;

pub use deduction_service::{DeductionService, NewTaxDeduction};
pub use holding_service::{HoldingService, NewHolding, PortfolioValue};
pub use income_service::IncomeService;
pub use income_source_service::{IncomeSourceService, NewIncomeSource};
pub use record_service::{
    AddOutcome, RecordService, RecordSettings, RefreshReport, RemoveOutcome, UpdateOutcome,
};
pub use summary_service::{
    CategoryBreakdown, MonthlyFlow, PeriodOverview, SummaryService, TaxSummary, TrendReport,
};

use crate::errors::PersistenceError;
use crate::records::RecordId;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] PersistenceError),
    #[error("Record not found: {0}")]
    NotFound(RecordId),
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Rejects negative, non-finite amounts before any collection mutation.
pub(crate) fn validate_amount(amount: f64) -> ServiceResult<()> {
    if !amount.is_finite() {
        return Err(ServiceError::Validation("amount must be a finite number".into()));
    }
    if amount < 0.0 {
        return Err(ServiceError::Validation("amount must not be negative".into()));
    }
    Ok(())
}

pub(crate) fn validate_label(field: &str, value: &str) -> ServiceResult<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}
