//! Record domain models, persistence-friendly types, and calendar helpers.

pub mod calendar;
pub mod holding;
pub mod income;
pub mod record;

pub use calendar::{add_months, MonthKey, MonthWindow, Period};
pub use holding::Holding;
pub use income::{
    DeductionCategory, IncomeSource, MonthlyIncomeSummary, SourceKind, TaxDeduction,
};
pub use record::{
    Amounted, Categorized, Dated, DatedAmountRecord, MutationScope, NewRecord, RecordId,
    RecordPatch, RecurrenceInterval,
};
