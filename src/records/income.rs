use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::MonthKey;

/// Labeled income and deduction amounts for one calendar month. Positive
/// amounts are income, negative amounts are deductions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyIncomeSummary {
    pub id: Uuid,
    pub year: i32,
    /// 1-based month number.
    pub month: u32,
    #[serde(default)]
    pub line_items: BTreeMap<String, f64>,
}

impl MonthlyIncomeSummary {
    pub fn new(month: MonthKey, line_items: BTreeMap<String, f64>) -> Self {
        Self {
            id: Uuid::new_v4(),
            year: month.year,
            month: month.month,
            line_items,
        }
    }

    pub fn key(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Income,
    Deduction,
}

/// Separates withholdings and real deductions from contributions made on
/// the earner's behalf, such as employer retirement matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionCategory {
    TaxOrActualDeduction,
    EmployerContribution,
}

/// A named line-item source that types the entries of a monthly summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSource {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deduction_category: Option<DeductionCategory>,
}

impl IncomeSource {
    pub fn income(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: SourceKind::Income,
            deduction_category: None,
        }
    }

    pub fn deduction(name: impl Into<String>, category: DeductionCategory) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind: SourceKind::Deduction,
            deduction_category: Some(category),
        }
    }
}

/// A tax-deductible amount claimed for a tax year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxDeduction {
    pub id: Uuid,
    pub year: i32,
    pub deduction_type: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
