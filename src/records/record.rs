use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::MonthKey;

/// Exposes the calendar date an entry is attributed to.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// Supplies a common contract for retrieving numeric amounts.
pub trait Amounted {
    fn amount(&self) -> f64;
}

/// Exposes the free-text classification label of an entry.
pub trait Categorized {
    fn category(&self) -> &str;
}

/// Identifier of a stored record, unique within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Identifier of a standalone record: the series id itself.
    pub fn standalone(series_id: Uuid) -> Self {
        Self(series_id.to_string())
    }

    /// Identifier of a generated instance, derived from the series and the
    /// instance's month so regenerating a range reproduces the same ids.
    pub fn instance(series_id: Uuid, month: MonthKey) -> Self {
        Self(format!("{}-{}-{}", series_id, month.year, month.month0()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceInterval {
    #[default]
    Monthly,
}

impl RecurrenceInterval {
    pub fn label(&self) -> &'static str {
        match self {
            RecurrenceInterval::Monthly => "Monthly",
        }
    }
}

/// A dated amount shared by expenses and savings entries. Recurring rules are
/// stored as their expanded instances; every instance of one rule shares
/// `series_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedAmountRecord {
    pub id: RecordId,
    pub series_id: Uuid,
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_interval: Option<RecurrenceInterval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_due_date: Option<NaiveDate>,
}

impl DatedAmountRecord {
    /// Builds a standalone, non-recurring record from submitted input.
    pub fn standalone(series_id: Uuid, input: &NewRecord) -> Self {
        Self {
            id: RecordId::standalone(series_id),
            series_id,
            date: input.date,
            amount: input.amount,
            category: input.category.clone(),
            description: input.description.clone(),
            is_recurring: false,
            recurrence_interval: None,
            end_date: None,
            next_due_date: None,
        }
    }

    /// A record drives generation when it is flagged recurring with a cadence.
    pub fn is_recurring_rule(&self) -> bool {
        self.is_recurring && self.recurrence_interval.is_some()
    }

    /// Display label used in reminders and listings.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(&self.category)
    }

    /// Merges the non-date fields of `patch` into this record.
    pub fn apply_patch(&mut self, patch: &RecordPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = &patch.category {
            self.category = category.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(is_recurring) = patch.is_recurring {
            self.is_recurring = is_recurring;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date);
        }
    }
}

impl Dated for DatedAmountRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Amounted for DatedAmountRecord {
    fn amount(&self) -> f64 {
        self.amount
    }
}

impl Categorized for DatedAmountRecord {
    fn category(&self) -> &str {
        &self.category
    }
}

/// Input for a new record. A recurring submission carries a cadence and an
/// optional end date; a standalone one leaves both unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub recurrence: Option<RecurrenceInterval>,
    pub end_date: Option<NaiveDate>,
}

impl NewRecord {
    pub fn new(date: NaiveDate, amount: f64, category: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            category: category.into(),
            description: None,
            recurrence: None,
            end_date: None,
        }
    }

    pub fn monthly(mut self) -> Self {
        self.recurrence = Some(RecurrenceInterval::Monthly);
        self
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Partial update applied to one instance or to a whole series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_recurring: Option<bool>,
    pub end_date: Option<NaiveDate>,
}

impl RecordPatch {
    /// Structural patches reshape a series instead of rewriting fields in place.
    pub fn is_structural(&self) -> bool {
        self.is_recurring == Some(false) || self.end_date.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self == &RecordPatch::default()
    }
}

/// Which records a mutation on a series member targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationScope {
    Instance,
    Series,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_uses_zero_based_month() {
        let series = Uuid::nil();
        let id = RecordId::instance(series, MonthKey { year: 2024, month: 1 });
        assert_eq!(id.as_str(), "00000000-0000-0000-0000-000000000000-2024-0");
    }

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let input = NewRecord::new(date, 100.0, "Software");
        let record = DatedAmountRecord::standalone(Uuid::nil(), &input);
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["seriesId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["isRecurring"], false);
        assert!(json.get("nextDueDate").is_none());
    }

    #[test]
    fn structural_patch_detection() {
        assert!(!RecordPatch::default().is_structural());
        let collapse = RecordPatch {
            is_recurring: Some(false),
            ..RecordPatch::default()
        };
        assert!(collapse.is_structural());
        let rename = RecordPatch {
            category: Some("Rent".into()),
            ..RecordPatch::default()
        };
        assert!(!rename.is_structural());
    }

    #[test]
    fn label_prefers_description() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let input = NewRecord::new(date, 9.0, "Software").with_description("Editor licence");
        let record = DatedAmountRecord::standalone(Uuid::new_v4(), &input);
        assert_eq!(record.label(), "Editor licence");
    }
}
