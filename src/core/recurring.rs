//! Expansion of monthly recurring rules into concrete dated instances.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{
    add_months, DatedAmountRecord, MonthKey, NewRecord, RecordId, RecurrenceInterval,
};

/// Rolling horizon applied to open-ended rules.
pub const DEFAULT_HORIZON_MONTHS: u32 = 24;

/// Everything an instance inherits from its rule: all fields except `id`,
/// `date` and `next_due_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub series_id: Uuid,
    pub amount: f64,
    pub category: String,
    pub description: Option<String>,
    pub interval: RecurrenceInterval,
    pub end_date: Option<NaiveDate>,
}

impl RecurringRule {
    pub fn from_new(series_id: Uuid, input: &NewRecord) -> Self {
        Self {
            series_id,
            amount: input.amount,
            category: input.category.clone(),
            description: input.description.clone(),
            interval: input.recurrence.unwrap_or_default(),
            end_date: input.end_date,
        }
    }

    /// Recovers the rule from any member of its series.
    pub fn from_record(record: &DatedAmountRecord) -> Self {
        Self {
            series_id: record.series_id,
            amount: record.amount,
            category: record.category.clone(),
            description: record.description.clone(),
            interval: record.recurrence_interval.unwrap_or_default(),
            end_date: record.end_date,
        }
    }

    fn step(&self, date: NaiveDate) -> NaiveDate {
        match self.interval {
            RecurrenceInterval::Monthly => add_months(date, 1),
        }
    }

    fn instance(&self, date: NaiveDate, boundary: NaiveDate) -> DatedAmountRecord {
        let next = self.step(date);
        DatedAmountRecord {
            id: RecordId::instance(self.series_id, MonthKey::of(date)),
            series_id: self.series_id,
            date,
            amount: self.amount,
            category: self.category.clone(),
            description: self.description.clone(),
            is_recurring: true,
            recurrence_interval: Some(self.interval),
            end_date: self.end_date,
            next_due_date: (next < boundary).then_some(next),
        }
    }
}

/// Expands rules into instances, bounding open-ended rules by a rolling horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceGenerator {
    pub horizon_months: u32,
}

impl Default for RecurrenceGenerator {
    fn default() -> Self {
        Self {
            horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

impl RecurrenceGenerator {
    pub fn new(horizon_months: u32) -> Self {
        Self { horizon_months }
    }

    /// Furthest date (exclusive) through which open-ended rules are generated.
    pub fn horizon(&self, today: NaiveDate) -> NaiveDate {
        add_months(today, i32::try_from(self.horizon_months).unwrap_or(i32::MAX))
    }

    /// Explicit end date when present, otherwise the rolling horizon.
    pub fn boundary(&self, end_date: Option<NaiveDate>, today: NaiveDate) -> NaiveDate {
        end_date.unwrap_or_else(|| self.horizon(today))
    }

    pub fn generate(
        &self,
        rule: &RecurringRule,
        start: NaiveDate,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Vec<DatedAmountRecord> {
        expand(rule, start, self.boundary(end_date, today))
    }
}

/// Produces the instances of `rule` from `start`, one interval apart, while the
/// candidate date precedes `boundary`. The first instance is always emitted.
/// Expansion ends early only when a step can no longer advance the date,
/// which happens at the end of the representable calendar.
pub fn expand(rule: &RecurringRule, start: NaiveDate, boundary: NaiveDate) -> Vec<DatedAmountRecord> {
    let mut instances = vec![rule.instance(start, boundary)];
    let mut previous = start;
    let mut current = rule.step(start);

    while current > previous && current < boundary {
        instances.push(rule.instance(current, boundary));
        previous = current;
        current = rule.step(current);
    }

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn software_rule(end_date: Option<NaiveDate>) -> RecurringRule {
        let input = NewRecord::new(date(2024, 1, 15), 100.0, "Software").monthly();
        let mut rule = RecurringRule::from_new(Uuid::new_v4(), &input);
        rule.end_date = end_date;
        rule
    }

    #[test]
    fn open_ended_rule_fills_default_horizon() {
        let rule = software_rule(None);
        let today = date(2024, 1, 15);
        let instances = RecurrenceGenerator::default().generate(&rule, today, None, today);

        assert_eq!(instances.len(), 24);
        assert_eq!(
            instances[0].id,
            RecordId::instance(rule.series_id, MonthKey { year: 2024, month: 1 })
        );
        assert_eq!(instances[0].next_due_date, Some(date(2024, 2, 15)));
        assert_eq!(instances[23].date, date(2025, 12, 15));
        assert_eq!(instances[23].next_due_date, None);
    }

    #[test]
    fn start_at_or_after_end_yields_single_instance() {
        let rule = software_rule(Some(date(2024, 1, 1)));
        let instances = expand(&rule, date(2024, 1, 15), date(2024, 1, 1));
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].next_due_date, None);
    }

    #[test]
    fn spacing_follows_month_end_clamping() {
        let rule = software_rule(None);
        let instances = expand(&rule, date(2024, 1, 31), date(2024, 5, 1));
        let dates: Vec<_> = instances.iter().map(|i| i.date).collect();
        assert_eq!(
            dates,
            [date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 29), date(2024, 4, 29)]
        );
        for pair in instances.windows(2) {
            assert_eq!(pair[0].next_due_date, Some(pair[1].date));
        }
    }

    #[test]
    fn backdated_rule_runs_through_to_its_boundary() {
        let rule = software_rule(Some(date(2030, 1, 1)));
        let instances = expand(&rule, date(1900, 1, 1), date(2030, 1, 1));

        assert_eq!(instances.len(), 130 * 12);
        let last = instances.last().expect("terminal instance");
        assert_eq!(last.date, date(2029, 12, 1));
        assert_eq!(last.next_due_date, None);
        assert!(instances[..instances.len() - 1]
            .iter()
            .all(|i| i.next_due_date.is_some()));
    }

    #[test]
    fn oversized_horizon_does_not_wrap() {
        let generator = RecurrenceGenerator::new(u32::MAX);
        let today = date(2024, 1, 15);
        assert!(generator.horizon(today) >= today);
    }

    #[test]
    fn regeneration_is_deterministic() {
        let rule = software_rule(Some(date(2024, 6, 1)));
        let first = expand(&rule, date(2024, 1, 15), date(2024, 6, 1));
        let second = expand(&rule, date(2024, 1, 15), date(2024, 6, 1));
        assert_eq!(first, second);
    }
}
