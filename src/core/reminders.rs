//! Reminders for recurring records coming due soon.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{add_months, DatedAmountRecord, RecordId};

/// An upcoming recurring payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueReminder {
    pub record_id: RecordId,
    pub label: String,
    pub amount: f64,
    pub due: NaiveDate,
}

/// When each record was last reminded about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderLog(BTreeMap<RecordId, DateTime<Utc>>);

impl ReminderLog {
    pub fn last_reminded(&self, id: &RecordId) -> Option<DateTime<Utc>> {
        self.0.get(id).copied()
    }

    pub fn record(&mut self, id: RecordId, at: DateTime<Utc>) {
        self.0.insert(id, at);
    }

    /// Drops entries for records that no longer exist.
    pub fn retain_known<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a DatedAmountRecord>,
    {
        let known: BTreeSet<&RecordId> = records.into_iter().map(|r| &r.id).collect();
        self.0.retain(|id, _| known.contains(id));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderPolicy {
    pub window_months: u32,
    pub cooldown: Duration,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            window_months: 1,
            cooldown: Duration::hours(24),
        }
    }
}

/// Collects recurring records whose next due date lies within the policy
/// window starting today, skipping records reminded within the cooldown.
/// Every returned reminder is stamped into `log`.
pub fn collect_due(
    records: &[DatedAmountRecord],
    now: DateTime<Utc>,
    policy: ReminderPolicy,
    log: &mut ReminderLog,
) -> Vec<DueReminder> {
    let today = now.date_naive();
    let window_end = add_months(today, policy.window_months as i32);
    let mut reminders = Vec::new();

    for record in records.iter().filter(|r| r.is_recurring) {
        let Some(due) = record.next_due_date else {
            continue;
        };
        if due < today || due > window_end {
            continue;
        }
        if let Some(last) = log.last_reminded(&record.id) {
            if now - last <= policy.cooldown {
                continue;
            }
        }
        log.record(record.id.clone(), now);
        reminders.push(DueReminder {
            record_id: record.id.clone(),
            label: record.label().to_string(),
            amount: record.amount,
            due,
        });
    }

    reminders.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.record_id.cmp(&b.record_id)));
    tracing::debug!(count = reminders.len(), "collected due reminders");
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recurring::{expand, RecurringRule};
    use crate::records::NewRecord;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(day: NaiveDate) -> DateTime<Utc> {
        day.and_hms_opt(9, 0, 0).unwrap().and_utc()
    }

    fn series() -> Vec<DatedAmountRecord> {
        let input = NewRecord::new(date(2024, 1, 10), 15.0, "Streaming").monthly();
        let rule = RecurringRule::from_new(Uuid::new_v4(), &input);
        expand(&rule, date(2024, 1, 10), date(2024, 6, 1))
    }

    #[test]
    fn reminds_only_within_window() {
        let records = series();
        let mut log = ReminderLog::default();
        let reminders = collect_due(&records, at(date(2024, 2, 20)), ReminderPolicy::default(), &mut log);
        let dues: Vec<_> = reminders.iter().map(|r| r.due).collect();
        assert_eq!(dues, [date(2024, 3, 10)]);
        assert_eq!(reminders[0].label, "Streaming");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn cooldown_suppresses_repeat_reminders() {
        let records = series();
        let mut log = ReminderLog::default();
        let policy = ReminderPolicy::default();
        let first = collect_due(&records, at(date(2024, 2, 20)), policy, &mut log);
        assert_eq!(first.len(), 1);

        let same_day = collect_due(&records, at(date(2024, 2, 20)), policy, &mut log);
        assert!(same_day.is_empty());

        let two_days_later = collect_due(&records, at(date(2024, 2, 22)), policy, &mut log);
        assert_eq!(two_days_later.len(), 1);
    }

    #[test]
    fn retain_known_forgets_removed_records() {
        let expenses = series();
        let savings = series();
        let mut log = ReminderLog::default();
        let now = at(date(2024, 2, 20));
        collect_due(&expenses, now, ReminderPolicy::default(), &mut log);
        collect_due(&savings, now, ReminderPolicy::default(), &mut log);
        assert_eq!(log.len(), 2);

        log.retain_known(expenses.iter().chain(&savings));
        assert_eq!(log.len(), 2);

        log.retain_known(&savings);
        assert_eq!(log.len(), 1);
        assert!(log.last_reminded(&savings[1].id).is_some());
        assert!(log.last_reminded(&expenses[1].id).is_none());
    }
}
