//! Grouping of dated records into calendar buckets.

use crate::records::{Amounted, Dated, MonthKey, MonthWindow, Period};

use super::aggregate;

/// Records falling inside one reporting period.
#[derive(Debug, Clone)]
pub struct Bucket<'a, K, T> {
    pub key: K,
    pub records: Vec<&'a T>,
}

impl<K, T: Amounted> Bucket<'_, K, T> {
    pub fn total(&self) -> f64 {
        aggregate::sum(self.records.iter().copied())
    }
}

impl<K, T> Bucket<'_, K, T> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub type PeriodBucket<'a, T> = Bucket<'a, Period, T>;
pub type MonthBucket<'a, T> = Bucket<'a, MonthKey, T>;

/// Records whose date falls within `period`: the exact month, or any month
/// of the year for [`Period::Year`].
pub fn bucket_period<T: Dated>(records: &[T], period: Period) -> PeriodBucket<'_, T> {
    Bucket {
        key: period,
        records: records.iter().filter(|r| period.contains(r.date())).collect(),
    }
}

/// One bucket per calendar month of `window`, in order, including months with
/// no records, so chart axes never have gaps.
pub fn monthly_buckets<T: Dated>(records: &[T], window: MonthWindow) -> Vec<MonthBucket<'_, T>> {
    let mut buckets: Vec<MonthBucket<'_, T>> = window
        .months()
        .into_iter()
        .map(|key| Bucket {
            key,
            records: Vec::new(),
        })
        .collect();

    for record in records {
        let key = MonthKey::of(record.date());
        if let Some(index) = month_offset(window.start, key) {
            if let Some(bucket) = buckets.get_mut(index) {
                bucket.records.push(record);
            }
        }
    }

    buckets
}

fn month_offset(start: MonthKey, key: MonthKey) -> Option<usize> {
    let offset = (key.year - start.year) * 12 + key.month as i32 - start.month as i32;
    usize::try_from(offset).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DatedAmountRecord, NewRecord};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn expense(y: i32, m: u32, d: u32, amount: f64) -> DatedAmountRecord {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        DatedAmountRecord::standalone(Uuid::new_v4(), &NewRecord::new(date, amount, "Food"))
    }

    #[test]
    fn sparse_records_still_yield_every_month() {
        let records = vec![
            expense(2024, 1, 3, 10.0),
            expense(2024, 3, 1, 20.0),
            expense(2024, 3, 28, 5.0),
            expense(2024, 4, 9, 7.5),
            expense(2023, 12, 31, 99.0),
        ];
        let window = MonthWindow::between(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
        );
        let buckets = monthly_buckets(&records, window);
        let totals: Vec<_> = buckets.iter().map(|b| b.total()).collect();
        assert_eq!(totals, [10.0, 0.0, 25.0, 7.5]);
        assert!(buckets[1].is_empty());
    }

    #[test]
    fn year_period_ignores_month() {
        let records = vec![
            expense(2024, 1, 3, 10.0),
            expense(2024, 11, 1, 20.0),
            expense(2025, 1, 1, 5.0),
        ];
        let bucket = bucket_period(&records, Period::Year(2024));
        assert_eq!(bucket.len(), 2);
        assert_eq!(bucket.total(), 30.0);

        let november = bucket_period(
            &records,
            Period::Month(MonthKey {
                year: 2024,
                month: 11,
            }),
        );
        assert_eq!(november.total(), 20.0);
    }
}
