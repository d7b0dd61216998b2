//! Pure reductions over bucketed records: totals, groupings, extremes, ratios,
//! and net-income partitioning of monthly line items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::records::{Amounted, DeductionCategory, IncomeSource, SourceKind};

const TAX_MARKERS: [&str; 2] = ["tax", "tds"];

/// A labeled total, e.g. one category's spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// A labeled total with its percentage of the grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    pub value: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    /// Ignores zero-valued items: an empty month is not the lowest month.
    Min,
}

/// Arithmetic total; zero for an empty input.
pub fn sum<'a, T, I>(records: I) -> f64
where
    T: Amounted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    records.into_iter().map(Amounted::amount).sum()
}

/// Sums records per key and orders the groups by descending total. Ties keep
/// alphabetical key order.
pub fn group_by_sum_desc<'a, T, I, F, K>(records: I, key_fn: F) -> Vec<NamedValue>
where
    T: Amounted + 'a,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> K,
    K: AsRef<str>,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for record in records {
        let key = key_fn(record);
        *totals.entry(key.as_ref().to_string()).or_insert(0.0) += record.amount();
    }

    let mut groups: Vec<NamedValue> = totals
        .into_iter()
        .map(|(name, value)| NamedValue { name, value })
        .collect();
    groups.sort_by(|a, b| b.value.total_cmp(&a.value));
    groups
}

/// Finds the first item holding the largest or smallest selected value.
pub fn extremum<T, F>(items: &[T], selector: F, extreme: Extreme) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let value = selector(item);
        if extreme == Extreme::Min && value == 0.0 {
            continue;
        }
        let replace = match (best, extreme) {
            (None, _) => true,
            (Some((_, current)), Extreme::Max) => value > current,
            (Some((_, current)), Extreme::Min) => value < current,
        };
        if replace {
            best = Some((item, value));
        }
    }
    best.map(|(item, _)| item)
}

/// `numerator / denominator` as a percentage; zero when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator * 100.0
}

/// Attaches each group's percentage of the combined total.
pub fn shares(groups: &[NamedValue]) -> Vec<Share> {
    let total: f64 = groups.iter().map(|g| g.value).sum();
    groups
        .iter()
        .map(|g| Share {
            name: g.name.clone(),
            value: g.value,
            percent: ratio(g.value, total),
        })
        .collect()
}

/// Share of net income left after expenses, as a percentage.
pub fn savings_rate(net_income: f64, expenses: f64) -> f64 {
    ratio(net_income - expenses, net_income)
}

/// Gross income, deductions and take-home pay for a set of line items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetIncome {
    pub gross: f64,
    pub deductions: f64,
    pub net: f64,
    pub income_tax: f64,
}

impl NetIncome {
    fn finish(mut self) -> Self {
        self.net = self.gross - self.deductions;
        self
    }

    pub fn combine(self, other: NetIncome) -> NetIncome {
        NetIncome {
            gross: self.gross + other.gross,
            deductions: self.deductions + other.deductions,
            net: self.net + other.net,
            income_tax: self.income_tax + other.income_tax,
        }
    }
}

/// Whether a deduction label names an income tax withholding.
pub fn is_income_tax_label(name: &str) -> bool {
    let lower = name.to_lowercase();
    TAX_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Partitions by sign: positive items are income, negative items deductions.
pub fn net_by_sign(line_items: &BTreeMap<String, f64>) -> NetIncome {
    let mut totals = NetIncome::default();
    for (name, &amount) in line_items {
        if amount > 0.0 {
            totals.gross += amount;
        } else {
            totals.deductions += amount.abs();
            if amount < 0.0 && is_income_tax_label(name) {
                totals.income_tax += amount.abs();
            }
        }
    }
    totals.finish()
}

/// Partitions by the declared type of each item's source. Items without a
/// matching source are ignored; deductions count by magnitude whatever sign
/// they were entered with.
pub fn net_by_sources(line_items: &BTreeMap<String, f64>, sources: &[IncomeSource]) -> NetIncome {
    let mut totals = NetIncome::default();
    for (name, &amount) in line_items {
        let Some(source) = sources.iter().find(|s| &s.name == name) else {
            continue;
        };
        match source.kind {
            SourceKind::Income => totals.gross += amount,
            SourceKind::Deduction => {
                totals.deductions += amount.abs();
                if source.deduction_category == Some(DeductionCategory::TaxOrActualDeduction)
                    && is_income_tax_label(&source.name)
                {
                    totals.income_tax += amount.abs();
                }
            }
        }
    }
    totals.finish()
}

/// Typed partitioning when any sources are declared, sign-based otherwise.
pub fn net_income(line_items: &BTreeMap<String, f64>, sources: &[IncomeSource]) -> NetIncome {
    if sources.is_empty() {
        net_by_sign(line_items)
    } else {
        net_by_sources(line_items, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DatedAmountRecord, NewRecord};
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn expense(category: &str, amount: f64) -> DatedAmountRecord {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        DatedAmountRecord::standalone(Uuid::new_v4(), &NewRecord::new(date, amount, category))
    }

    #[test]
    fn sum_of_nothing_is_zero() {
        let empty: Vec<DatedAmountRecord> = Vec::new();
        assert_eq!(sum(&empty), 0.0);
    }

    #[test]
    fn groups_are_sorted_by_descending_total() {
        let records = vec![
            expense("Food", 20.0),
            expense("Rent", 900.0),
            expense("Food", 35.0),
            expense("Fuel", 55.0),
        ];
        let groups = group_by_sum_desc(&records, |r| r.category.clone());
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Rent", "Food", "Fuel"]);
        assert_eq!(groups[1].value, 55.0);
    }

    #[test]
    fn min_extremum_skips_zero_buckets() {
        let months = [("Jan", 0.0), ("Feb", 40.0), ("Mar", 25.0), ("Apr", 0.0)];
        let lowest = extremum(&months, |m| m.1, Extreme::Min).expect("non-zero month");
        assert_eq!(lowest.0, "Mar");
        let highest = extremum(&months, |m| m.1, Extreme::Max).expect("some month");
        assert_eq!(highest.0, "Feb");

        let idle = [("Jan", 0.0)];
        assert!(extremum(&idle, |m| m.1, Extreme::Min).is_none());
    }

    #[test]
    fn ratio_guards_zero_denominator() {
        assert_eq!(ratio(50.0, 0.0), 0.0);
        assert_eq!(ratio(25.0, 200.0), 12.5);
        assert_eq!(savings_rate(0.0, 10.0), 0.0);
    }

    #[test]
    fn net_by_sign_separates_deductions() {
        let items = BTreeMap::from([
            ("Salary".to_string(), 5000.0),
            ("Bonus".to_string(), 500.0),
            ("Income Tax".to_string(), -800.0),
            ("Pension".to_string(), -200.0),
        ]);
        let net = net_by_sign(&items);
        assert_eq!(net.gross, 5500.0);
        assert_eq!(net.deductions, 1000.0);
        assert_eq!(net.net, 4500.0);
        assert_eq!(net.income_tax, 800.0);
    }

    #[test]
    fn net_by_sources_uses_declared_types() {
        let sources = vec![
            IncomeSource::income("Salary"),
            IncomeSource::deduction("TDS", DeductionCategory::TaxOrActualDeduction),
            IncomeSource::deduction("Provident Fund", DeductionCategory::EmployerContribution),
        ];
        let items = BTreeMap::from([
            ("Salary".to_string(), 6000.0),
            ("TDS".to_string(), 700.0),
            ("Provident Fund".to_string(), 300.0),
            ("Unknown".to_string(), 50.0),
        ]);
        let net = net_by_sources(&items, &sources);
        assert_eq!(net.gross, 6000.0);
        assert_eq!(net.deductions, 1000.0);
        assert_eq!(net.net, 5000.0);
        assert_eq!(net.income_tax, 700.0);
    }

    #[test]
    fn net_income_falls_back_to_signs_without_sources() {
        let items = BTreeMap::from([
            ("Salary".to_string(), 4000.0),
            ("Tax".to_string(), -400.0),
        ]);
        assert_eq!(net_income(&items, &[]).net, 3600.0);

        let sources = vec![
            IncomeSource::income("Salary"),
            IncomeSource::deduction("Tax", DeductionCategory::TaxOrActualDeduction),
        ];
        let typed = net_income(&items, &sources);
        assert_eq!(typed.deductions, 400.0);
        assert_eq!(typed.income_tax, 400.0);
        assert_eq!(typed.net, 3600.0);
    }

    #[test]
    fn shares_sum_to_one_hundred() {
        let groups = vec![
            NamedValue {
                name: "Rent".into(),
                value: 75.0,
            },
            NamedValue {
                name: "Food".into(),
                value: 25.0,
            },
        ];
        let shares = shares(&groups);
        assert_eq!(shares[0].percent, 75.0);
        assert_eq!(shares[1].percent, 25.0);
    }
}
