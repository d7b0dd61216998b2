//! Dashboard and report composites built from the bucketer and aggregates.

use serde::{Deserialize, Serialize};

use crate::core::aggregate::{self, Extreme, NetIncome, Share};
use crate::core::bucketing::{bucket_period, monthly_buckets};
use crate::records::{
    DatedAmountRecord, IncomeSource, MonthKey, MonthWindow, MonthlyIncomeSummary, Period,
    TaxDeduction,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodOverview {
    pub period: Period,
    pub net_income: NetIncome,
    pub expenses: f64,
    pub remaining_budget: f64,
    pub savings_contributions: f64,
    pub savings_rate: f64,
    pub recent_expenses: Vec<DatedAmountRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    pub month: MonthKey,
    pub income: f64,
    pub expenses: f64,
}

impl MonthlyFlow {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub months: Vec<MonthlyFlow>,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_savings: f64,
    pub highest_income_month: Option<MonthKey>,
    pub lowest_income_month: Option<MonthKey>,
    pub highest_spending_month: Option<MonthKey>,
    pub lowest_spending_month: Option<MonthKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub period: Period,
    pub total: f64,
    pub categories: Vec<Share>,
}

impl CategoryBreakdown {
    pub fn top(&self) -> Option<&Share> {
        self.categories.first()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub year: i32,
    pub gross_income: f64,
    pub taxes_paid: f64,
    pub total_deductions: f64,
}

pub struct SummaryService;

impl SummaryService {
    /// Headline figures for one month or a whole year.
    pub fn period_overview(
        expenses: &[DatedAmountRecord],
        savings: &[DatedAmountRecord],
        income: &[MonthlyIncomeSummary],
        sources: &[IncomeSource],
        period: Period,
        recent_limit: usize,
    ) -> PeriodOverview {
        let spent = bucket_period(expenses, period);
        let contributed = bucket_period(savings, period);
        let net_income = income_in(income, sources, period);
        let expense_total = spent.total();

        let mut recent: Vec<DatedAmountRecord> = spent.records.into_iter().cloned().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(recent_limit);

        PeriodOverview {
            period,
            net_income,
            expenses: expense_total,
            remaining_budget: net_income.net - expense_total,
            savings_contributions: contributed.total(),
            savings_rate: aggregate::savings_rate(net_income.net, expense_total),
            recent_expenses: recent,
        }
    }

    /// Income and expenses for every month of `window`, with the months that
    /// stand out.
    pub fn monthly_trend(
        expenses: &[DatedAmountRecord],
        income: &[MonthlyIncomeSummary],
        sources: &[IncomeSource],
        window: MonthWindow,
    ) -> TrendReport {
        let months: Vec<MonthlyFlow> = monthly_buckets(expenses, window)
            .into_iter()
            .map(|bucket| MonthlyFlow {
                month: bucket.key,
                income: income_in(income, sources, Period::Month(bucket.key)).net,
                expenses: bucket.total(),
            })
            .collect();

        let total_income: f64 = months.iter().map(|m| m.income).sum();
        let total_expenses: f64 = months.iter().map(|m| m.expenses).sum();
        let pick = |selector: fn(&MonthlyFlow) -> f64, extreme| {
            aggregate::extremum(&months, selector, extreme).map(|m| m.month)
        };

        TrendReport {
            highest_income_month: pick(|m| m.income, Extreme::Max),
            lowest_income_month: pick(|m| m.income, Extreme::Min),
            highest_spending_month: pick(|m| m.expenses, Extreme::Max),
            lowest_spending_month: pick(|m| m.expenses, Extreme::Min),
            total_income,
            total_expenses,
            net_savings: total_income - total_expenses,
            months,
        }
    }

    /// Spend per category for `period`, largest first.
    pub fn category_breakdown(expenses: &[DatedAmountRecord], period: Period) -> CategoryBreakdown {
        let bucket = bucket_period(expenses, period);
        let groups =
            aggregate::group_by_sum_desc(bucket.records.iter().copied(), |r| r.category.clone());
        CategoryBreakdown {
            period,
            total: bucket.total(),
            categories: aggregate::shares(&groups),
        }
    }

    /// Income, withheld taxes and claimed deductions for a tax year.
    pub fn tax_summary(
        income: &[MonthlyIncomeSummary],
        sources: &[IncomeSource],
        deductions: &[TaxDeduction],
        year: i32,
    ) -> TaxSummary {
        let net = income_in(income, sources, Period::Year(year));
        TaxSummary {
            year,
            gross_income: net.gross,
            taxes_paid: net.income_tax,
            total_deductions: deductions
                .iter()
                .filter(|d| d.year == year)
                .map(|d| d.amount)
                .sum(),
        }
    }
}

fn income_in(
    summaries: &[MonthlyIncomeSummary],
    sources: &[IncomeSource],
    period: Period,
) -> NetIncome {
    summaries
        .iter()
        .filter(|s| match period {
            Period::Month(key) => s.key() == key,
            Period::Year(year) => s.year == year,
        })
        .map(|s| aggregate::net_income(&s.line_items, sources))
        .fold(NetIncome::default(), NetIncome::combine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::NewRecord;
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(day: NaiveDate, amount: f64, category: &str) -> DatedAmountRecord {
        DatedAmountRecord::standalone(Uuid::new_v4(), &NewRecord::new(day, amount, category))
    }

    fn salary(year: i32, month: u32, gross: f64, tax: f64) -> MonthlyIncomeSummary {
        let items = BTreeMap::from([
            ("Salary".to_string(), gross),
            ("Income Tax".to_string(), -tax),
        ]);
        MonthlyIncomeSummary::new(MonthKey::new(year, month).unwrap(), items)
    }

    #[test]
    fn overview_computes_remaining_budget_and_rate() {
        let expenses = vec![
            expense(date(2024, 3, 2), 300.0, "Rent"),
            expense(date(2024, 3, 20), 100.0, "Food"),
            expense(date(2024, 3, 9), 50.0, "Fuel"),
            expense(date(2024, 3, 28), 50.0, "Food"),
            expense(date(2024, 4, 1), 999.0, "Rent"),
        ];
        let savings = vec![expense(date(2024, 3, 5), 200.0, "Index Fund")];
        let income = vec![salary(2024, 3, 1200.0, 200.0)];
        let period = Period::Month(MonthKey::new(2024, 3).unwrap());

        let overview =
            SummaryService::period_overview(&expenses, &savings, &income, &[], period, 3);
        assert_eq!(overview.net_income.net, 1000.0);
        assert_eq!(overview.expenses, 500.0);
        assert_eq!(overview.remaining_budget, 500.0);
        assert_eq!(overview.savings_contributions, 200.0);
        assert_eq!(overview.savings_rate, 50.0);
        let recent: Vec<_> = overview.recent_expenses.iter().map(|r| r.date).collect();
        assert_eq!(recent, [date(2024, 3, 28), date(2024, 3, 20), date(2024, 3, 9)]);
    }

    #[test]
    fn trend_marks_extreme_months() {
        let expenses = vec![
            expense(date(2024, 1, 10), 100.0, "Food"),
            expense(date(2024, 3, 10), 400.0, "Food"),
        ];
        let income = vec![salary(2024, 1, 2000.0, 0.0), salary(2024, 2, 3000.0, 0.0)];
        let window = MonthWindow::between(date(2024, 1, 1), date(2024, 3, 31));
        let trend = SummaryService::monthly_trend(&expenses, &income, &[], window);

        assert_eq!(trend.months.len(), 3);
        assert_eq!(trend.total_income, 5000.0);
        assert_eq!(trend.total_expenses, 500.0);
        assert_eq!(trend.net_savings, 4500.0);
        assert_eq!(trend.highest_income_month, MonthKey::new(2024, 2));
        assert_eq!(trend.lowest_income_month, MonthKey::new(2024, 1));
        assert_eq!(trend.highest_spending_month, MonthKey::new(2024, 3));
        assert_eq!(trend.lowest_spending_month, MonthKey::new(2024, 1));
    }

    #[test]
    fn breakdown_orders_categories() {
        let expenses = vec![
            expense(date(2024, 5, 1), 30.0, "Food"),
            expense(date(2024, 6, 1), 60.0, "Travel"),
            expense(date(2024, 7, 1), 10.0, "Food"),
        ];
        let breakdown = SummaryService::category_breakdown(&expenses, Period::Year(2024));
        assert_eq!(breakdown.total, 100.0);
        let top = breakdown.top().expect("top category");
        assert_eq!(top.name, "Travel");
        assert_eq!(top.percent, 60.0);
        assert_eq!(breakdown.categories[1].value, 40.0);
    }

    #[test]
    fn tax_summary_combines_income_and_deductions() {
        let income = vec![salary(2024, 1, 5000.0, 700.0), salary(2024, 2, 5000.0, 700.0)];
        let deductions = vec![TaxDeduction {
            id: Uuid::new_v4(),
            year: 2024,
            deduction_type: "Charity".into(),
            amount: 250.0,
            description: None,
            created_at: Utc::now(),
        }];
        let summary = SummaryService::tax_summary(&income, &[], &deductions, 2024);
        assert_eq!(summary.gross_income, 10000.0);
        assert_eq!(summary.taxes_paid, 1400.0);
        assert_eq!(summary.total_deductions, 250.0);
    }
}
