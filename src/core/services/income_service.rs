//! Monthly income summaries, one per calendar month.

use std::collections::BTreeMap;

use tracing::info;

use crate::core::aggregate::{self, NetIncome};
use crate::records::{IncomeSource, MonthKey, MonthlyIncomeSummary, Period};
use crate::storage::Repository;

use super::{validate_label, ServiceError, ServiceResult};

pub struct IncomeService<R> {
    repository: R,
    summaries: Vec<MonthlyIncomeSummary>,
}

impl<R: Repository<MonthlyIncomeSummary>> IncomeService<R> {
    pub fn open(repository: R) -> ServiceResult<Self> {
        let summaries = repository.load()?;
        Ok(Self {
            repository,
            summaries,
        })
    }

    pub fn summaries(&self) -> &[MonthlyIncomeSummary] {
        &self.summaries
    }

    /// Saves the line items for `month`, replacing any summary already stored
    /// for the same month.
    pub fn save(
        &mut self,
        month: MonthKey,
        line_items: BTreeMap<String, f64>,
    ) -> ServiceResult<&MonthlyIncomeSummary> {
        for (label, amount) in &line_items {
            validate_label("line item label", label)?;
            if !amount.is_finite() {
                return Err(ServiceError::Validation(format!(
                    "line item `{label}` must be a finite number"
                )));
            }
        }

        let summary = MonthlyIncomeSummary::new(month, line_items);
        let mut next = self.summaries.clone();
        let index = match next.iter().position(|s| s.key() == month) {
            Some(index) => {
                next[index] = summary;
                index
            }
            None => {
                next.push(summary);
                next.len() - 1
            }
        };
        self.repository.store(&next)?;
        self.summaries = next;
        info!(%month, "monthly income saved");
        Ok(&self.summaries[index])
    }

    pub fn get(&self, month: MonthKey) -> Option<&MonthlyIncomeSummary> {
        self.summaries.iter().find(|s| s.key() == month)
    }

    /// Summaries falling inside `period`.
    pub fn in_period(&self, period: Period) -> Vec<&MonthlyIncomeSummary> {
        self.summaries
            .iter()
            .filter(|s| match period {
                Period::Month(key) => s.key() == key,
                Period::Year(year) => s.year == year,
            })
            .collect()
    }

    /// Net income across `period`, typing line items by `sources` when any
    /// are declared and by sign otherwise.
    pub fn net_income(&self, period: Period, sources: &[IncomeSource]) -> NetIncome {
        self.in_period(period)
            .into_iter()
            .map(|s| aggregate::net_income(&s.line_items, sources))
            .fold(NetIncome::default(), NetIncome::combine)
    }
}
