//! Tax deductions claimed per tax year.

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::records::{RecordId, TaxDeduction};
use crate::storage::Repository;

use super::{validate_amount, validate_label, ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewTaxDeduction {
    pub year: i32,
    pub deduction_type: String,
    pub amount: f64,
    pub description: Option<String>,
}

pub struct DeductionService<R> {
    repository: R,
    deductions: Vec<TaxDeduction>,
}

impl<R: Repository<TaxDeduction>> DeductionService<R> {
    pub fn open(repository: R) -> ServiceResult<Self> {
        let deductions = repository.load()?;
        Ok(Self {
            repository,
            deductions,
        })
    }

    pub fn deductions(&self) -> &[TaxDeduction] {
        &self.deductions
    }

    pub fn add(&mut self, input: NewTaxDeduction, created_at: DateTime<Utc>) -> ServiceResult<Uuid> {
        validate_amount(input.amount)?;
        validate_label("deduction type", &input.deduction_type)?;
        let deduction = TaxDeduction {
            id: Uuid::new_v4(),
            year: input.year,
            deduction_type: input.deduction_type,
            amount: input.amount,
            description: input.description,
            created_at,
        };
        let id = deduction.id;
        let mut next = self.deductions.clone();
        next.push(deduction);
        self.commit(next)?;
        info!(%id, "tax deduction added");
        Ok(id)
    }

    pub fn update<F>(&mut self, id: Uuid, mutator: F) -> ServiceResult<()>
    where
        F: FnOnce(&mut TaxDeduction),
    {
        let mut next = self.deductions.clone();
        let deduction = next
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| not_found(id))?;
        mutator(deduction);
        validate_amount(deduction.amount)?;
        validate_label("deduction type", &deduction.deduction_type)?;
        self.commit(next)
    }

    pub fn remove(&mut self, id: Uuid) -> ServiceResult<TaxDeduction> {
        let index = self
            .deductions
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| not_found(id))?;
        let mut next = self.deductions.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(%id, "tax deduction removed");
        Ok(removed)
    }

    pub fn for_year(&self, year: i32) -> Vec<&TaxDeduction> {
        self.deductions.iter().filter(|d| d.year == year).collect()
    }

    pub fn for_year_and_type(&self, year: i32, deduction_type: &str) -> Vec<&TaxDeduction> {
        self.deductions
            .iter()
            .filter(|d| d.year == year && d.deduction_type == deduction_type)
            .collect()
    }

    pub fn total_for_year(&self, year: i32) -> f64 {
        self.for_year(year).iter().map(|d| d.amount).sum()
    }

    fn commit(&mut self, next: Vec<TaxDeduction>) -> ServiceResult<()> {
        self.repository.store(&next)?;
        self.deductions = next;
        Ok(())
    }
}

fn not_found(id: Uuid) -> ServiceError {
    warn!(%id, "tax deduction not found");
    ServiceError::NotFound(RecordId::standalone(id))
}
