//! Declared income sources and deductions that type monthly line items.

use tracing::{info, warn};
use uuid::Uuid;

use crate::records::{DeductionCategory, IncomeSource, RecordId, SourceKind};
use crate::storage::Repository;

use super::{validate_label, ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncomeSource {
    pub name: String,
    pub kind: SourceKind,
    pub deduction_category: Option<DeductionCategory>,
}

pub struct IncomeSourceService<R> {
    repository: R,
    sources: Vec<IncomeSource>,
}

impl<R: Repository<IncomeSource>> IncomeSourceService<R> {
    pub fn open(repository: R) -> ServiceResult<Self> {
        let sources = repository.load()?;
        Ok(Self {
            repository,
            sources,
        })
    }

    pub fn sources(&self) -> &[IncomeSource] {
        &self.sources
    }

    /// Declares a source. Deductions without a category count as tax or
    /// actual deductions; income sources never carry one.
    pub fn add(&mut self, input: NewIncomeSource) -> ServiceResult<&IncomeSource> {
        let name = input.name.trim();
        validate_label("source name", name)?;
        let deduction_category = match input.kind {
            SourceKind::Income => None,
            SourceKind::Deduction => Some(
                input
                    .deduction_category
                    .unwrap_or(DeductionCategory::TaxOrActualDeduction),
            ),
        };
        if self.sources.iter().any(|s| {
            s.name == name && s.kind == input.kind && s.deduction_category == deduction_category
        }) {
            return Err(ServiceError::Validation(format!(
                "source `{name}` already exists"
            )));
        }

        let source = IncomeSource {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind: input.kind,
            deduction_category,
        };
        let mut next = self.sources.clone();
        next.push(source);
        self.repository.store(&next)?;
        self.sources = next;
        let added = &self.sources[self.sources.len() - 1];
        info!(id = %added.id, name = %added.name, "income source added");
        Ok(added)
    }

    pub fn remove(&mut self, id: Uuid) -> ServiceResult<IncomeSource> {
        let Some(index) = self.sources.iter().position(|s| s.id == id) else {
            warn!(%id, "income source not found");
            return Err(ServiceError::NotFound(RecordId::standalone(id)));
        };
        let mut next = self.sources.clone();
        let removed = next.remove(index);
        self.repository.store(&next)?;
        self.sources = next;
        info!(%id, "income source removed");
        Ok(removed)
    }
}
