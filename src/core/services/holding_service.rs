//! Investment holdings with their valuation and allocation by asset type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::aggregate::{self, Share};
use crate::records::{Categorized, Holding, RecordId};
use crate::storage::Repository;

use super::{validate_amount, validate_label, ServiceError, ServiceResult};

#[derive(Debug, Clone, PartialEq)]
pub struct NewHolding {
    pub name: String,
    pub asset_type: String,
    pub invested_amount: f64,
    pub units: f64,
    pub current_price: Option<f64>,
    pub purchase_date: NaiveDate,
}

/// Invested total against current worth across every holding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValue {
    pub total_invested: f64,
    pub current_value: f64,
    pub returns: f64,
    pub return_percent: f64,
}

pub struct HoldingService<R> {
    repository: R,
    holdings: Vec<Holding>,
}

impl<R: Repository<Holding>> HoldingService<R> {
    pub fn open(repository: R) -> ServiceResult<Self> {
        let holdings = repository.load()?;
        Ok(Self {
            repository,
            holdings,
        })
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn of_type(&self, asset_type: &str) -> Vec<&Holding> {
        self.holdings
            .iter()
            .filter(|h| h.category().eq_ignore_ascii_case(asset_type))
            .collect()
    }

    pub fn add(&mut self, input: NewHolding) -> ServiceResult<Uuid> {
        validate_label("holding name", &input.name)?;
        validate_label("asset type", &input.asset_type)?;
        validate_amount(input.invested_amount)?;
        validate_units(input.units)?;
        if let Some(price) = input.current_price {
            validate_amount(price)?;
        }
        let holding = Holding {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            asset_type: input.asset_type.trim().to_string(),
            invested_amount: input.invested_amount,
            units: input.units,
            current_price: input.current_price,
            purchase_date: input.purchase_date,
        };
        let id = holding.id;
        let mut next = self.holdings.clone();
        next.push(holding);
        self.commit(next)?;
        info!(%id, "holding added");
        Ok(id)
    }

    /// Records the latest market price of one holding.
    pub fn update_price(&mut self, id: Uuid, price: f64) -> ServiceResult<&Holding> {
        validate_amount(price)?;
        let index = self.index_of(id)?;
        let mut next = self.holdings.clone();
        next[index].current_price = Some(price);
        self.commit(next)?;
        info!(%id, price, "holding price updated");
        Ok(&self.holdings[index])
    }

    pub fn remove(&mut self, id: Uuid) -> ServiceResult<Holding> {
        let index = self.index_of(id)?;
        let mut next = self.holdings.clone();
        let removed = next.remove(index);
        self.commit(next)?;
        info!(%id, "holding removed");
        Ok(removed)
    }

    pub fn valuation(&self) -> PortfolioValue {
        let total_invested: f64 = self.holdings.iter().map(|h| h.invested_amount).sum();
        let current_value = aggregate::sum(&self.holdings);
        let returns = current_value - total_invested;
        PortfolioValue {
            total_invested,
            current_value,
            returns,
            return_percent: aggregate::ratio(returns, total_invested),
        }
    }

    /// Current value per asset type, largest first, with each type's share.
    pub fn allocation(&self) -> Vec<Share> {
        let groups = aggregate::group_by_sum_desc(&self.holdings, |h| h.category().to_string());
        aggregate::shares(&groups)
    }

    fn index_of(&self, id: Uuid) -> ServiceResult<usize> {
        self.holdings.iter().position(|h| h.id == id).ok_or_else(|| {
            warn!(%id, "holding not found");
            ServiceError::NotFound(RecordId::standalone(id))
        })
    }

    fn commit(&mut self, next: Vec<Holding>) -> ServiceResult<()> {
        self.repository.store(&next)?;
        self.holdings = next;
        Ok(())
    }
}

fn validate_units(units: f64) -> ServiceResult<()> {
    if !units.is_finite() || units < 0.0 {
        return Err(ServiceError::Validation(
            "units must be a finite, non-negative number".into(),
        ));
    }
    Ok(())
}
