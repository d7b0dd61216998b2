use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::{Amounted, Categorized};

/// An investment position tracked by what was paid and, when known, what it
/// is worth today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub id: Uuid,
    pub name: String,
    /// Free-text asset class such as "Stocks" or "Mutual Funds".
    #[serde(rename = "type")]
    pub asset_type: String,
    pub invested_amount: f64,
    #[serde(default)]
    pub units: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    pub purchase_date: NaiveDate,
}

impl Holding {
    /// Units times the latest price, or the invested amount while the
    /// position has no price or no units.
    pub fn current_value(&self) -> f64 {
        match self.current_price {
            Some(price) if self.units > 0.0 => self.units * price,
            _ => self.invested_amount,
        }
    }

    pub fn returns(&self) -> f64 {
        self.current_value() - self.invested_amount
    }
}

impl Amounted for Holding {
    fn amount(&self) -> f64 {
        self.current_value()
    }
}

impl Categorized for Holding {
    fn category(&self) -> &str {
        &self.asset_type
    }
}
