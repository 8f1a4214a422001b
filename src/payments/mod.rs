mod client;
mod orders;
mod patch;
mod plans;
mod products;
mod subscriptions;

pub use client::*;
pub use orders::*;
pub use patch::*;
pub use plans::*;
pub use products::*;
pub use subscriptions::*;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::CreateAmount;

/// PayPal money object. `value` travels as a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

impl Money {
    pub fn to_amount(&self) -> Result<CreateAmount> {
        let value: f64 = self.value.trim().parse().map_err(|_| {
            AppError::InvalidResponse(format!("amount value {:?} is not a number", self.value))
        })?;
        Ok(CreateAmount::new(self.currency_code.clone(), value))
    }
}

impl From<&CreateAmount> for Money {
    fn from(amount: &CreateAmount) -> Self {
        Self {
            currency_code: amount.currency_code.clone(),
            value: amount.value.to_string(),
        }
    }
}
