//! Deduplicated value rows shared by reference across plans, cycles and
//! subscriptions. They are created through `get_or_create_*` and never
//! updated afterwards.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub id: i64,
    pub currency_code: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateAmount {
    pub currency_code: String,
    pub value: f64,
}

impl CreateAmount {
    pub fn new(currency_code: impl Into<String>, value: f64) -> Self {
        Self {
            currency_code: currency_code.into(),
            value,
        }
    }
}

impl From<&Amount> for CreateAmount {
    fn from(a: &Amount) -> Self {
        Self::new(a.currency_code.clone(), a.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frequency {
    pub id: i64,
    pub interval_unit: IntervalUnit,
    pub interval_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFrequency {
    pub interval_unit: IntervalUnit,
    pub interval_count: u32,
}

impl CreateFrequency {
    pub fn monthly(interval_count: u32) -> Self {
        Self {
            interval_unit: IntervalUnit::Month,
            interval_count,
        }
    }
}

/// Wraps a single fixed price. Two schemes are the same row iff they point
/// at the same `Amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingScheme {
    pub id: i64,
    pub fixed_price_id: i64,
}
