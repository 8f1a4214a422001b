use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::Link;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Suspended,
}

/// Local mirror of a PayPal subscription. Rows are written by the webhook
/// receiver; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub subscription_id: String,
    pub user_id: i64,
    pub plan_id: i64,
    pub status: SubscriptionStatus,
    pub start_time: i64,
    pub shipping_amount_id: Option<i64>,
    pub billing_info: serde_json::Value,
    pub create_time: i64,
    pub update_time: i64,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: i64,
    pub subscription_id: i64,
    /// PayPal name object (`given_name`, `surname`)
    pub name: serde_json::Value,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayPalProfile {
    pub id: i64,
    pub user_id: i64,
    pub subscription_valid_till: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PayPalProfile {
    pub fn has_subscription(&self) -> bool {
        self.has_subscription_at(Utc::now().timestamp())
    }

    /// True once `subscription_valid_till` is set and has already elapsed.
    ///
    /// NOTE: this reads backwards relative to the column name (a "valid till"
    /// in the future reports no subscription). Kept as-is until the billing
    /// side confirms which way round it should be.
    pub fn has_subscription_at(&self, now: i64) -> bool {
        match self.subscription_valid_till {
            Some(valid_till) => valid_till <= now,
            None => false,
        }
    }
}
