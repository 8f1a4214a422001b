use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::{Amount, CreateAmount, CreateFrequency, Frequency, Link};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Created,
    #[default]
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TenureType {
    Trial,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupFeeFailureAction {
    Continue,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingPlan {
    pub id: i64,
    /// PayPal plan id, blank until the post-commit create has run
    pub plan_id: String,
    /// Local product row
    pub product_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub status: PlanStatus,
    pub quantity_supported: bool,
    pub create_time: Option<i64>,
    pub update_time: Option<i64>,
    pub links: Vec<Link>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPreference {
    pub id: i64,
    pub billing_plan_id: i64,
    pub auto_bill_outstanding: bool,
    pub setup_fee_id: i64,
    pub setup_fee_failure_action: SetupFeeFailureAction,
    pub payment_failure_threshold: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCycle {
    pub id: i64,
    pub billing_plan_id: i64,
    pub frequency_id: i64,
    pub pricing_scheme_id: Option<i64>,
    pub tenure_type: TenureType,
    pub sequence: u32,
    /// 0 means the cycle repeats forever
    pub total_cycles: u32,
}

/// Payment preferences joined with their setup fee.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentPreferenceDetails {
    #[serde(flatten)]
    pub preference: PaymentPreference,
    pub setup_fee: Amount,
}

/// A billing cycle joined with its frequency and fixed price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingCycleDetails {
    #[serde(flatten)]
    pub cycle: BillingCycle,
    pub frequency: Frequency,
    pub fixed_price: Option<Amount>,
}

/// Everything needed to describe a plan to PayPal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingPlanDetails {
    pub plan: BillingPlan,
    /// PayPal id of the linked product, if there is one
    pub remote_product_id: Option<String>,
    pub payment_preferences: PaymentPreferenceDetails,
    /// Ordered by sequence
    pub billing_cycles: Vec<BillingCycleDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBillingPlan {
    #[serde(default)]
    pub product_id: Option<i64>,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: PlanStatus,
    pub payment_preferences: CreatePaymentPreference,
    pub billing_cycles: Vec<CreateBillingCycle>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentPreference {
    #[serde(default = "default_auto_bill")]
    pub auto_bill_outstanding: bool,
    pub setup_fee: CreateAmount,
    pub setup_fee_failure_action: SetupFeeFailureAction,
    #[serde(default)]
    pub payment_failure_threshold: u32,
}

fn default_auto_bill() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBillingCycle {
    pub frequency: CreateFrequency,
    pub tenure_type: TenureType,
    pub sequence: u32,
    #[serde(default)]
    pub total_cycles: u32,
    #[serde(default)]
    pub fixed_price: Option<CreateAmount>,
}

/// Fields of an existing plan that may change. Pricing changes are keyed by
/// cycle sequence; structure (frequency, tenure, count) is fixed once created.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBillingPlan {
    pub description: Option<String>,
    pub auto_bill_outstanding: Option<bool>,
    pub payment_failure_threshold: Option<u32>,
    #[serde(default)]
    pub cycle_prices: Vec<CyclePrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CyclePrice {
    pub sequence: u32,
    pub fixed_price: CreateAmount,
}
