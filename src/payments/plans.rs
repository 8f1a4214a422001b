use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{IntervalUnit, Link, PlanStatus, SetupFeeFailureAction, TenureType};

use super::client::segment;
use super::{FieldChanges, Money, PayPalClient};

const PLANS_PATH: &str = "/v1/billing/plans";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPayload {
    pub interval_unit: IntervalUnit,
    pub interval_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSchemePayload {
    pub fixed_price: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingCyclePayload {
    pub frequency: FrequencyPayload,
    pub tenure_type: TenureType,
    pub sequence: u32,
    #[serde(default)]
    pub total_cycles: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_scheme: Option<PricingSchemePayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPreferencesPayload {
    #[serde(default = "default_auto_bill")]
    pub auto_bill_outstanding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_fee: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_fee_failure_action: Option<SetupFeeFailureAction>,
    #[serde(default)]
    pub payment_failure_threshold: u32,
}

fn default_auto_bill() -> bool {
    true
}

/// Body for `POST /v1/billing/plans`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePlanRequest {
    pub product_id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PlanStatus>,
    pub billing_cycles: Vec<BillingCyclePayload>,
    pub payment_preferences: PaymentPreferencesPayload,
}

/// Plan as PayPal returns it. Listings carry only the summary fields.
#[derive(Debug, Clone, Deserialize)]
pub struct RemotePlan {
    pub id: Option<String>,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<PlanStatus>,
    pub quantity_supported: Option<bool>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub billing_cycles: Vec<BillingCyclePayload>,
    pub payment_preferences: Option<PaymentPreferencesPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingSchemeUpdate {
    pub billing_cycle_sequence: u32,
    pub pricing_scheme: PricingSchemePayload,
}

/// Body for `POST /v1/billing/plans/{id}/update-pricing-schemes`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatePricingRequest {
    pub pricing_schemes: Vec<PricingSchemeUpdate>,
}

/// Billing plan endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PlansApi<'a> {
    client: &'a PayPalClient,
}

impl<'a> PlansApi<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self { client }
    }

    fn plan_path(plan_id: &str) -> String {
        format!("{}/{}", PLANS_PATH, segment(plan_id))
    }

    pub async fn list(&self) -> Result<Vec<RemotePlan>> {
        self.client.list_all(PLANS_PATH).await
    }

    pub async fn get(&self, plan_id: &str) -> Result<RemotePlan> {
        self.client.get(&Self::plan_path(plan_id)).await
    }

    /// Fires BILLING.PLAN.CREATED on success.
    pub async fn create(&self, request: &CreatePlanRequest) -> Result<RemotePlan> {
        self.client.post(PLANS_PATH, request).await
    }

    /// PATCH plan fields. PayPal only honours `description` and
    /// `payment_preferences/{auto_bill_outstanding,payment_failure_threshold}`
    /// (plus a few we don't manage); pricing goes through `update_pricing`.
    pub async fn update(&self, plan_id: &str, changes: &FieldChanges) -> Result<()> {
        self.client
            .patch(&Self::plan_path(plan_id), &changes.to_patch())
            .await
    }

    pub async fn update_pricing(&self, plan_id: &str, request: &UpdatePricingRequest) -> Result<()> {
        self.client
            .post_discarding(
                &format!("{}/update-pricing-schemes", Self::plan_path(plan_id)),
                Some(request),
            )
            .await
    }

    pub async fn activate(&self, plan_id: &str) -> Result<()> {
        self.client
            .post_discarding::<()>(&format!("{}/activate", Self::plan_path(plan_id)), None)
            .await
    }

    pub async fn deactivate(&self, plan_id: &str) -> Result<()> {
        self.client
            .post_discarding::<()>(&format!("{}/deactivate", Self::plan_path(plan_id)), None)
            .await
    }
}
