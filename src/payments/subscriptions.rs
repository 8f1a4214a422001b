use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Link;

use super::client::segment;
use super::{Money, PayPalClient};

const SUBSCRIPTIONS_PATH: &str = "/v1/billing/subscriptions";

/// Subscription as PayPal returns it. `status` is kept as the raw string
/// since PayPal reports more states (APPROVAL_PENDING, CANCELLED, EXPIRED)
/// than we store locally.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSubscription {
    pub id: String,
    pub plan_id: Option<String>,
    pub status: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub quantity: Option<String>,
    pub shipping_amount: Option<Money>,
    pub subscriber: Option<serde_json::Value>,
    pub billing_info: Option<serde_json::Value>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTransaction {
    pub id: String,
    pub status: Option<String>,
    pub amount_with_breakdown: Option<serde_json::Value>,
    pub payer_email: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct TransactionList {
    #[serde(default)]
    transactions: Vec<RemoteTransaction>,
}

#[derive(Debug, Serialize)]
struct StatusChangeRequest<'a> {
    reason: &'a str,
}

/// Subscription lifecycle endpoints. Nothing here touches local state.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionsApi<'a> {
    client: &'a PayPalClient,
}

impl<'a> SubscriptionsApi<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self { client }
    }

    fn subscription_path(subscription_id: &str) -> String {
        format!("{}/{}", SUBSCRIPTIONS_PATH, segment(subscription_id))
    }

    pub async fn get(&self, subscription_id: &str) -> Result<RemoteSubscription> {
        self.client
            .get(&Self::subscription_path(subscription_id))
            .await
    }

    /// Fires BILLING.SUBSCRIPTION.CANCELLED.
    pub async fn cancel(&self, subscription_id: &str, reason: &str) -> Result<()> {
        self.transition(subscription_id, "cancel", reason).await
    }

    /// Fires BILLING.SUBSCRIPTION.ACTIVATED.
    pub async fn activate(&self, subscription_id: &str, reason: &str) -> Result<()> {
        self.transition(subscription_id, "activate", reason).await
    }

    /// Fires BILLING.SUBSCRIPTION.SUSPENDED.
    pub async fn suspend(&self, subscription_id: &str, reason: &str) -> Result<()> {
        self.transition(subscription_id, "suspend", reason).await
    }

    async fn transition(&self, subscription_id: &str, action: &str, reason: &str) -> Result<()> {
        self.client
            .post_discarding(
                &format!("{}/{}", Self::subscription_path(subscription_id), action),
                Some(&StatusChangeRequest { reason }),
            )
            .await
    }

    /// Transactions between `start` and `end`, both required by PayPal.
    pub async fn list_transactions(
        &self,
        subscription_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RemoteTransaction>> {
        let query = [
            ("start_time", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("end_time", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];
        let list: TransactionList = self
            .client
            .get_with_query(
                &format!("{}/transactions", Self::subscription_path(subscription_id)),
                &query,
            )
            .await?;
        Ok(list.transactions)
    }
}
