//! One-off checkout orders (outside the subscription flow).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CreateAmount, Link};

use super::client::segment;
use super::{Money, PayPalClient};

const ORDERS_PATH: &str = "/v2/checkout/orders";

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    intent: &'static str,
    purchase_units: Vec<PurchaseUnit>,
    application_context: ApplicationContext,
}

#[derive(Debug, Serialize)]
struct PurchaseUnit {
    amount: OrderAmount,
}

#[derive(Debug, Serialize)]
struct OrderAmount {
    #[serde(flatten)]
    total: Money,
    breakdown: Breakdown,
}

#[derive(Debug, Serialize)]
struct Breakdown {
    item_total: Money,
}

#[derive(Debug, Serialize)]
struct ApplicationContext {
    shipping_preference: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub purchase_units: Vec<serde_json::Value>,
}

impl RemoteOrder {
    /// The buyer approval URL, present on freshly created orders.
    pub fn approve_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel == "approve")
            .map(|l| l.href.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrdersApi<'a> {
    client: &'a PayPalClient,
}

impl<'a> OrdersApi<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self { client }
    }

    /// Create a CAPTURE-intent order for a single price, no shipping.
    pub async fn create_order(&self, price: &CreateAmount) -> Result<RemoteOrder> {
        let money = Money::from(price);
        let request = CreateOrderRequest {
            intent: "CAPTURE",
            purchase_units: vec![PurchaseUnit {
                amount: OrderAmount {
                    total: money.clone(),
                    breakdown: Breakdown { item_total: money },
                },
            }],
            application_context: ApplicationContext {
                shipping_preference: "NO_SHIPPING",
            },
        };
        self.client.post(ORDERS_PATH, &request).await
    }

    pub async fn capture_order(&self, order_id: &str) -> Result<RemoteOrder> {
        self.client
            .post(
                &format!("{}/{}/capture", ORDERS_PATH, segment(order_id)),
                &serde_json::json!({}),
            )
            .await
    }
}
