//! Shared test utilities for integration tests.
#![allow(dead_code, unused_imports)]

use rusqlite::Connection;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub use paypal_sync::db::queries;
pub use paypal_sync::error::AppError;
pub use paypal_sync::models::*;
pub use paypal_sync::payments::*;
pub use paypal_sync::sync::*;

pub const TEST_PRODUCT_ID: &str = "PROD-XXCD1234QWER65782";
pub const TEST_PLAN_ID: &str = "P-5ML4271244454362WXNWU5NQ";
pub const TEST_TIME: &str = "2020-05-27T12:13:51Z";
pub const TEST_TIME_UNIX: i64 = 1590581631;
pub const LATER_TIME: &str = "2020-06-01T08:00:00Z";
pub const LATER_TIME_UNIX: i64 = 1590998400;

/// In-memory database with the schema applied.
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory db");
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    paypal_sync::db::init_db(&conn).expect("Failed to init schema");
    conn
}

/// Mock PayPal with the token endpoint mounted.
pub async fn paypal_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "scope": "https://uri.paypal.com/services/subscriptions",
            "access_token": "A21AAFEpH4PsADK7qSS7pSRsgzfENtu-Q1ysgEDVDESseMHBYXVJYE8ovjj68elIDy8nF26AwPhfXTIeWAZHSLIsQkSYz9ifg",
            "token_type": "Bearer",
            "app_id": "APP-80W284485P519543T",
            "expires_in": 31668
        })))
        .mount(&server)
        .await;
    server
}

pub fn test_client(server: &MockServer) -> PayPalClient {
    let config = PayPalConfig::new("test-client-id", "test-secret", PayPalEnvironment::Sandbox)
        .with_base_url(server.uri());
    PayPalClient::new(&config).expect("Failed to build client")
}

/// Requests the server received, excluding the token exchange.
pub async fn api_requests(server: &MockServer) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() != "/v1/oauth2/token")
        .collect()
}

pub fn widget_input() -> CreateProduct {
    CreateProduct {
        name: "Widget".into(),
        description: String::new(),
        product_type: ProductType::Physical,
        category: ProductCategory::Software,
        image_url: String::new(),
        home_url: String::new(),
    }
}

/// A product row that is already on PayPal.
pub fn create_synced_product(conn: &Connection, remote_id: &str) -> Product {
    let mut product = Product::from_input(&CreateProduct {
        name: "Video Streaming Service".into(),
        description: "Video streaming service".into(),
        product_type: ProductType::Service,
        category: ProductCategory::Software,
        image_url: "https://example.com/streaming.jpg".into(),
        home_url: "https://example.com/home".into(),
    });
    product.product_id = remote_id.to_string();
    product.create_time = Some(TEST_TIME_UNIX);
    product.update_time = Some(TEST_TIME_UNIX);
    queries::insert_product(conn, &mut product).expect("Failed to insert product");
    product
}

/// Trial month followed by a monthly $10 regular cycle.
pub fn basic_plan_input(product_id: Option<i64>) -> CreateBillingPlan {
    CreateBillingPlan {
        product_id,
        name: "Basic Plan".into(),
        description: "Basic plan".into(),
        status: PlanStatus::Active,
        payment_preferences: CreatePaymentPreference {
            auto_bill_outstanding: true,
            setup_fee: CreateAmount::new("USD", 10.0),
            setup_fee_failure_action: SetupFeeFailureAction::Continue,
            payment_failure_threshold: 3,
        },
        billing_cycles: vec![
            CreateBillingCycle {
                frequency: CreateFrequency::monthly(1),
                tenure_type: TenureType::Trial,
                sequence: 1,
                total_cycles: 1,
                fixed_price: None,
            },
            CreateBillingCycle {
                frequency: CreateFrequency::monthly(1),
                tenure_type: TenureType::Regular,
                sequence: 2,
                total_cycles: 12,
                fixed_price: Some(CreateAmount::new("USD", 10.0)),
            },
        ],
    }
}

/// A plan row linked to a synced product and already created on PayPal.
pub fn create_synced_plan(conn: &Connection) -> BillingPlan {
    let product = create_synced_product(conn, TEST_PRODUCT_ID);
    let plan = queries::create_billing_plan(conn, &basic_plan_input(product.id))
        .expect("Failed to create plan");
    queries::apply_plan_snapshot(
        conn,
        plan.id,
        &RemoteSnapshot {
            remote_id: Some(TEST_PLAN_ID.into()),
            create_time: Some(TEST_TIME_UNIX),
            update_time: Some(TEST_TIME_UNIX),
            ..Default::default()
        },
    )
    .expect("Failed to apply snapshot");
    queries::get_billing_plan_by_id(conn, plan.id).unwrap().unwrap()
}

/// Plan detail body as PayPal returns it.
pub fn remote_plan_json(plan_id: &str, product_id: &str, update_time: &str) -> Value {
    json!({
        "id": plan_id,
        "product_id": product_id,
        "name": "Basic Plan",
        "status": "ACTIVE",
        "description": "Basic plan",
        "billing_cycles": [
            {
                "frequency": {"interval_unit": "MONTH", "interval_count": 1},
                "tenure_type": "TRIAL",
                "sequence": 1,
                "total_cycles": 1
            },
            {
                "pricing_scheme": {
                    "fixed_price": {"currency_code": "USD", "value": "10.0"},
                    "version": 1
                },
                "frequency": {"interval_unit": "MONTH", "interval_count": 1},
                "tenure_type": "REGULAR",
                "sequence": 2,
                "total_cycles": 12
            }
        ],
        "payment_preferences": {
            "auto_bill_outstanding": true,
            "setup_fee": {"currency_code": "USD", "value": "10.0"},
            "setup_fee_failure_action": "CONTINUE",
            "payment_failure_threshold": 3
        },
        "quantity_supported": true,
        "create_time": TEST_TIME,
        "update_time": update_time,
        "links": [
            {"href": format!("https://api-m.paypal.com/v1/billing/plans/{}", plan_id), "rel": "self", "method": "GET"}
        ]
    })
}

pub fn remote_product_json(product_id: &str) -> Value {
    json!({
        "id": product_id,
        "name": "Video Streaming Service",
        "description": "Video streaming service",
        "type": "SERVICE",
        "category": "SOFTWARE",
        "image_url": "https://example.com/streaming.jpg",
        "home_url": "https://example.com/home",
        "create_time": TEST_TIME,
        "update_time": TEST_TIME,
        "links": [
            {"href": format!("https://api-m.paypal.com/v1/catalogs/products/{}", product_id), "rel": "self", "method": "GET"}
        ]
    })
}
