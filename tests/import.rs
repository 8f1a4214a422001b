//! Bulk import of PayPal products and plans.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use paypal_sync::import::{ImportReport, import_plans, import_products};

mod common;
use common::*;

async fn mount_product_list(server: &MockServer, ids: &[&str]) {
    let products: Vec<_> = ids
        .iter()
        .map(|id| json!({"id": id, "name": "Video Streaming Service", "create_time": TEST_TIME}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1/catalogs/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": products,
            "total_items": ids.len(),
            "total_pages": 1
        })))
        .mount(server)
        .await;
}

async fn mount_product_detail(server: &MockServer, id: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/catalogs/products/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(remote_product_json(id)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_import_products_skips_known_ids() {
    let server = paypal_server().await;
    let client = test_client(&server);
    let conn = setup_test_db();
    create_synced_product(&conn, "PROD-1");

    mount_product_list(&server, &["PROD-1", "PROD-2", "PROD-3"]).await;
    mount_product_detail(&server, "PROD-1", 0).await;
    mount_product_detail(&server, "PROD-2", 1).await;
    mount_product_detail(&server, "PROD-3", 1).await;
    Mock::given(method("POST"))
        .and(path("/v1/catalogs/products"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = import_products(&conn, &client).await.unwrap();
    assert_eq!(
        report,
        ImportReport {
            fetched: 3,
            inserted: 2
        }
    );

    let stored = queries::get_product_by_remote_id(&conn, "PROD-2")
        .unwrap()
        .expect("PROD-2 should be imported");
    assert_eq!(stored.product_type, ProductType::Service);
    assert_eq!(stored.create_time, Some(TEST_TIME_UNIX));
    assert_eq!(queries::list_products(&conn).unwrap().len(), 3);
}

#[tokio::test]
async fn test_import_products_twice_inserts_once() {
    let server = paypal_server().await;
    let client = test_client(&server);
    let conn = setup_test_db();

    mount_product_list(&server, &["PROD-1"]).await;
    mount_product_detail(&server, "PROD-1", 1).await;

    let first = import_products(&conn, &client).await.unwrap();
    let second = import_products(&conn, &client).await.unwrap();

    assert_eq!(first.inserted, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.fetched, 1);
}

#[tokio::test]
async fn test_import_products_walks_every_page() {
    let server = paypal_server().await;
    let client = test_client(&server);
    let conn = setup_test_db();

    Mock::given(method("GET"))
        .and(path("/v1/catalogs/products"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": "PROD-1"}],
            "total_items": 2,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/catalogs/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"id": "PROD-2"}],
            "total_items": 2,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_product_detail(&server, "PROD-1", 1).await;
    mount_product_detail(&server, "PROD-2", 1).await;

    let report = import_products(&conn, &client).await.unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.inserted, 2);
}

#[tokio::test]
async fn test_import_plans_builds_children() {
    let server = paypal_server().await;
    let client = test_client(&server);
    let conn = setup_test_db();
    let product = create_synced_product(&conn, TEST_PRODUCT_ID);

    Mock::given(method("GET"))
        .and(path("/v1/billing/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [{"id": TEST_PLAN_ID, "name": "Basic Plan", "status": "ACTIVE"}],
            "total_items": 1,
            "total_pages": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/billing/plans/{}", TEST_PLAN_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(remote_plan_json(TEST_PLAN_ID, TEST_PRODUCT_ID, TEST_TIME)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = import_plans(&conn, &client).await.unwrap();
    assert_eq!(report.inserted, 1);

    let plan = queries::get_billing_plan_by_remote_id(&conn, TEST_PLAN_ID)
        .unwrap()
        .expect("plan should be imported");
    assert_eq!(plan.product_id, product.id);
    assert!(plan.quantity_supported);

    let details = queries::get_plan_details(&conn, plan.id).unwrap().unwrap();
    assert_eq!(details.remote_product_id.as_deref(), Some(TEST_PRODUCT_ID));
    assert_eq!(details.payment_preferences.setup_fee.value, 10.0);
    assert_eq!(details.billing_cycles.len(), 2);
    assert_eq!(details.billing_cycles[1].cycle.total_cycles, 12);

    // Setup fee and the regular price are both USD 10 and share one row
    let amounts: i64 = conn
        .query_row("SELECT COUNT(*) FROM amounts", [], |r| r.get(0))
        .unwrap();
    assert_eq!(amounts, 1);
}

#[tokio::test]
async fn test_import_plan_with_unknown_product_fails() {
    let server = paypal_server().await;
    let client = test_client(&server);
    let conn = setup_test_db();

    Mock::given(method("GET"))
        .and(path("/v1/billing/plans"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "plans": [{"id": TEST_PLAN_ID}],
            "total_pages": 1
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/v1/billing/plans/{}", TEST_PLAN_ID)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(remote_plan_json(TEST_PLAN_ID, "PROD-MISSING", TEST_TIME)),
        )
        .mount(&server)
        .await;

    let err = import_plans(&conn, &client).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(queries::list_billing_plans(&conn).unwrap().is_empty());
}
