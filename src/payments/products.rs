use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{Link, ProductCategory, ProductType};

use super::client::segment;
use super::{FieldChanges, PayPalClient};

const PRODUCTS_PATH: &str = "/v1/catalogs/products";

/// Body for `POST /v1/catalogs/products`. Empty optional strings are left
/// out entirely rather than sent as `""`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: ProductCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_url: Option<String>,
}

/// Product as PayPal returns it. List endpoints only fill in a summary
/// (id, name, description, create_time, links).
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteProduct {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub category: Option<ProductCategory>,
    pub image_url: Option<String>,
    pub home_url: Option<String>,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Catalog products endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ProductsApi<'a> {
    client: &'a PayPalClient,
}

impl<'a> ProductsApi<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<RemoteProduct>> {
        self.client.list_all(PRODUCTS_PATH).await
    }

    pub async fn get(&self, product_id: &str) -> Result<RemoteProduct> {
        self.client
            .get(&format!("{}/{}", PRODUCTS_PATH, segment(product_id)))
            .await
    }

    /// Creating a product fires PayPal's CATALOG.PRODUCT.CREATED webhook.
    pub async fn create(&self, request: &CreateProductRequest) -> Result<RemoteProduct> {
        self.client.post(PRODUCTS_PATH, request).await
    }

    /// PATCH the changed fields. PayPal accepts description, category,
    /// image_url and home_url here; the response body is discarded.
    pub async fn update(&self, product_id: &str, changes: &FieldChanges) -> Result<()> {
        self.client
            .patch(
                &format!("{}/{}", PRODUCTS_PATH, segment(product_id)),
                &changes.to_patch(),
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_omits_empty_optionals() {
        let request = CreateProductRequest {
            name: "Widget".into(),
            description: None,
            product_type: ProductType::Physical,
            category: ProductCategory::Software,
            image_url: None,
            home_url: None,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"name": "Widget", "type": "PHYSICAL", "category": "SOFTWARE"})
        );
    }

    #[test]
    fn test_remote_product_decodes_detail() {
        let body = json!({
            "id": "PROD-XXCD1234QWER65782",
            "name": "Video Streaming Service",
            "description": "Video Streaming Service basic plan",
            "type": "SERVICE",
            "category": "SOFTWARE",
            "image_url": "https://example.com/streaming.jpg",
            "home_url": "https://example.com/home",
            "create_time": "2019-01-10T21:20:49Z",
            "update_time": "2019-01-10T21:20:49Z",
            "links": [
                {"href": "https://api-m.paypal.com/v1/catalogs/products/PROD-XXCD1234QWER65782", "rel": "self", "method": "GET"}
            ]
        });
        let product: RemoteProduct = serde_json::from_value(body).unwrap();
        assert_eq!(product.id.as_deref(), Some("PROD-XXCD1234QWER65782"));
        assert_eq!(product.product_type, Some(ProductType::Service));
        assert_eq!(product.category, Some(ProductCategory::Software));
        assert_eq!(product.create_time.unwrap().timestamp(), 1547155249);
        assert_eq!(product.links.len(), 1);
    }

    #[test]
    fn test_unknown_category_round_trips() {
        let product: RemoteProduct =
            serde_json::from_value(json!({"id": "PROD-1", "category": "BOOKS_PERIODICALS_AND_NEWSPAPERS"}))
                .unwrap();
        let category = product.category.unwrap();
        assert_eq!(
            category,
            ProductCategory::Other("BOOKS_PERIODICALS_AND_NEWSPAPERS".into())
        );
        assert_eq!(category.as_str(), "BOOKS_PERIODICALS_AND_NEWSPAPERS");
    }
}
