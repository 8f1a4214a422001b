use crate::error::{AppError, Result};
use crate::models::Product;
use crate::payments::{CreateProductRequest, FieldChanges, PayPalClient, ProductsApi};
use crate::util::{required, required_unix_time};

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Fields of a stored product that differ from the edited copy.
pub fn product_changes(old: &Product, new: &Product) -> FieldChanges {
    let mut changes = FieldChanges::new();
    changes.diff("name", &old.name, &new.name);
    changes.diff("description", &old.description, &new.description);
    if old.category != new.category {
        changes.set("category", new.category.as_str());
    }
    changes.diff("image_url", &old.image_url, &new.image_url);
    changes.diff("home_url", &old.home_url, &new.home_url);
    changes
}

pub fn create_request(product: &Product) -> CreateProductRequest {
    CreateProductRequest {
        name: product.name.clone(),
        description: non_empty(&product.description),
        product_type: product.product_type,
        category: product.category.clone(),
        image_url: non_empty(&product.image_url),
        home_url: non_empty(&product.home_url),
    }
}

/// Keeps catalog products in step with PayPal before the local row is
/// written.
pub struct ProductSynchronizer<'a> {
    api: ProductsApi<'a>,
}

impl<'a> ProductSynchronizer<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self {
            api: ProductsApi::new(client),
        }
    }

    /// Push `product` to PayPal and copy the remote fields onto it.
    ///
    /// With no stored row the product is created remotely. Otherwise only the
    /// changed fields are patched, and `update_time` is re-read afterwards.
    pub async fn before_persist(&self, old: Option<&Product>, product: &mut Product) -> Result<()> {
        match old {
            None => self.create(product).await,
            Some(old) => self.update(old, product).await,
        }
    }

    async fn create(&self, product: &mut Product) -> Result<()> {
        let remote = self.api.create(&create_request(product)).await?;

        let create_time = required_unix_time(remote.create_time, "create_time")?;
        product.product_id = required(remote.id, "id")?;
        product.create_time = Some(create_time);
        product.update_time = Some(create_time);
        product.links = remote.links;

        tracing::info!("Created PayPal product {} ({})", product.product_id, product.name);
        Ok(())
    }

    async fn update(&self, old: &Product, product: &mut Product) -> Result<()> {
        let changes = product_changes(old, product);
        if changes.is_empty() {
            return Ok(());
        }
        if product.product_id.is_empty() {
            return Err(AppError::BadRequest(format!(
                "Product {} has no PayPal id",
                product.name
            )));
        }

        self.api.update(&product.product_id, &changes).await?;
        let remote = self.api.get(&product.product_id).await?;
        product.update_time = Some(required_unix_time(remote.update_time, "update_time")?);

        tracing::info!(
            "Updated PayPal product {} ({} fields)",
            product.product_id,
            changes.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateProduct, ProductCategory, ProductType};
    use serde_json::json;

    fn widget() -> Product {
        Product::from_input(&CreateProduct {
            name: "Widget".into(),
            description: String::new(),
            product_type: ProductType::Physical,
            category: ProductCategory::Software,
            image_url: String::new(),
            home_url: String::new(),
        })
    }

    #[test]
    fn test_create_request_for_bare_product() {
        let body = serde_json::to_value(create_request(&widget())).unwrap();
        assert_eq!(
            body,
            json!({"name": "Widget", "type": "PHYSICAL", "category": "SOFTWARE"})
        );
    }

    #[test]
    fn test_create_request_keeps_filled_urls() {
        let mut product = widget();
        product.description = "A widget".into();
        product.home_url = "https://example.com".into();
        let body = serde_json::to_value(create_request(&product)).unwrap();
        assert_eq!(body["description"], "A widget");
        assert_eq!(body["home_url"], "https://example.com");
        assert!(body.get("image_url").is_none());
    }

    #[test]
    fn test_product_changes_only_lists_changed_fields() {
        let old = widget();
        let mut new = old.clone();
        new.description = "Now with gears".into();
        new.category = ProductCategory::Other("TOYS_AND_GAMES".into());

        let changes = product_changes(&old, &new);
        assert_eq!(
            changes.fields().collect::<Vec<_>>(),
            vec!["description", "category"]
        );
        assert_eq!(
            serde_json::to_value(changes.to_patch()).unwrap(),
            json!([
                {"op": "replace", "path": "/description", "value": "Now with gears"},
                {"op": "replace", "path": "/category", "value": "TOYS_AND_GAMES"}
            ])
        );
    }

    #[test]
    fn test_product_changes_empty_when_unchanged() {
        let old = widget();
        assert!(product_changes(&old, &old.clone()).is_empty());
    }
}
