use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::Link;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    /// Physical goods
    Physical,
    /// Digital goods
    Digital,
    /// A service
    Service,
}

/// Catalog category. PayPal defines several hundred; the ones we create
/// products with are named, anything else round-trips through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Software,
    DigitalGames,
    OnlineServices,
    #[strum(default)]
    Other(String),
}

impl ProductCategory {
    pub fn as_str(&self) -> &str {
        match self {
            ProductCategory::Software => "SOFTWARE",
            ProductCategory::DigitalGames => "DIGITAL_GAMES",
            ProductCategory::OnlineServices => "ONLINE_SERVICES",
            ProductCategory::Other(s) => s,
        }
    }
}

impl From<String> for ProductCategory {
    fn from(s: String) -> Self {
        // `Other` is the strum default, so parsing cannot fail
        ProductCategory::from_str(&s).unwrap_or(ProductCategory::Other(s))
    }
}

impl From<ProductCategory> for String {
    fn from(c: ProductCategory) -> Self {
        c.as_str().to_string()
    }
}

/// A catalog product mirrored from PayPal.
///
/// `id` is the local row id (None until first saved); `product_id` is
/// PayPal's id and stays empty until the remote create has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<i64>,
    pub product_id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: ProductCategory,
    pub image_url: String,
    pub home_url: String,
    pub create_time: Option<i64>,
    pub update_time: Option<i64>,
    pub links: Vec<Link>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Build an unsaved product from user input.
    pub fn from_input(input: &CreateProduct) -> Self {
        Self {
            id: None,
            product_id: String::new(),
            name: input.name.clone(),
            description: input.description.clone(),
            product_type: input.product_type,
            category: input.category.clone(),
            image_url: input.image_url.clone(),
            home_url: input.home_url.clone(),
            create_time: None,
            update_time: None,
            links: Vec::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Apply an update to a copy of this product. `type` cannot change
    /// after creation, so `UpdateProduct` has no field for it.
    pub fn with_update(&self, input: &UpdateProduct) -> Self {
        let mut next = self.clone();
        if let Some(name) = &input.name {
            next.name = name.clone();
        }
        if let Some(description) = &input.description {
            next.description = description.clone();
        }
        if let Some(category) = &input.category {
            next.category = category.clone();
        }
        if let Some(image_url) = &input.image_url {
            next.image_url = image_url.clone();
        }
        if let Some(home_url) = &input.home_url {
            next.home_url = home_url.clone();
        }
        next
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub category: ProductCategory,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub home_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProductCategory>,
    pub image_url: Option<String>,
    pub home_url: Option<String>,
}
