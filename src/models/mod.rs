mod billing_plan;
mod product;
mod subscription;
mod value_objects;

pub use billing_plan::*;
pub use product::*;
pub use subscription::*;
pub use value_objects::*;

use serde::{Deserialize, Serialize};

/// HATEOAS link as returned by PayPal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Remote-assigned fields to copy onto a local row. `None` leaves the
/// column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub remote_id: Option<String>,
    pub quantity_supported: Option<bool>,
    pub create_time: Option<i64>,
    pub update_time: Option<i64>,
    pub links: Option<Vec<Link>>,
}
