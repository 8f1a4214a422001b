//! Row mapping for every table. Each `*_COLS` constant lists columns in the
//! order the matching `FromRow` impl reads them.

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Params, Row};
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::*;

pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

pub fn query_one<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Option<T>> {
    Ok(conn.query_row(sql, params, |row| T::from_row(row)).optional()?)
}

pub fn query_all<T: FromRow>(conn: &Connection, sql: &str, params: impl Params) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Parse a TEXT column into a strum enum.
fn parse_enum<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a TEXT column holding JSON.
fn parse_json<T: DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub const PRODUCT_COLS: &str = "id, product_id, name, description, type, category, image_url, home_url, create_time, update_time, links, created_at, updated_at";

impl FromRow for Product {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let category: String = row.get(5)?;
        Ok(Product {
            id: Some(row.get(0)?),
            product_id: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            product_type: parse_enum(row, 4)?,
            category: ProductCategory::from(category),
            image_url: row.get(6)?,
            home_url: row.get(7)?,
            create_time: row.get(8)?,
            update_time: row.get(9)?,
            links: parse_json(row, 10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

pub const BILLING_PLAN_COLS: &str = "id, plan_id, product_id, name, description, status, quantity_supported, create_time, update_time, links, created_at, updated_at";

impl FromRow for BillingPlan {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BillingPlan {
            id: row.get(0)?,
            plan_id: row.get(1)?,
            product_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            status: parse_enum(row, 5)?,
            quantity_supported: row.get(6)?,
            create_time: row.get(7)?,
            update_time: row.get(8)?,
            links: parse_json(row, 9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }
}

pub const PAYMENT_PREFERENCE_COLS: &str = "id, billing_plan_id, auto_bill_outstanding, setup_fee_id, setup_fee_failure_action, payment_failure_threshold";

impl FromRow for PaymentPreference {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PaymentPreference {
            id: row.get(0)?,
            billing_plan_id: row.get(1)?,
            auto_bill_outstanding: row.get(2)?,
            setup_fee_id: row.get(3)?,
            setup_fee_failure_action: parse_enum(row, 4)?,
            payment_failure_threshold: row.get(5)?,
        })
    }
}

pub const BILLING_CYCLE_COLS: &str =
    "id, billing_plan_id, frequency_id, pricing_scheme_id, tenure_type, sequence, total_cycles";

impl FromRow for BillingCycle {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(BillingCycle {
            id: row.get(0)?,
            billing_plan_id: row.get(1)?,
            frequency_id: row.get(2)?,
            pricing_scheme_id: row.get(3)?,
            tenure_type: parse_enum(row, 4)?,
            sequence: row.get(5)?,
            total_cycles: row.get(6)?,
        })
    }
}

pub const AMOUNT_COLS: &str = "id, currency_code, value";

impl FromRow for Amount {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Amount {
            id: row.get(0)?,
            currency_code: row.get(1)?,
            value: row.get(2)?,
        })
    }
}

pub const FREQUENCY_COLS: &str = "id, interval_unit, interval_count";

impl FromRow for Frequency {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Frequency {
            id: row.get(0)?,
            interval_unit: parse_enum(row, 1)?,
            interval_count: row.get(2)?,
        })
    }
}

pub const PRICING_SCHEME_COLS: &str = "id, fixed_price_id";

impl FromRow for PricingScheme {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PricingScheme {
            id: row.get(0)?,
            fixed_price_id: row.get(1)?,
        })
    }
}

pub const SUBSCRIPTION_COLS: &str = "id, subscription_id, user_id, plan_id, status, start_time, shipping_amount_id, billing_info, create_time, update_time, links";

impl FromRow for Subscription {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscription {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            user_id: row.get(2)?,
            plan_id: row.get(3)?,
            status: parse_enum(row, 4)?,
            start_time: row.get(5)?,
            shipping_amount_id: row.get(6)?,
            billing_info: parse_json(row, 7)?,
            create_time: row.get(8)?,
            update_time: row.get(9)?,
            links: parse_json(row, 10)?,
        })
    }
}

pub const SUBSCRIBER_COLS: &str = "id, subscription_id, name, email";

impl FromRow for Subscriber {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Subscriber {
            id: row.get(0)?,
            subscription_id: row.get(1)?,
            name: parse_json(row, 2)?,
            email: row.get(3)?,
        })
    }
}

pub const PAYPAL_PROFILE_COLS: &str = "id, user_id, subscription_valid_till, created_at, updated_at";

impl FromRow for PayPalProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PayPalProfile {
            id: row.get(0)?,
            user_id: row.get(1)?,
            subscription_valid_till: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}
