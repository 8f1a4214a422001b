//! One-shot import of PayPal products and plans that are not stored locally.
//!
//! Rows are written with the plain insert queries, so nothing here calls back
//! into PayPal beyond the reads.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries::{self, NewBillingCycle, NewBillingPlan, NewPaymentPreference};
use crate::error::{AppError, Result};
use crate::models::{CreateFrequency, Product, SetupFeeFailureAction};
use crate::payments::{PayPalClient, PlansApi, ProductsApi, RemotePlan, RemoteProduct};
use crate::util::{required, unix_time};

const PRODUCT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Summaries returned by the listing
    pub fetched: usize,
    /// Rows written locally
    pub inserted: usize,
}

/// Ids from `listed` that are not in `known`, first occurrence order.
fn missing_ids<'a>(listed: impl Iterator<Item = &'a str>, known: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    listed
        .filter(|id| !known.contains(*id) && seen.insert(*id))
        .map(str::to_string)
        .collect()
}

fn product_from_remote(remote: RemoteProduct) -> Result<Product> {
    Ok(Product {
        id: None,
        product_id: required(remote.id, "id")?,
        name: required(remote.name, "name")?,
        description: remote.description.unwrap_or_default(),
        product_type: required(remote.product_type, "type")?,
        category: required(remote.category, "category")?,
        image_url: remote.image_url.unwrap_or_default(),
        home_url: remote.home_url.unwrap_or_default(),
        create_time: unix_time(remote.create_time),
        update_time: unix_time(remote.update_time),
        links: remote.links,
        created_at: 0,
        updated_at: 0,
    })
}

pub async fn import_products(conn: &Connection, client: &PayPalClient) -> Result<ImportReport> {
    let api = ProductsApi::new(client);
    let listed = api.list().await?;
    let known = queries::remote_product_ids(conn)?;
    let missing = missing_ids(listed.iter().filter_map(|p| p.id.as_deref()), &known);

    tracing::info!(
        "PayPal lists {} products, {} not stored locally",
        listed.len(),
        missing.len()
    );

    let mut products = Vec::with_capacity(missing.len());
    for product_id in &missing {
        products.push(product_from_remote(api.get(product_id).await?)?);
    }

    let tx = conn.unchecked_transaction()?;
    for batch in products.chunks_mut(PRODUCT_BATCH_SIZE) {
        for product in batch.iter_mut() {
            queries::insert_product(&tx, product)?;
        }
        tracing::debug!("Inserted batch of {} products", batch.len());
    }
    tx.commit()?;

    tracing::info!("Imported {} products", products.len());
    Ok(ImportReport {
        fetched: listed.len(),
        inserted: products.len(),
    })
}

pub async fn import_plans(conn: &Connection, client: &PayPalClient) -> Result<ImportReport> {
    let api = PlansApi::new(client);
    let listed = api.list().await?;
    let known = queries::remote_plan_ids(conn)?;
    let missing = missing_ids(listed.iter().filter_map(|p| p.id.as_deref()), &known);

    tracing::info!(
        "PayPal lists {} plans, {} not stored locally",
        listed.len(),
        missing.len()
    );

    let mut plans = Vec::with_capacity(missing.len());
    for plan_id in &missing {
        plans.push(api.get(plan_id).await?);
    }

    let tx = conn.unchecked_transaction()?;
    for plan in plans.iter() {
        insert_remote_plan(&tx, plan)?;
    }
    tx.commit()?;

    tracing::info!("Imported {} plans", plans.len());
    Ok(ImportReport {
        fetched: listed.len(),
        inserted: plans.len(),
    })
}

/// Plan row, then setup fee and preferences, then each cycle with its
/// frequency and pricing scheme.
fn insert_remote_plan(conn: &Connection, remote: &RemotePlan) -> Result<()> {
    let plan_id = required(remote.id.clone(), "id")?;
    let remote_product_id = required(remote.product_id.as_deref(), "product_id")?;
    let product = queries::get_product_by_remote_id(conn, remote_product_id)?.ok_or_else(|| {
        AppError::NotFound(format!(
            "Product {} for plan {} (import products first)",
            remote_product_id, plan_id
        ))
    })?;

    let plan = queries::insert_billing_plan(
        conn,
        &NewBillingPlan {
            plan_id,
            product_id: product.id,
            name: required(remote.name.clone(), "name")?,
            description: remote.description.clone().unwrap_or_default(),
            status: remote.status.unwrap_or_default(),
            quantity_supported: remote.quantity_supported.unwrap_or(false),
            create_time: unix_time(remote.create_time),
            update_time: unix_time(remote.update_time),
            links: remote.links.clone(),
        },
    )?;

    let prefs = required(remote.payment_preferences.as_ref(), "payment_preferences")?;
    let setup_fee = required(prefs.setup_fee.as_ref(), "setup_fee")?.to_amount()?;
    let setup_fee = queries::get_or_create_amount(conn, &setup_fee)?;
    queries::insert_payment_preference(
        conn,
        plan.id,
        &NewPaymentPreference {
            auto_bill_outstanding: prefs.auto_bill_outstanding,
            setup_fee_id: setup_fee.id,
            setup_fee_failure_action: prefs
                .setup_fee_failure_action
                .unwrap_or(SetupFeeFailureAction::Cancel),
            payment_failure_threshold: prefs.payment_failure_threshold,
        },
    )?;

    for cycle in &remote.billing_cycles {
        let frequency = queries::get_or_create_frequency(
            conn,
            &CreateFrequency {
                interval_unit: cycle.frequency.interval_unit,
                interval_count: cycle.frequency.interval_count,
            },
        )?;
        let scheme = match &cycle.pricing_scheme {
            Some(scheme) => Some(queries::get_or_create_pricing_scheme(
                conn,
                &scheme.fixed_price.to_amount()?,
            )?),
            None => None,
        };
        queries::insert_billing_cycle(
            conn,
            plan.id,
            &NewBillingCycle {
                frequency_id: frequency.id,
                pricing_scheme_id: scheme.map(|s| s.id),
                tenure_type: cycle.tenure_type,
                sequence: cycle.sequence,
                total_cycles: cycle.total_cycles,
            },
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_ids_skips_known_and_duplicates() {
        let known: HashSet<String> = ["PROD-1".to_string()].into_iter().collect();
        let listed = ["PROD-1", "PROD-2", "PROD-3", "PROD-2"];
        assert_eq!(
            missing_ids(listed.into_iter(), &known),
            vec!["PROD-2".to_string(), "PROD-3".to_string()]
        );
    }

    #[test]
    fn test_product_from_remote_requires_category() {
        let remote: RemoteProduct =
            serde_json::from_value(json!({"id": "PROD-1", "name": "Widget", "type": "DIGITAL"}))
                .unwrap();
        assert!(matches!(
            product_from_remote(remote),
            Err(AppError::MissingField("category"))
        ));
    }

    #[test]
    fn test_product_from_remote_defaults_optional_text() {
        let remote: RemoteProduct = serde_json::from_value(json!({
            "id": "PROD-1",
            "name": "Widget",
            "type": "DIGITAL",
            "category": "SOFTWARE",
            "create_time": "2019-01-10T21:20:49Z"
        }))
        .unwrap();
        let product = product_from_remote(remote).unwrap();
        assert_eq!(product.description, "");
        assert_eq!(product.create_time, Some(1547155249));
        assert!(product.update_time.is_none());
    }
}
