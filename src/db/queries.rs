use std::collections::HashSet;

use rusqlite::{Connection, OptionalExtension, params, types::Value};

use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::now;

use super::from_row::{
    AMOUNT_COLS, BILLING_CYCLE_COLS, BILLING_PLAN_COLS, FREQUENCY_COLS, PAYMENT_PREFERENCE_COLS,
    PAYPAL_PROFILE_COLS, PRICING_SCHEME_COLS, PRODUCT_COLS, SUBSCRIBER_COLS, SUBSCRIPTION_COLS,
    query_all, query_one,
};

fn links_json(links: &[Link]) -> Result<String> {
    Ok(serde_json::to_string(links)?)
}

/// Builder for dynamic UPDATE statements with optional fields.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: i64,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: i64) -> Self {
        Self {
            table,
            id,
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    fn set_opt<V: Into<Value>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(column, v),
            None => self,
        }
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Products ============

/// Insert a product row and fill in its local id and bookkeeping timestamps.
///
/// Plain insert: PayPal is not contacted. Callers that need the remote
/// create go through `sync::UnitOfWork`.
pub fn insert_product(conn: &Connection, product: &mut Product) -> Result<()> {
    let now = now();
    conn.execute(
        "INSERT INTO products (product_id, name, description, type, category, image_url, home_url, create_time, update_time, links, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            &product.product_id,
            &product.name,
            &product.description,
            product.product_type.as_ref(),
            product.category.as_str(),
            &product.image_url,
            &product.home_url,
            product.create_time,
            product.update_time,
            links_json(&product.links)?,
            now,
            now
        ],
    )?;
    product.id = Some(conn.last_insert_rowid());
    product.created_at = now;
    product.updated_at = now;
    Ok(())
}

/// Write the mutable columns of an existing product. `type` is never
/// rewritten.
pub fn update_product(conn: &Connection, product: &Product) -> Result<bool> {
    let id = product
        .id
        .ok_or_else(|| AppError::BadRequest("Product has not been saved yet".into()))?;
    UpdateBuilder::new("products", id)
        .with_updated_at()
        .set("name", product.name.clone())
        .set("description", product.description.clone())
        .set("category", product.category.as_str().to_string())
        .set("image_url", product.image_url.clone())
        .set("home_url", product.home_url.clone())
        .set("update_time", product.update_time)
        .execute(conn)
}

pub fn get_product_by_id(conn: &Connection, id: i64) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLS),
        params![id],
    )
}

pub fn get_product_by_remote_id(conn: &Connection, product_id: &str) -> Result<Option<Product>> {
    query_one(
        conn,
        &format!("SELECT {} FROM products WHERE product_id = ?1", PRODUCT_COLS),
        params![product_id],
    )
}

pub fn list_products(conn: &Connection) -> Result<Vec<Product>> {
    query_all(
        conn,
        &format!("SELECT {} FROM products ORDER BY id DESC", PRODUCT_COLS),
        [],
    )
}

/// PayPal ids of every product already stored locally.
pub fn remote_product_ids(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT product_id FROM products")?;
    let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(ids.collect::<rusqlite::Result<HashSet<_>>>()?)
}

// ============ Value objects ============

/// Find the amount with this exact currency and value, inserting it if new.
pub fn get_or_create_amount(conn: &Connection, input: &CreateAmount) -> Result<Amount> {
    let existing: Option<Amount> = query_one(
        conn,
        &format!(
            "SELECT {} FROM amounts WHERE currency_code = ?1 AND value = ?2",
            AMOUNT_COLS
        ),
        params![&input.currency_code, input.value],
    )?;
    if let Some(amount) = existing {
        return Ok(amount);
    }

    conn.execute(
        "INSERT INTO amounts (currency_code, value) VALUES (?1, ?2)",
        params![&input.currency_code, input.value],
    )?;
    Ok(Amount {
        id: conn.last_insert_rowid(),
        currency_code: input.currency_code.clone(),
        value: input.value,
    })
}

pub fn get_amount(conn: &Connection, id: i64) -> Result<Option<Amount>> {
    query_one(
        conn,
        &format!("SELECT {} FROM amounts WHERE id = ?1", AMOUNT_COLS),
        params![id],
    )
}

pub fn get_or_create_frequency(conn: &Connection, input: &CreateFrequency) -> Result<Frequency> {
    if input.interval_count == 0 {
        return Err(AppError::BadRequest(
            "Frequency interval_count must be at least 1".into(),
        ));
    }

    let existing: Option<Frequency> = query_one(
        conn,
        &format!(
            "SELECT {} FROM frequencies WHERE interval_unit = ?1 AND interval_count = ?2",
            FREQUENCY_COLS
        ),
        params![input.interval_unit.as_ref(), input.interval_count],
    )?;
    if let Some(frequency) = existing {
        return Ok(frequency);
    }

    conn.execute(
        "INSERT INTO frequencies (interval_unit, interval_count) VALUES (?1, ?2)",
        params![input.interval_unit.as_ref(), input.interval_count],
    )?;
    Ok(Frequency {
        id: conn.last_insert_rowid(),
        interval_unit: input.interval_unit,
        interval_count: input.interval_count,
    })
}

pub fn get_frequency(conn: &Connection, id: i64) -> Result<Option<Frequency>> {
    query_one(
        conn,
        &format!("SELECT {} FROM frequencies WHERE id = ?1", FREQUENCY_COLS),
        params![id],
    )
}

/// Pricing schemes are keyed by their fixed price, so this resolves the
/// amount first and then the scheme wrapping it.
pub fn get_or_create_pricing_scheme(
    conn: &Connection,
    fixed_price: &CreateAmount,
) -> Result<PricingScheme> {
    let amount = get_or_create_amount(conn, fixed_price)?;

    let existing: Option<PricingScheme> = query_one(
        conn,
        &format!(
            "SELECT {} FROM pricing_schemes WHERE fixed_price_id = ?1",
            PRICING_SCHEME_COLS
        ),
        params![amount.id],
    )?;
    if let Some(scheme) = existing {
        return Ok(scheme);
    }

    conn.execute(
        "INSERT INTO pricing_schemes (fixed_price_id) VALUES (?1)",
        params![amount.id],
    )?;
    Ok(PricingScheme {
        id: conn.last_insert_rowid(),
        fixed_price_id: amount.id,
    })
}

/// Fixed price behind a pricing scheme.
pub fn get_pricing_scheme_amount(conn: &Connection, scheme_id: i64) -> Result<Option<Amount>> {
    query_one(
        conn,
        "SELECT a.id, a.currency_code, a.value FROM pricing_schemes s
         JOIN amounts a ON a.id = s.fixed_price_id WHERE s.id = ?1",
        params![scheme_id],
    )
}

// ============ Billing plans ============

/// Every column of a plan row, for inserts that already know the remote
/// fields (imports) as well as fresh local plans.
#[derive(Debug, Clone, Default)]
pub struct NewBillingPlan {
    pub plan_id: String,
    pub product_id: Option<i64>,
    pub name: String,
    pub description: String,
    pub status: PlanStatus,
    pub quantity_supported: bool,
    pub create_time: Option<i64>,
    pub update_time: Option<i64>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentPreference {
    pub auto_bill_outstanding: bool,
    pub setup_fee_id: i64,
    pub setup_fee_failure_action: SetupFeeFailureAction,
    pub payment_failure_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct NewBillingCycle {
    pub frequency_id: i64,
    pub pricing_scheme_id: Option<i64>,
    pub tenure_type: TenureType,
    pub sequence: u32,
    pub total_cycles: u32,
}

pub fn insert_billing_plan(conn: &Connection, input: &NewBillingPlan) -> Result<BillingPlan> {
    let now = now();
    conn.execute(
        "INSERT INTO billing_plans (plan_id, product_id, name, description, status, quantity_supported, create_time, update_time, links, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            &input.plan_id,
            input.product_id,
            &input.name,
            &input.description,
            input.status.as_ref(),
            input.quantity_supported,
            input.create_time,
            input.update_time,
            links_json(&input.links)?,
            now,
            now
        ],
    )?;

    Ok(BillingPlan {
        id: conn.last_insert_rowid(),
        plan_id: input.plan_id.clone(),
        product_id: input.product_id,
        name: input.name.clone(),
        description: input.description.clone(),
        status: input.status,
        quantity_supported: input.quantity_supported,
        create_time: input.create_time,
        update_time: input.update_time,
        links: input.links.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn insert_payment_preference(
    conn: &Connection,
    billing_plan_id: i64,
    input: &NewPaymentPreference,
) -> Result<PaymentPreference> {
    conn.execute(
        "INSERT INTO payment_preferences (billing_plan_id, auto_bill_outstanding, setup_fee_id, setup_fee_failure_action, payment_failure_threshold)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            billing_plan_id,
            input.auto_bill_outstanding,
            input.setup_fee_id,
            input.setup_fee_failure_action.as_ref(),
            input.payment_failure_threshold
        ],
    )?;

    Ok(PaymentPreference {
        id: conn.last_insert_rowid(),
        billing_plan_id,
        auto_bill_outstanding: input.auto_bill_outstanding,
        setup_fee_id: input.setup_fee_id,
        setup_fee_failure_action: input.setup_fee_failure_action,
        payment_failure_threshold: input.payment_failure_threshold,
    })
}

pub fn insert_billing_cycle(
    conn: &Connection,
    billing_plan_id: i64,
    input: &NewBillingCycle,
) -> Result<BillingCycle> {
    if input.sequence == 0 {
        return Err(AppError::BadRequest(
            "Billing cycle sequence starts at 1".into(),
        ));
    }

    conn.execute(
        "INSERT INTO billing_cycles (billing_plan_id, frequency_id, pricing_scheme_id, tenure_type, sequence, total_cycles)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            billing_plan_id,
            input.frequency_id,
            input.pricing_scheme_id,
            input.tenure_type.as_ref(),
            input.sequence,
            input.total_cycles
        ],
    )?;

    Ok(BillingCycle {
        id: conn.last_insert_rowid(),
        billing_plan_id,
        frequency_id: input.frequency_id,
        pricing_scheme_id: input.pricing_scheme_id,
        tenure_type: input.tenure_type,
        sequence: input.sequence,
        total_cycles: input.total_cycles,
    })
}

/// Insert a new local plan with its preferences and cycles.
///
/// Order matters: plan row, then setup fee, then preferences, then each
/// cycle with its frequency and pricing scheme resolved first.
pub fn create_billing_plan(conn: &Connection, input: &CreateBillingPlan) -> Result<BillingPlan> {
    if input.billing_cycles.is_empty() {
        return Err(AppError::BadRequest(
            "A billing plan needs at least one billing cycle".into(),
        ));
    }

    let plan = insert_billing_plan(
        conn,
        &NewBillingPlan {
            product_id: input.product_id,
            name: input.name.clone(),
            description: input.description.clone(),
            status: input.status,
            ..Default::default()
        },
    )?;

    let prefs = &input.payment_preferences;
    let setup_fee = get_or_create_amount(conn, &prefs.setup_fee)?;
    insert_payment_preference(
        conn,
        plan.id,
        &NewPaymentPreference {
            auto_bill_outstanding: prefs.auto_bill_outstanding,
            setup_fee_id: setup_fee.id,
            setup_fee_failure_action: prefs.setup_fee_failure_action,
            payment_failure_threshold: prefs.payment_failure_threshold,
        },
    )?;

    for cycle in &input.billing_cycles {
        let frequency = get_or_create_frequency(conn, &cycle.frequency)?;
        let scheme = cycle
            .fixed_price
            .as_ref()
            .map(|price| get_or_create_pricing_scheme(conn, price))
            .transpose()?;
        insert_billing_cycle(
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

    Ok(plan)
}

pub fn get_billing_plan_by_id(conn: &Connection, id: i64) -> Result<Option<BillingPlan>> {
    query_one(
        conn,
        &format!("SELECT {} FROM billing_plans WHERE id = ?1", BILLING_PLAN_COLS),
        params![id],
    )
}

pub fn get_billing_plan_by_remote_id(
    conn: &Connection,
    plan_id: &str,
) -> Result<Option<BillingPlan>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM billing_plans WHERE plan_id = ?1",
            BILLING_PLAN_COLS
        ),
        params![plan_id],
    )
}

pub fn list_billing_plans(conn: &Connection) -> Result<Vec<BillingPlan>> {
    query_all(
        conn,
        &format!("SELECT {} FROM billing_plans ORDER BY id DESC", BILLING_PLAN_COLS),
        [],
    )
}

/// PayPal id of the newest synced plan, offered on the subscribe page.
pub fn first_plan_id(conn: &Connection) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT plan_id FROM billing_plans WHERE plan_id != '' ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?)
}

/// PayPal ids of every plan already stored locally (blank ids excluded).
pub fn remote_plan_ids(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT plan_id FROM billing_plans WHERE plan_id != ''")?;
    let ids = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(ids.collect::<rusqlite::Result<HashSet<_>>>()?)
}

pub fn get_payment_preference(
    conn: &Connection,
    billing_plan_id: i64,
) -> Result<Option<PaymentPreference>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM payment_preferences WHERE billing_plan_id = ?1",
            PAYMENT_PREFERENCE_COLS
        ),
        params![billing_plan_id],
    )
}

pub fn list_billing_cycles(conn: &Connection, billing_plan_id: i64) -> Result<Vec<BillingCycle>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM billing_cycles WHERE billing_plan_id = ?1 ORDER BY sequence",
            BILLING_CYCLE_COLS
        ),
        params![billing_plan_id],
    )
}

/// Load a plan together with its product id, preferences and cycles.
pub fn get_plan_details(conn: &Connection, id: i64) -> Result<Option<BillingPlanDetails>> {
    let Some(plan) = get_billing_plan_by_id(conn, id)? else {
        return Ok(None);
    };

    let remote_product_id = match plan.product_id {
        Some(product_id) => get_product_by_id(conn, product_id)?.map(|p| p.product_id),
        None => None,
    };

    let preference = get_payment_preference(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Payment preferences for plan {}", id)))?;
    let setup_fee = get_amount(conn, preference.setup_fee_id)?
        .ok_or_else(|| AppError::NotFound(format!("Setup fee for plan {}", id)))?;

    let mut billing_cycles = Vec::new();
    for cycle in list_billing_cycles(conn, id)? {
        let frequency = get_frequency(conn, cycle.frequency_id)?
            .ok_or_else(|| AppError::NotFound(format!("Frequency {}", cycle.frequency_id)))?;
        let fixed_price = match cycle.pricing_scheme_id {
            Some(scheme_id) => Some(
                get_pricing_scheme_amount(conn, scheme_id)?
                    .ok_or_else(|| AppError::NotFound(format!("Pricing scheme {}", scheme_id)))?,
            ),
            None => None,
        };
        billing_cycles.push(BillingCycleDetails {
            cycle,
            frequency,
            fixed_price,
        });
    }

    Ok(Some(BillingPlanDetails {
        plan,
        remote_product_id,
        payment_preferences: PaymentPreferenceDetails {
            preference,
            setup_fee,
        },
        billing_cycles,
    }))
}

/// Write the locally editable plan columns.
pub fn update_billing_plan(conn: &Connection, plan: &BillingPlan) -> Result<bool> {
    UpdateBuilder::new("billing_plans", plan.id)
        .with_updated_at()
        .set("description", plan.description.clone())
        .set("status", plan.status.as_ref().to_string())
        .set("update_time", plan.update_time)
        .execute(conn)
}

pub fn update_payment_preference(conn: &Connection, preference: &PaymentPreference) -> Result<bool> {
    UpdateBuilder::new("payment_preferences", preference.id)
        .set("auto_bill_outstanding", preference.auto_bill_outstanding)
        .set(
            "payment_failure_threshold",
            preference.payment_failure_threshold as i64,
        )
        .execute(conn)
}

/// Point the cycle with `sequence` at a different pricing scheme.
pub fn set_cycle_pricing_scheme(
    conn: &Connection,
    billing_plan_id: i64,
    sequence: u32,
    pricing_scheme_id: i64,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE billing_cycles SET pricing_scheme_id = ?1 WHERE billing_plan_id = ?2 AND sequence = ?3",
        params![pricing_scheme_id, billing_plan_id, sequence],
    )?;
    if updated == 0 {
        return Err(AppError::NotFound(format!(
            "Billing cycle {} of plan {}",
            sequence, billing_plan_id
        )));
    }
    Ok(())
}

pub fn set_plans_status(conn: &Connection, ids: &[i64], status: PlanStatus) -> Result<usize> {
    let now = now();
    let mut updated = 0;
    for id in ids {
        updated += conn.execute(
            "UPDATE billing_plans SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_ref(), now, id],
        )?;
    }
    Ok(updated)
}

/// Copy remote-assigned fields onto a plan row.
///
/// This is a bare UPDATE: it never runs plan synchronization, so writing
/// PayPal's response back cannot trigger another PayPal call.
pub fn apply_plan_snapshot(conn: &Connection, id: i64, snapshot: &RemoteSnapshot) -> Result<bool> {
    let links = snapshot.links.as_deref().map(links_json).transpose()?;
    UpdateBuilder::new("billing_plans", id)
        .with_updated_at()
        .set_opt("plan_id", snapshot.remote_id.clone())
        .set_opt("quantity_supported", snapshot.quantity_supported)
        .set_opt("create_time", snapshot.create_time)
        .set_opt("update_time", snapshot.update_time)
        .set_opt("links", links)
        .execute(conn)
}

// ============ Subscriptions ============

pub fn get_subscription_by_remote_id(
    conn: &Connection,
    subscription_id: &str,
) -> Result<Option<Subscription>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE subscription_id = ?1",
            SUBSCRIPTION_COLS
        ),
        params![subscription_id],
    )
}

pub fn list_subscriptions_for_user(conn: &Connection, user_id: i64) -> Result<Vec<Subscription>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM subscriptions WHERE user_id = ?1 ORDER BY create_time DESC",
            SUBSCRIPTION_COLS
        ),
        params![user_id],
    )
}

pub fn get_subscriber(conn: &Connection, subscription_id: i64) -> Result<Option<Subscriber>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM subscribers WHERE subscription_id = ?1",
            SUBSCRIBER_COLS
        ),
        params![subscription_id],
    )
}

// ============ PayPal profiles ============

pub fn get_profile_by_user(conn: &Connection, user_id: i64) -> Result<Option<PayPalProfile>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM paypal_profiles WHERE user_id = ?1",
            PAYPAL_PROFILE_COLS
        ),
        params![user_id],
    )
}

pub fn get_or_create_profile(conn: &Connection, user_id: i64) -> Result<PayPalProfile> {
    if let Some(profile) = get_profile_by_user(conn, user_id)? {
        return Ok(profile);
    }

    let now = now();
    conn.execute(
        "INSERT INTO paypal_profiles (user_id, subscription_valid_till, created_at, updated_at)
         VALUES (?1, NULL, ?2, ?3)",
        params![user_id, now, now],
    )?;
    Ok(PayPalProfile {
        id: conn.last_insert_rowid(),
        user_id,
        subscription_valid_till: None,
        created_at: now,
        updated_at: now,
    })
}

/// Set `subscription_valid_till` and return the refreshed profile.
pub fn update_subscription_validity(
    conn: &Connection,
    user_id: i64,
    valid_till: Option<i64>,
) -> Result<PayPalProfile> {
    let profile = get_or_create_profile(conn, user_id)?;
    conn.execute(
        "UPDATE paypal_profiles SET subscription_valid_till = ?1, updated_at = ?2 WHERE id = ?3",
        params![valid_till, now(), profile.id],
    )?;
    get_profile_by_user(conn, user_id)?
        .ok_or_else(|| AppError::NotFound(format!("PayPal profile for user {}", user_id)))
}
