use rusqlite::Connection;

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::payments::{
    BillingCyclePayload, CreatePlanRequest, FieldChanges, FrequencyPayload, Money,
    PaymentPreferencesPayload, PayPalClient, PlansApi, PricingSchemePayload, PricingSchemeUpdate,
    UpdatePricingRequest,
};
use crate::util::{required, required_unix_time, unix_time};

/// Plan fields PayPal lets us PATCH, diffed between the stored and edited
/// versions.
pub fn plan_changes(
    old: &BillingPlan,
    old_prefs: &PaymentPreference,
    new: &BillingPlan,
    new_prefs: &PaymentPreference,
) -> FieldChanges {
    let mut changes = FieldChanges::new();
    changes.diff("description", &old.description, &new.description);
    changes.diff(
        "payment_preferences/auto_bill_outstanding",
        &old_prefs.auto_bill_outstanding,
        &new_prefs.auto_bill_outstanding,
    );
    changes.diff(
        "payment_preferences/payment_failure_threshold",
        &old_prefs.payment_failure_threshold,
        &new_prefs.payment_failure_threshold,
    );
    changes
}

fn money(amount: &Amount) -> Money {
    Money::from(&CreateAmount::from(amount))
}

/// Nested create payload built from the persisted plan.
pub fn create_plan_request(details: &BillingPlanDetails) -> Result<CreatePlanRequest> {
    let plan = &details.plan;
    let Some(product_id) = details.remote_product_id.clone().filter(|id| !id.is_empty()) else {
        tracing::warn!("Billing plan {} ({}) has no synced product", plan.id, plan.name);
        return Err(AppError::BadRequest(format!(
            "Billing plan {} has no PayPal product",
            plan.id
        )));
    };

    let prefs = &details.payment_preferences;
    let billing_cycles = details
        .billing_cycles
        .iter()
        .map(|c| BillingCyclePayload {
            frequency: FrequencyPayload {
                interval_unit: c.frequency.interval_unit,
                interval_count: c.frequency.interval_count,
            },
            tenure_type: c.cycle.tenure_type,
            sequence: c.cycle.sequence,
            total_cycles: c.cycle.total_cycles,
            pricing_scheme: c.fixed_price.as_ref().map(|price| PricingSchemePayload {
                fixed_price: money(price),
            }),
        })
        .collect();

    Ok(CreatePlanRequest {
        product_id,
        name: plan.name.clone(),
        description: plan.description.clone(),
        // PayPal only accepts CREATED or ACTIVE on create
        status: match plan.status {
            PlanStatus::Inactive => None,
            status => Some(status),
        },
        billing_cycles,
        payment_preferences: PaymentPreferencesPayload {
            auto_bill_outstanding: prefs.preference.auto_bill_outstanding,
            setup_fee: Some(money(&prefs.setup_fee)),
            setup_fee_failure_action: Some(prefs.preference.setup_fee_failure_action),
            payment_failure_threshold: prefs.preference.payment_failure_threshold,
        },
    })
}

/// Pricing scheme each cycle pointed at before an edit, keyed by sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingSnapshot(Vec<(u32, Option<i64>)>);

impl PricingSnapshot {
    pub fn capture(conn: &Connection, billing_plan_id: i64) -> Result<Self> {
        let cycles = queries::list_billing_cycles(conn, billing_plan_id)?;
        Ok(Self(
            cycles
                .into_iter()
                .map(|c| (c.sequence, c.pricing_scheme_id))
                .collect(),
        ))
    }

    pub fn has_cycle(&self, sequence: u32) -> bool {
        self.0.iter().any(|(s, _)| *s == sequence)
    }

    pub fn scheme_for(&self, sequence: u32) -> Option<i64> {
        self.0
            .iter()
            .find(|(s, _)| *s == sequence)
            .and_then(|(_, scheme)| *scheme)
    }
}

impl From<Vec<(u32, Option<i64>)>> for PricingSnapshot {
    fn from(cycles: Vec<(u32, Option<i64>)>) -> Self {
        Self(cycles)
    }
}

/// Cycles whose pricing scheme no longer matches `snapshot`. Cycles without
/// a scheme are never sent.
pub fn pricing_changes(
    conn: &Connection,
    billing_plan_id: i64,
    snapshot: &PricingSnapshot,
) -> Result<Vec<PricingSchemeUpdate>> {
    let mut updates = Vec::new();
    for cycle in queries::list_billing_cycles(conn, billing_plan_id)? {
        let Some(scheme_id) = cycle.pricing_scheme_id else {
            continue;
        };
        if snapshot.scheme_for(cycle.sequence) == Some(scheme_id) {
            continue;
        }
        let price = queries::get_pricing_scheme_amount(conn, scheme_id)?
            .ok_or_else(|| AppError::NotFound(format!("Pricing scheme {}", scheme_id)))?;
        updates.push(PricingSchemeUpdate {
            billing_cycle_sequence: cycle.sequence,
            pricing_scheme: PricingSchemePayload {
                fixed_price: money(&price),
            },
        });
    }
    Ok(updates)
}

/// Keeps billing plans in step with PayPal. Field edits go out before the
/// row is written; creation and pricing changes wait for the commit.
pub struct PlanSynchronizer<'a> {
    api: PlansApi<'a>,
}

impl<'a> PlanSynchronizer<'a> {
    pub fn new(client: &'a PayPalClient) -> Self {
        Self {
            api: PlansApi::new(client),
        }
    }

    /// PATCH changed plan fields and pull `update_time` forward onto `plan`.
    pub async fn before_persist(
        &self,
        old: &BillingPlan,
        old_prefs: &PaymentPreference,
        plan: &mut BillingPlan,
        prefs: &PaymentPreference,
    ) -> Result<()> {
        let changes = plan_changes(old, old_prefs, plan, prefs);
        if changes.is_empty() {
            return Ok(());
        }
        if plan.plan_id.is_empty() {
            tracing::warn!("Billing plan {} is not on PayPal yet, skipping update", plan.id);
            return Ok(());
        }

        self.api.update(&plan.plan_id, &changes).await?;
        let remote = self.api.get(&plan.plan_id).await?;
        plan.update_time = Some(required_unix_time(remote.update_time, "update_time")?);

        tracing::info!(
            "Updated PayPal plan {} ({} fields)",
            plan.plan_id,
            changes.len()
        );
        Ok(())
    }

    /// Create the plan on PayPal and write its id and timestamps back.
    pub async fn create_remote(&self, conn: &Connection, billing_plan_id: i64) -> Result<()> {
        let details = queries::get_plan_details(conn, billing_plan_id)?
            .ok_or_else(|| AppError::NotFound(format!("Billing plan {}", billing_plan_id)))?;
        let request = create_plan_request(&details)?;

        let remote = self.api.create(&request).await?;
        let create_time = required_unix_time(remote.create_time, "create_time")?;
        let plan_id = required(remote.id, "id")?;

        queries::apply_plan_snapshot(
            conn,
            billing_plan_id,
            &RemoteSnapshot {
                remote_id: Some(plan_id.clone()),
                quantity_supported: Some(remote.quantity_supported.unwrap_or(false)),
                create_time: Some(create_time),
                update_time: Some(create_time),
                links: Some(remote.links),
            },
        )?;

        tracing::info!("Created PayPal plan {} for billing plan {}", plan_id, billing_plan_id);
        Ok(())
    }

    /// Send pricing for cycles that changed since `snapshot`, then re-read
    /// `update_time`. Does nothing when no cycle changed.
    pub async fn sync_pricing(
        &self,
        conn: &Connection,
        billing_plan_id: i64,
        snapshot: &PricingSnapshot,
    ) -> Result<()> {
        let pricing_schemes = pricing_changes(conn, billing_plan_id, snapshot)?;
        if pricing_schemes.is_empty() {
            return Ok(());
        }

        let plan = queries::get_billing_plan_by_id(conn, billing_plan_id)?
            .ok_or_else(|| AppError::NotFound(format!("Billing plan {}", billing_plan_id)))?;
        if plan.plan_id.is_empty() {
            tracing::warn!(
                "Billing plan {} is not on PayPal yet, skipping pricing update",
                plan.id
            );
            return Ok(());
        }

        let changed = pricing_schemes.len();
        self.api
            .update_pricing(&plan.plan_id, &UpdatePricingRequest { pricing_schemes })
            .await?;
        let remote = self.api.get(&plan.plan_id).await?;
        queries::apply_plan_snapshot(
            conn,
            plan.id,
            &RemoteSnapshot {
                update_time: unix_time(remote.update_time),
                ..Default::default()
            },
        )?;

        tracing::info!("Updated pricing for {} cycles of PayPal plan {}", changed, plan.plan_id);
        Ok(())
    }

    pub async fn activate_plans(&self, conn: &Connection, ids: &[i64]) -> Result<usize> {
        for plan_id in self.remote_ids(conn, ids)? {
            self.api.activate(&plan_id).await?;
            tracing::info!("Activated PayPal plan {}", plan_id);
        }
        queries::set_plans_status(conn, ids, PlanStatus::Active)
    }

    pub async fn deactivate_plans(&self, conn: &Connection, ids: &[i64]) -> Result<usize> {
        for plan_id in self.remote_ids(conn, ids)? {
            self.api.deactivate(&plan_id).await?;
            tracing::info!("Deactivated PayPal plan {}", plan_id);
        }
        queries::set_plans_status(conn, ids, PlanStatus::Inactive)
    }

    /// Resolve every id up front so an unknown plan fails before any call.
    fn remote_ids(&self, conn: &Connection, ids: &[i64]) -> Result<Vec<String>> {
        ids.iter()
            .map(|&id| {
                let plan = queries::get_billing_plan_by_id(conn, id)?
                    .ok_or_else(|| AppError::NotFound(format!("Billing plan {}", id)))?;
                if plan.plan_id.is_empty() {
                    return Err(AppError::BadRequest(format!(
                        "Billing plan {} is not on PayPal yet",
                        id
                    )));
                }
                Ok(plan.plan_id)
            })
            .collect()
    }
}
