//! Local writes with PayPal side effects held until commit.
//!
//! Product changes and plan field edits are pushed to PayPal before the row
//! is written. Plan creation and pricing changes need the committed rows, so
//! they are queued and run only after `commit`. A rolled-back unit of work
//! never reaches PayPal for queued effects.

use rusqlite::{Connection, Transaction};

use crate::db::queries;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::payments::PayPalClient;

use super::{PlanSynchronizer, PricingSnapshot, ProductSynchronizer};

/// Remote work that must wait for the local transaction to commit.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEffect {
    CreatePlan { plan: i64 },
    UpdatePricing { plan: i64, snapshot: PricingSnapshot },
}

#[derive(Debug, Default)]
pub struct CommitQueue {
    effects: Vec<RemoteEffect>,
}

impl CommitQueue {
    /// Queue an effect. A plan gets at most one pricing sync per queue; the
    /// first snapshot is kept since it holds the pre-edit prices.
    pub fn defer(&mut self, effect: RemoteEffect) {
        if let RemoteEffect::UpdatePricing { plan, .. } = &effect {
            let queued = self.effects.iter().any(
                |e| matches!(e, RemoteEffect::UpdatePricing { plan: p, .. } if p == plan),
            );
            if queued {
                return;
            }
        }
        self.effects.push(effect);
    }

    pub fn effects(&self) -> &[RemoteEffect] {
        &self.effects
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run effects in the order they were deferred, stopping at the first
    /// failure.
    pub async fn run(self, conn: &Connection, plans: &PlanSynchronizer<'_>) -> Result<()> {
        for effect in self.effects {
            match effect {
                RemoteEffect::CreatePlan { plan } => plans.create_remote(conn, plan).await?,
                RemoteEffect::UpdatePricing { plan, snapshot } => {
                    plans.sync_pricing(conn, plan, &snapshot).await?
                }
            }
        }
        Ok(())
    }
}

pub struct UnitOfWork<'c> {
    conn: &'c Connection,
    tx: Transaction<'c>,
    client: &'c PayPalClient,
    queue: CommitQueue,
}

impl<'c> UnitOfWork<'c> {
    pub fn begin(conn: &'c Connection, client: &'c PayPalClient) -> Result<Self> {
        Ok(Self {
            conn,
            tx: conn.unchecked_transaction()?,
            client,
            queue: CommitQueue::default(),
        })
    }

    pub fn pending(&self) -> &[RemoteEffect] {
        self.queue.effects()
    }

    /// Create the product on PayPal, then insert it locally.
    pub async fn create_product(&mut self, input: &CreateProduct) -> Result<Product> {
        let mut product = Product::from_input(input);
        ProductSynchronizer::new(self.client)
            .before_persist(None, &mut product)
            .await?;
        queries::insert_product(&self.tx, &mut product)?;
        Ok(product)
    }

    pub async fn update_product(&mut self, id: i64, input: &UpdateProduct) -> Result<Product> {
        let old = queries::get_product_by_id(&self.tx, id)?
            .ok_or_else(|| AppError::NotFound(format!("Product {}", id)))?;
        let mut product = old.with_update(input);
        ProductSynchronizer::new(self.client)
            .before_persist(Some(&old), &mut product)
            .await?;
        queries::update_product(&self.tx, &product)?;
        Ok(product)
    }

    /// Insert the plan locally and queue its remote creation.
    pub fn create_plan(&mut self, input: &CreateBillingPlan) -> Result<BillingPlan> {
        let plan = queries::create_billing_plan(&self.tx, input)?;
        self.queue.defer(RemoteEffect::CreatePlan { plan: plan.id });
        Ok(plan)
    }

    /// Apply field and pricing edits to a plan.
    ///
    /// Field edits are patched on PayPal right away; pricing is compared
    /// against the cycles as they were before this call and sent after commit.
    pub async fn update_plan(&mut self, id: i64, input: &UpdateBillingPlan) -> Result<BillingPlan> {
        let old = queries::get_billing_plan_by_id(&self.tx, id)?
            .ok_or_else(|| AppError::NotFound(format!("Billing plan {}", id)))?;
        let old_prefs = queries::get_payment_preference(&self.tx, id)?
            .ok_or_else(|| AppError::NotFound(format!("Payment preferences for plan {}", id)))?;
        let snapshot = PricingSnapshot::capture(&self.tx, id)?;

        // Resolve prices before anything reaches PayPal.
        let mut schemes = Vec::with_capacity(input.cycle_prices.len());
        for price in &input.cycle_prices {
            if !snapshot.has_cycle(price.sequence) {
                return Err(AppError::NotFound(format!(
                    "Billing cycle {} of plan {}",
                    price.sequence, id
                )));
            }
            let scheme = queries::get_or_create_pricing_scheme(&self.tx, &price.fixed_price)?;
            schemes.push((price.sequence, scheme.id));
        }

        let mut plan = old.clone();
        if let Some(description) = &input.description {
            plan.description = description.clone();
        }
        let mut prefs = old_prefs.clone();
        if let Some(auto_bill) = input.auto_bill_outstanding {
            prefs.auto_bill_outstanding = auto_bill;
        }
        if let Some(threshold) = input.payment_failure_threshold {
            prefs.payment_failure_threshold = threshold;
        }

        PlanSynchronizer::new(self.client)
            .before_persist(&old, &old_prefs, &mut plan, &prefs)
            .await?;

        queries::update_billing_plan(&self.tx, &plan)?;
        queries::update_payment_preference(&self.tx, &prefs)?;
        for (sequence, scheme_id) in schemes {
            queries::set_cycle_pricing_scheme(&self.tx, id, sequence, scheme_id)?;
        }

        self.queue.defer(RemoteEffect::UpdatePricing { plan: id, snapshot });
        Ok(plan)
    }

    /// Commit local writes, then run queued effects in order.
    ///
    /// Effect failures surface here after the rows are already committed.
    pub async fn commit(self) -> Result<()> {
        let Self {
            conn,
            tx,
            client,
            queue,
        } = self;
        tx.commit()?;
        if queue.is_empty() {
            return Ok(());
        }
        tracing::debug!("Running {} post-commit effects", queue.effects().len());
        queue.run(conn, &PlanSynchronizer::new(client)).await
    }

    /// Discard local writes and every queued effect.
    pub fn rollback(self) -> Result<()> {
        if !self.queue.is_empty() {
            tracing::debug!(
                "Dropping {} queued effects on rollback",
                self.queue.effects().len()
            );
        }
        self.tx.rollback()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_keeps_registration_order() {
        let mut queue = CommitQueue::default();
        queue.defer(RemoteEffect::CreatePlan { plan: 2 });
        queue.defer(RemoteEffect::UpdatePricing {
            plan: 1,
            snapshot: PricingSnapshot::default(),
        });
        queue.defer(RemoteEffect::CreatePlan { plan: 3 });

        assert_eq!(
            queue.effects(),
            &[
                RemoteEffect::CreatePlan { plan: 2 },
                RemoteEffect::UpdatePricing {
                    plan: 1,
                    snapshot: PricingSnapshot::default()
                },
                RemoteEffect::CreatePlan { plan: 3 },
            ]
        );
    }

    #[test]
    fn test_queue_keeps_first_pricing_sync_per_plan() {
        let mut queue = CommitQueue::default();
        queue.defer(RemoteEffect::UpdatePricing {
            plan: 1,
            snapshot: PricingSnapshot::default(),
        });
        queue.defer(RemoteEffect::UpdatePricing {
            plan: 2,
            snapshot: PricingSnapshot::default(),
        });
        queue.defer(RemoteEffect::UpdatePricing {
            plan: 1,
            snapshot: PricingSnapshot::from(vec![(2, Some(9))]),
        });

        assert_eq!(
            queue.effects(),
            &[
                RemoteEffect::UpdatePricing {
                    plan: 1,
                    snapshot: PricingSnapshot::default()
                },
                RemoteEffect::UpdatePricing {
                    plan: 2,
                    snapshot: PricingSnapshot::default()
                },
            ]
        );
    }
}
