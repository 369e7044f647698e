use std::sync::Arc;

use chrono::NaiveDateTime;
use model::entities::{recurring_bill, recurring_bill_occurrence};
use sea_orm::DatabaseConnection;

use super::batch::{BatchOrchestrator, BatchResult, DEFAULT_LOOKAHEAD_PERIODS};
use super::generator::{GenerationResult, OccurrenceGenerator};
use super::overdue::OverdueReconciler;
use super::payment::{PayOptions, PaymentExecutor, PaymentResult};
use super::queries;
use super::rules::{NewRecurringBill, RecurringBillChanges, RecurringBillRules};
use super::skip::{OccurrenceSkipper, SkipResult};
use crate::cache::AggregateCache;
use crate::clock::Clock;
use crate::error::Result;

/// One handle over every recurring bill operation, sharing a database,
/// a clock and a cache.
#[derive(Clone)]
pub struct RecurringBillService {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    generator: OccurrenceGenerator,
    payments: PaymentExecutor,
    skipper: OccurrenceSkipper,
    overdue: OverdueReconciler,
    batch: BatchOrchestrator,
    rules: RecurringBillRules,
}

impl RecurringBillService {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>, cache: Arc<dyn AggregateCache>) -> Self {
        Self::new_with_lookahead(db, clock, cache, DEFAULT_LOOKAHEAD_PERIODS)
    }

    /// `default_lookahead` applies to bills without their own `months_ahead`.
    pub fn new_with_lookahead(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        cache: Arc<dyn AggregateCache>,
        default_lookahead: u32,
    ) -> Self {
        let generator = OccurrenceGenerator::new(db.clone(), clock.clone());
        Self {
            payments: PaymentExecutor::new(db.clone(), clock.clone(), cache, generator.clone()),
            skipper: OccurrenceSkipper::new(db.clone()),
            overdue: OverdueReconciler::new(db.clone(), clock.clone()),
            batch: BatchOrchestrator::new(db.clone(), clock.clone(), generator.clone(), default_lookahead),
            rules: RecurringBillRules::new(db.clone(), clock.clone(), generator.clone()),
            clock,
            generator,
            db,
        }
    }

    pub async fn generate(&self, bill_id: i32, tenant_id: i32, periods: u32) -> Result<GenerationResult> {
        self.generator.generate(bill_id, tenant_id, periods).await
    }

    pub async fn pay(
        &self,
        occurrence_id: i32,
        tenant_id: i32,
        user_id: i32,
        options: PayOptions,
    ) -> Result<PaymentResult> {
        self.payments.pay(occurrence_id, tenant_id, user_id, options).await
    }

    pub async fn skip(&self, occurrence_id: i32, tenant_id: i32, reason: Option<String>) -> Result<SkipResult> {
        self.skipper.skip(occurrence_id, tenant_id, reason).await
    }

    pub async fn reconcile_overdue(&self, tenant_id: i32) -> Result<u64> {
        self.overdue.reconcile_overdue(tenant_id).await
    }

    pub async fn generate_all_for_tenant(&self, tenant_id: i32) -> Result<BatchResult> {
        self.batch.generate_all_for_tenant(tenant_id).await
    }

    pub async fn create_bill(&self, tenant_id: i32, new: NewRecurringBill) -> Result<recurring_bill::Model> {
        self.rules.create(tenant_id, new).await
    }

    pub async fn update_bill(
        &self,
        bill_id: i32,
        tenant_id: i32,
        changes: RecurringBillChanges,
    ) -> Result<recurring_bill::Model> {
        self.rules.update(bill_id, tenant_id, changes).await
    }

    pub fn rules(&self) -> &RecurringBillRules {
        &self.rules
    }

    pub async fn list_due_between(
        &self,
        tenant_id: i32,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<recurring_bill_occurrence::Model>> {
        queries::list_due_between(&self.db, tenant_id, from, to).await
    }

    pub async fn tenants_with_active_bills(&self) -> Result<Vec<i32>> {
        queries::tenants_with_active_bills(&self.db).await
    }

    /// Tenants the overdue sweep has work for as of the service clock's today.
    pub async fn tenants_with_past_due_occurrences(&self) -> Result<Vec<i32>> {
        queries::tenants_with_past_due_occurrences(&self.db, self.clock.today()).await
    }
}
