use std::sync::Arc;

use model::entities::recurring_bill::{self, BillStatus};
use model::entities::recurring_bill_occurrence;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use tracing::{info, instrument, trace, warn};

use super::generator::OccurrenceGenerator;
use crate::clock::Clock;
use crate::error::Result;

pub const DEFAULT_LOOKAHEAD_PERIODS: u32 = 3;

/// Totals of one tenant-wide generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total_generated: u32,
    pub total_skipped: u32,
    pub bills_processed: u32,
    /// One `"Bill {id}: {error}"` line per bill that failed.
    pub errors: Vec<String>,
}

/// Keeps every auto-generating bill of a tenant materialized ahead of today.
#[derive(Clone)]
pub struct BatchOrchestrator {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    generator: OccurrenceGenerator,
    default_lookahead: u32,
}

impl BatchOrchestrator {
    pub fn new(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        generator: OccurrenceGenerator,
        default_lookahead: u32,
    ) -> Self {
        Self {
            db,
            clock,
            generator,
            default_lookahead,
        }
    }

    /// Tops up the look-ahead window of every active, auto-generating bill.
    ///
    /// A failing bill is recorded in `errors` and the run moves on. Only a
    /// failure to list the bills fails the whole call.
    #[instrument(skip(self))]
    pub async fn generate_all_for_tenant(&self, tenant_id: i32) -> Result<BatchResult> {
        let bills = recurring_bill::Entity::find()
            .filter(recurring_bill::Column::TenantId.eq(tenant_id))
            .filter(recurring_bill::Column::Status.eq(BillStatus::Active))
            .filter(recurring_bill::Column::AutoGenerate.eq(true))
            .filter(recurring_bill::Column::DeletedAt.is_null())
            .order_by_asc(recurring_bill::Column::Id)
            .all(&self.db)
            .await?;

        let mut result = BatchResult::default();
        for bill in bills {
            match self.top_up(&bill).await {
                Ok((generated, skipped)) => {
                    result.total_generated += generated;
                    result.total_skipped += skipped;
                    result.bills_processed += 1;
                }
                Err(e) => {
                    warn!(bill_id = bill.id, error = %e, "Failed to generate occurrences");
                    result.errors.push(format!("Bill {}: {}", bill.id, e));
                }
            }
        }

        info!(
            generated = result.total_generated,
            skipped = result.total_skipped,
            processed = result.bills_processed,
            failed = result.errors.len(),
            "Tenant generation finished"
        );
        Ok(result)
    }

    async fn top_up(&self, bill: &recurring_bill::Model) -> Result<(u32, u32)> {
        let lookahead = self.lookahead_of(bill);
        let upcoming = recurring_bill_occurrence::Entity::find()
            .filter(recurring_bill_occurrence::Column::RecurringBillId.eq(bill.id))
            .filter(recurring_bill_occurrence::Column::DueDate.gte(self.clock.today()))
            .count(&self.db)
            .await?;

        let missing = lookahead.saturating_sub(u32::try_from(upcoming).unwrap_or(u32::MAX));
        trace!(bill_id = bill.id, lookahead, upcoming, missing, "Look-ahead window");
        if missing == 0 {
            return Ok((0, 0));
        }

        let generated = self.generator.generate(bill.id, bill.tenant_id, missing).await?;
        Ok((generated.generated, generated.skipped))
    }

    fn lookahead_of(&self, bill: &recurring_bill::Model) -> u32 {
        bill.months_ahead
            .and_then(|months| u32::try_from(months).ok())
            .filter(|months| *months > 0)
            .unwrap_or(self.default_lookahead)
    }
}
