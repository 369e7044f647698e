use std::sync::Arc;

use model::entities::recurring_bill_occurrence::{self, OccurrenceStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};

use crate::clock::Clock;
use crate::error::Result;

/// Flags pending occurrences whose due date has passed.
#[derive(Clone)]
pub struct OverdueReconciler {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl OverdueReconciler {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Moves the tenant's pending occurrences due before today to overdue.
    /// Returns how many rows changed; a second run on the same day returns 0.
    #[instrument(skip(self))]
    pub async fn reconcile_overdue(&self, tenant_id: i32) -> Result<u64> {
        let today = self.clock.today();

        let overdue = recurring_bill_occurrence::ActiveModel {
            status: Set(OccurrenceStatus::Overdue),
            ..Default::default()
        };
        let updated = recurring_bill_occurrence::Entity::update_many()
            .set(overdue)
            .filter(recurring_bill_occurrence::Column::TenantId.eq(tenant_id))
            .filter(recurring_bill_occurrence::Column::Status.eq(OccurrenceStatus::Pending))
            .filter(recurring_bill_occurrence::Column::DueDate.lt(today))
            .exec(&self.db)
            .await?;

        info!(%today, count = updated.rows_affected, "Marked occurrences overdue");
        Ok(updated.rows_affected)
    }
}
