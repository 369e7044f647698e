use model::entities::recurring_bill_occurrence::{self, OccurrenceStatus};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};

use crate::error::{BillError, Result};

pub const DEFAULT_SKIP_NOTE: &str = "Skipped by user";

#[derive(Debug, Clone)]
pub struct SkipResult {
    pub occurrence: recurring_bill_occurrence::Model,
    pub message: String,
}

/// Lets a user waive an occurrence without moving money.
#[derive(Clone)]
pub struct OccurrenceSkipper {
    db: DatabaseConnection,
}

impl OccurrenceSkipper {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Marks the occurrence skipped. Paid occurrences cannot be skipped.
    #[instrument(skip(self))]
    pub async fn skip(
        &self,
        occurrence_id: i32,
        tenant_id: i32,
        reason: Option<String>,
    ) -> Result<SkipResult> {
        let occurrence = recurring_bill_occurrence::Entity::find_by_id(occurrence_id)
            .filter(recurring_bill_occurrence::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| BillError::occurrence_not_found(occurrence_id))?;

        if occurrence.is_paid() {
            return Err(BillError::InvalidState("cannot skip a paid occurrence".to_string()));
        }

        let skipped = recurring_bill_occurrence::ActiveModel {
            status: Set(OccurrenceStatus::Skipped),
            notes: Set(Some(reason.unwrap_or_else(|| DEFAULT_SKIP_NOTE.to_string()))),
            ..Default::default()
        };
        let updated = recurring_bill_occurrence::Entity::update_many()
            .set(skipped)
            .filter(recurring_bill_occurrence::Column::Id.eq(occurrence_id))
            .filter(recurring_bill_occurrence::Column::Status.ne(OccurrenceStatus::Paid))
            .exec(&self.db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(BillError::InvalidState("cannot skip a paid occurrence".to_string()));
        }

        let occurrence = recurring_bill_occurrence::Entity::find_by_id(occurrence_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| BillError::occurrence_not_found(occurrence_id))?;

        info!("Occurrence skipped");
        Ok(SkipResult {
            message: format!("Occurrence due {} skipped", occurrence.due_date),
            occurrence,
        })
    }
}
