//! The recurring bill engine: occurrence generation, payment, skipping,
//! overdue reconciliation and tenant-wide batch generation.

use model::entities::recurring_bill;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::error::{BillError, Result};

/// Loads a bill owned by `tenant_id`. Soft-deleted bills are reported as missing.
pub(crate) async fn find_bill<C: ConnectionTrait>(
    db: &C,
    tenant_id: i32,
    bill_id: i32,
) -> Result<recurring_bill::Model> {
    recurring_bill::Entity::find_by_id(bill_id)
        .filter(recurring_bill::Column::TenantId.eq(tenant_id))
        .filter(recurring_bill::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| BillError::bill_not_found(bill_id))
}

/// The bill's target day as a calendar day, rejecting rows outside 1..=31.
pub(crate) fn target_day(bill: &recurring_bill::Model) -> Result<u32> {
    match u32::try_from(bill.due_day) {
        Ok(day @ 1..=31) => Ok(day),
        _ => Err(BillError::Validation(format!(
            "due day {} of bill {} is outside 1..=31",
            bill.due_day, bill.id
        ))),
    }
}

pub mod batch;
pub mod generator;
pub mod overdue;
pub mod payment;
pub mod queries;
pub mod rules;
pub mod service;
pub mod skip;

#[cfg(test)]
pub mod testing;
