use chrono::{NaiveDate, NaiveDateTime};
use model::entities::recurring_bill::{self, BillStatus};
use model::entities::recurring_bill_occurrence::{self, OccurrenceStatus};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::dates::{end_of_day, start_of_day};
use crate::error::Result;

/// Occurrences of the tenant due between the start of `from`'s day and the
/// end of `to`'s day, earliest first.
pub async fn list_due_between<C: ConnectionTrait>(
    db: &C,
    tenant_id: i32,
    from: NaiveDateTime,
    to: NaiveDateTime,
) -> Result<Vec<recurring_bill_occurrence::Model>> {
    let first_day = start_of_day(from).date();
    let last_day = end_of_day(to).date();

    let occurrences = recurring_bill_occurrence::Entity::find()
        .filter(recurring_bill_occurrence::Column::TenantId.eq(tenant_id))
        .filter(recurring_bill_occurrence::Column::DueDate.between(first_day, last_day))
        .order_by_asc(recurring_bill_occurrence::Column::DueDate)
        .order_by_asc(recurring_bill_occurrence::Column::Id)
        .all(db)
        .await?;
    Ok(occurrences)
}

/// Tenants owning at least one active bill that is not deleted.
pub async fn tenants_with_active_bills<C: ConnectionTrait>(db: &C) -> Result<Vec<i32>> {
    let tenants = recurring_bill::Entity::find()
        .select_only()
        .column(recurring_bill::Column::TenantId)
        .filter(recurring_bill::Column::Status.eq(BillStatus::Active))
        .filter(recurring_bill::Column::DeletedAt.is_null())
        .distinct()
        .order_by_asc(recurring_bill::Column::TenantId)
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(tenants)
}

/// Tenants holding pending occurrences due before `today`, whatever the state
/// of their bills.
pub async fn tenants_with_past_due_occurrences<C: ConnectionTrait>(
    db: &C,
    today: NaiveDate,
) -> Result<Vec<i32>> {
    let tenants = recurring_bill_occurrence::Entity::find()
        .select_only()
        .column(recurring_bill_occurrence::Column::TenantId)
        .filter(recurring_bill_occurrence::Column::Status.eq(OccurrenceStatus::Pending))
        .filter(recurring_bill_occurrence::Column::DueDate.lt(today))
        .distinct()
        .order_by_asc(recurring_bill_occurrence::Column::TenantId)
        .into_tuple::<i32>()
        .all(db)
        .await?;
    Ok(tenants)
}
