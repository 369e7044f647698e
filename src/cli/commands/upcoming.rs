use anyhow::Result;
use chrono::{Days, NaiveDate, NaiveDateTime};
use compute::RecurringBillService;
use model::entities::recurring_bill_occurrence;
use rust_decimal::Decimal;
use sea_orm::ActiveEnum;
use serde::Serialize;

/// One row of the upcoming list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpcomingOccurrence {
    pub id: i32,
    pub recurring_bill_id: i32,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: String,
}

impl From<recurring_bill_occurrence::Model> for UpcomingOccurrence {
    fn from(occurrence: recurring_bill_occurrence::Model) -> Self {
        Self {
            id: occurrence.id,
            recurring_bill_id: occurrence.recurring_bill_id,
            due_date: occurrence.due_date,
            amount: occurrence.amount,
            status: occurrence.status.to_value(),
        }
    }
}

/// Occurrences due from `now` through the next `days` days.
pub async fn upcoming(
    service: &RecurringBillService,
    tenant_id: i32,
    days: u32,
    now: NaiveDateTime,
) -> Result<Vec<UpcomingOccurrence>> {
    let until = now
        .checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDateTime::MAX);

    let due = service.list_due_between(tenant_id, now, until).await?;
    Ok(due.into_iter().map(UpcomingOccurrence::from).collect())
}
