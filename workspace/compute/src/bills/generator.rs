use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use model::entities::recurring_bill::{self, BillStatus};
use model::entities::recurring_bill_occurrence::{self, OccurrenceStatus};
use rust_decimal::Decimal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use super::{find_bill, target_day};
use crate::clock::Clock;
use crate::dates::{advance, safe_due_date};
use crate::error::Result;

/// Outcome of one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    /// Occurrences created by this call.
    pub generated: u32,
    /// Due dates that already had an occurrence.
    pub skipped: u32,
    /// Due dates of the created occurrences, in order.
    pub dates: Vec<NaiveDate>,
}

/// Where a new window of occurrences begins.
///
/// The period after the latest existing occurrence wins, then the bill's
/// first due date, then this month's due date (pushed one period forward
/// when it is already behind `today`).
pub fn generation_start(
    bill: &recurring_bill::Model,
    latest_due: Option<NaiveDate>,
    today: NaiveDate,
    target_day: u32,
) -> NaiveDate {
    if let Some(latest) = latest_due {
        return advance(latest, bill.frequency, target_day, 1);
    }
    if let Some(first) = bill.first_due_date {
        return first;
    }

    let this_month = safe_due_date(today.year(), today.month(), target_day);
    if this_month < today {
        advance(this_month, bill.frequency, target_day, 1)
    } else {
        this_month
    }
}

/// Materializes future occurrences of recurring bills.
#[derive(Clone)]
pub struct OccurrenceGenerator {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
}

impl OccurrenceGenerator {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Creates up to `periods` pending occurrences following the bill's latest one.
    ///
    /// Non-active bills produce an empty result without touching the
    /// occurrence table. Dates past the bill's `last_due_date` end the window.
    #[instrument(skip(self), fields(generated, skipped))]
    pub async fn generate(&self, bill_id: i32, tenant_id: i32, periods: u32) -> Result<GenerationResult> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;

        if bill.status != BillStatus::Active {
            info!(status = ?bill.status, "Bill is not active, nothing to generate");
            return Ok(GenerationResult::default());
        }

        let day = target_day(&bill)?;
        let latest = self.latest_due_date(bill.id).await?;
        let start = generation_start(&bill, latest, self.clock.today(), day);
        trace!(%start, ?latest, "Computed generation start");

        let window = (0..periods).map(|i| advance(start, bill.frequency, day, i));
        let result = self.materialize(&bill, window).await?;

        tracing::Span::current()
            .record("generated", result.generated)
            .record("skipped", result.skipped);
        debug!(dates = ?result.dates, "Generation finished");
        Ok(result)
    }

    /// Inserts one pending occurrence per due date, in order.
    ///
    /// Dates with an existing occurrence count as skipped. The first date
    /// past `last_due_date` stops the walk.
    pub(crate) async fn materialize(
        &self,
        bill: &recurring_bill::Model,
        due_dates: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<GenerationResult> {
        let mut result = GenerationResult::default();

        for due_date in due_dates {
            if self.occurrence_exists(bill.id, due_date).await? {
                trace!(%due_date, "Occurrence already exists");
                result.skipped += 1;
                continue;
            }

            if bill.last_due_date.is_some_and(|last| due_date > last) {
                debug!(%due_date, last_due_date = ?bill.last_due_date, "Reached last due date");
                break;
            }

            if self.insert_if_absent(bill, due_date).await? {
                result.generated += 1;
                result.dates.push(due_date);
            } else {
                // Lost a race against a concurrent generator.
                result.skipped += 1;
            }
        }

        Ok(result)
    }

    async fn latest_due_date(&self, bill_id: i32) -> Result<Option<NaiveDate>> {
        let latest = recurring_bill_occurrence::Entity::find()
            .filter(recurring_bill_occurrence::Column::RecurringBillId.eq(bill_id))
            .order_by_desc(recurring_bill_occurrence::Column::DueDate)
            .one(&self.db)
            .await?;
        Ok(latest.map(|occurrence| occurrence.due_date))
    }

    async fn occurrence_exists(&self, bill_id: i32, due_date: NaiveDate) -> Result<bool> {
        let count = recurring_bill_occurrence::Entity::find()
            .filter(recurring_bill_occurrence::Column::RecurringBillId.eq(bill_id))
            .filter(recurring_bill_occurrence::Column::DueDate.eq(due_date))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Returns false when the unique (bill, due date) index already holds the row.
    async fn insert_if_absent(&self, bill: &recurring_bill::Model, due_date: NaiveDate) -> Result<bool> {
        let occurrence = recurring_bill_occurrence::ActiveModel {
            tenant_id: Set(bill.tenant_id),
            recurring_bill_id: Set(bill.id),
            due_date: Set(due_date),
            amount: Set(bill.amount.unwrap_or(Decimal::ZERO)),
            status: Set(OccurrenceStatus::Pending),
            paid_date: Set(None),
            paid_amount: Set(None),
            notes: Set(None),
            ..Default::default()
        };

        let inserted = recurring_bill_occurrence::Entity::insert(occurrence)
            .on_conflict(
                OnConflict::columns([
                    recurring_bill_occurrence::Column::RecurringBillId,
                    recurring_bill_occurrence::Column::DueDate,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bills::testing::*;
    use crate::bills::testing::Result;
    use crate::error::BillError;
    use model::entities::recurring_bill::Frequency;
    use sea_orm::{ActiveModelTrait, IntoActiveModel};

    async fn occurrences_of(db: &DatabaseConnection, bill_id: i32) -> Vec<recurring_bill_occurrence::Model> {
        recurring_bill_occurrence::Entity::find()
            .filter(recurring_bill_occurrence::Column::RecurringBillId.eq(bill_id))
            .order_by_asc(recurring_bill_occurrence::Column::DueDate)
            .all(db)
            .await
            .unwrap()
    }

    #[test]
    fn test_generation_start_precedence() {
        let mut bill = recurring_bill::Model {
            id: 1,
            tenant_id: TENANT,
            name: "Phone".to_string(),
            direction: recurring_bill::Direction::Expense,
            amount: Some(money(40)),
            is_variable_amount: false,
            frequency: Frequency::Monthly,
            due_day: 20,
            status: BillStatus::Active,
            auto_generate: true,
            first_due_date: Some(ymd(2025, 1, 20)),
            last_due_date: None,
            months_ahead: None,
            category_id: None,
            bank_account_id: None,
            notes: None,
            created_at: ymd(2025, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
            deleted_at: None,
        };
        let today = ymd(2025, 6, 25);

        // Latest occurrence wins over everything else
        assert_eq!(generation_start(&bill, Some(ymd(2025, 3, 20)), today, 20), ymd(2025, 4, 20));
        // Then the configured first due date, even in the past
        assert_eq!(generation_start(&bill, None, today, 20), ymd(2025, 1, 20));

        // Then this month's date, moved forward once it has passed
        bill.first_due_date = None;
        assert_eq!(generation_start(&bill, None, today, 20), ymd(2025, 7, 20));
        assert_eq!(generation_start(&bill, None, ymd(2025, 6, 20), 20), ymd(2025, 6, 20));
        assert_eq!(generation_start(&bill, None, ymd(2025, 2, 3), 31), ymd(2025, 2, 28));
    }

    #[tokio::test]
    async fn test_month_end_bill_clamps_without_drift() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 1200, Frequency::Monthly, 31);
        bill.first_due_date = Set(Some(ymd(2025, 1, 31)));
        let bill = insert_bill(&db, bill).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));
        let result = generator.generate(bill.id, TENANT, 3).await.unwrap();

        let expected = vec![ymd(2025, 1, 31), ymd(2025, 2, 28), ymd(2025, 3, 31)];
        assert_eq!(result.generated, 3);
        assert_eq!(result.skipped, 0);
        assert_eq!(result.dates, expected);

        let stored = occurrences_of(&db, bill.id).await;
        assert_eq!(stored.iter().map(|o| o.due_date).collect::<Vec<_>>(), expected);
        for occurrence in &stored {
            assert_eq!(occurrence.status, OccurrenceStatus::Pending);
            assert_eq!(occurrence.amount, money(1200));
            assert_eq!(occurrence.tenant_id, TENANT);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_next_call_continues_after_latest_occurrence() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 1200, Frequency::Monthly, 31);
        bill.first_due_date = Set(Some(ymd(2025, 1, 31)));
        let bill = insert_bill(&db, bill).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));
        generator.generate(bill.id, TENANT, 3).await.unwrap();
        let second = generator.generate(bill.id, TENANT, 2).await.unwrap();

        assert_eq!(second.dates, vec![ymd(2025, 4, 30), ymd(2025, 5, 31)]);
        assert_eq!(occurrences_of(&db, bill.id).await.len(), 5);

        Ok(())
    }

    #[tokio::test]
    async fn test_overlapping_windows_create_each_date_once() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 50, Frequency::Monthly, 10);
        bill.first_due_date = Set(Some(ymd(2025, 1, 10)));
        let bill = insert_bill(&db, bill).await?;
        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));

        let first = generator
            .materialize(&bill, [ymd(2025, 1, 10), ymd(2025, 2, 10), ymd(2025, 3, 10)])
            .await
            .unwrap();
        let second = generator
            .materialize(&bill, [ymd(2025, 2, 10), ymd(2025, 3, 10), ymd(2025, 4, 10)])
            .await
            .unwrap();

        assert_eq!((first.generated, first.skipped), (3, 0));
        assert_eq!((second.generated, second.skipped), (1, 2));
        assert_eq!(second.dates, vec![ymd(2025, 4, 10)]);
        assert_eq!(occurrences_of(&db, bill.id).await.len(), 4);

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_generation_keeps_due_dates_unique() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 50, Frequency::Weekly, 1);
        bill.first_due_date = Set(Some(ymd(2025, 1, 6)));
        let bill = insert_bill(&db, bill).await?;
        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));

        let (a, b) = tokio::join!(
            generator.generate(bill.id, TENANT, 4),
            generator.generate(bill.id, TENANT, 4)
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        let stored = occurrences_of(&db, bill.id).await;
        let mut due_dates: Vec<_> = stored.iter().map(|o| o.due_date).collect();
        due_dates.dedup();
        assert_eq!(due_dates.len(), stored.len());
        assert_eq!((a.generated + b.generated) as usize, stored.len());

        Ok(())
    }

    #[tokio::test]
    async fn test_stops_at_last_due_date() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 300, Frequency::Monthly, 15);
        bill.first_due_date = Set(Some(ymd(2025, 1, 15)));
        bill.last_due_date = Set(Some(ymd(2025, 2, 15)));
        let bill = insert_bill(&db, bill).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));
        let result = generator.generate(bill.id, TENANT, 6).await.unwrap();

        assert_eq!(result.dates, vec![ymd(2025, 1, 15), ymd(2025, 2, 15)]);
        assert_eq!(result.skipped, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_bill_writes_nothing() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 80, Frequency::Monthly, 5);
        bill.status = Set(BillStatus::Paused);
        let paused = insert_bill(&db, bill).await?;

        let mut bill = bill_template(TENANT, 80, Frequency::Monthly, 5);
        bill.status = Set(BillStatus::Ended);
        let ended = insert_bill(&db, bill).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));
        for bill in [&paused, &ended] {
            let result = generator.generate(bill.id, TENANT, 3).await.unwrap();
            assert_eq!(result, GenerationResult::default());
            assert!(occurrences_of(&db, bill.id).await.is_empty());
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_deleted_or_foreign_bill_is_not_found() -> Result<()> {
        let db = setup_db().await?;
        let bill = insert_bill(&db, bill_template(TENANT, 80, Frequency::Monthly, 5)).await?;
        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));

        let err = generator.generate(bill.id, OTHER_TENANT, 3).await.unwrap_err();
        assert!(matches!(err, BillError::NotFound { id, .. } if id == bill.id));

        assert!(matches!(
            generator.generate(9999, TENANT, 3).await,
            Err(BillError::NotFound { .. })
        ));

        let mut deleted = bill.clone().into_active_model();
        deleted.deleted_at = Set(Some(ymd(2025, 1, 2).and_hms_opt(8, 0, 0).unwrap()));
        deleted.update(&db).await?;
        assert!(matches!(
            generator.generate(bill.id, TENANT, 3).await,
            Err(BillError::NotFound { .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_variable_amount_bill_starts_at_zero() -> Result<()> {
        let db = setup_db().await?;
        let mut bill = bill_template(TENANT, 0, Frequency::Quarterly, 1);
        bill.amount = Set(None);
        bill.is_variable_amount = Set(true);
        let bill = insert_bill(&db, bill).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 2, 14)));
        let result = generator.generate(bill.id, TENANT, 2).await.unwrap();

        // Feb 1st already passed, so the window starts a quarter later
        assert_eq!(result.dates, vec![ymd(2025, 5, 1), ymd(2025, 8, 1)]);
        for occurrence in occurrences_of(&db, bill.id).await {
            assert_eq!(occurrence.amount, Decimal::ZERO);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_due_day_is_rejected() -> Result<()> {
        let db = setup_db().await?;
        let bill = insert_bill(&db, bill_template(TENANT, 10, Frequency::Monthly, 0)).await?;

        let generator = OccurrenceGenerator::new(db.clone(), clock_at(ymd(2025, 1, 1)));
        assert!(matches!(
            generator.generate(bill.id, TENANT, 1).await,
            Err(BillError::Validation(_))
        ));

        Ok(())
    }
}
