use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::entities::ledger_transaction::{self, LedgerStatus};
use model::entities::recurring_bill::{self, BillStatus, Direction};
use model::entities::recurring_bill_occurrence::{self, OccurrenceStatus};
use model::entities::bank_account;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use super::generator::OccurrenceGenerator;
use crate::cache::{AggregateCache, CacheNamespace};
use crate::clock::Clock;
use crate::dates::{diff_in_days, start_of_day};
use crate::error::{BillError, Result};

/// Caller-supplied details of a payment.
#[derive(Debug, Clone)]
pub struct PayOptions {
    /// Defaults to the occurrence amount.
    pub paid_amount: Option<Decimal>,
    /// Defaults to the clock's current time.
    pub paid_at: Option<NaiveDateTime>,
    /// Post a ledger transaction and move the account balance.
    pub materialize_transaction: bool,
    /// Replaces the occurrence notes when given.
    pub notes: Option<String>,
}

impl Default for PayOptions {
    fn default() -> Self {
        Self {
            paid_amount: None,
            paid_at: None,
            materialize_transaction: true,
            notes: None,
        }
    }
}

impl PayOptions {
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.paid_amount = Some(amount);
        self
    }

    pub fn paid_on(mut self, date: NaiveDate) -> Self {
        self.paid_at = Some(date.and_time(NaiveTime::MIN));
        self
    }

    pub fn paid_at(mut self, at: NaiveDateTime) -> Self {
        self.paid_at = Some(at);
        self
    }

    pub fn without_transaction(mut self) -> Self {
        self.materialize_transaction = false;
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// How the paid date relates to the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTiming {
    /// Negative when paid early, positive when late.
    pub days: i64,
}

impl PaymentTiming {
    pub fn classify(paid_at: NaiveDateTime, due_date: NaiveDate) -> Self {
        Self {
            days: diff_in_days(paid_at, due_date.and_time(NaiveTime::MIN)),
        }
    }

    pub fn is_early(&self) -> bool {
        self.days < 0
    }

    pub fn is_late(&self) -> bool {
        self.days > 0
    }

    /// Absolute distance in days, `None` when paid on the due date.
    pub fn days_early_late(&self) -> Option<i32> {
        match self.days {
            0 => None,
            days => Some(i32::try_from(days.abs()).unwrap_or(i32::MAX)),
        }
    }
}

/// What a successful payment produced.
#[derive(Debug, Clone)]
pub struct PaymentResult {
    pub occurrence: recurring_bill_occurrence::Model,
    /// The posted ledger transaction, if one was materialized.
    pub transaction: Option<ledger_transaction::Model>,
    pub balance_updated: bool,
    pub next_occurrence_generated: bool,
    /// Failure of the follow-up generation. The payment itself stands.
    pub next_occurrence_error: Option<String>,
}

/// Marks occurrences paid and posts the money movement.
#[derive(Clone)]
pub struct PaymentExecutor {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    cache: Arc<dyn AggregateCache>,
    generator: OccurrenceGenerator,
}

impl PaymentExecutor {
    pub fn new(
        db: DatabaseConnection,
        clock: Arc<dyn Clock>,
        cache: Arc<dyn AggregateCache>,
        generator: OccurrenceGenerator,
    ) -> Self {
        Self {
            db,
            clock,
            cache,
            generator,
        }
    }

    /// Pays one occurrence.
    ///
    /// The occurrence update, the ledger transaction and the balance change
    /// commit together or not at all. Generating the next occurrence and
    /// busting the tenant caches happen after commit and cannot fail the payment.
    #[instrument(skip(self, options), fields(paid_amount, days))]
    pub async fn pay(
        &self,
        occurrence_id: i32,
        tenant_id: i32,
        user_id: i32,
        options: PayOptions,
    ) -> Result<PaymentResult> {
        let (occurrence, bill) = recurring_bill_occurrence::Entity::find_by_id(occurrence_id)
            .filter(recurring_bill_occurrence::Column::TenantId.eq(tenant_id))
            .find_also_related(recurring_bill::Entity)
            .one(&self.db)
            .await?
            .ok_or_else(|| BillError::occurrence_not_found(occurrence_id))?;

        if !occurrence.is_payable() {
            return Err(not_payable(&occurrence));
        }
        let bill = bill.ok_or_else(|| BillError::bill_not_found(occurrence.recurring_bill_id))?;

        let paid_amount = options.paid_amount.unwrap_or(occurrence.amount);
        if paid_amount < Decimal::ZERO || (paid_amount.is_zero() && !bill.is_variable_amount) {
            return Err(BillError::Validation(format!(
                "paid amount {} must be positive unless the bill is variable",
                paid_amount
            )));
        }
        let paid_at = options.paid_at.unwrap_or_else(|| self.clock.now());
        let timing = PaymentTiming::classify(paid_at, occurrence.due_date);

        let span = tracing::Span::current();
        span.record("paid_amount", tracing::field::display(paid_amount));
        span.record("days", timing.days);

        let txn = self.db.begin().await?;

        let occurrence = mark_paid(&txn, &occurrence, paid_at, paid_amount, options.notes).await?;

        let transaction = match bill.posting_target() {
            Some((category_id, bank_account_id)) if options.materialize_transaction => {
                let posted = ledger_transaction::ActiveModel {
                    tenant_id: Set(tenant_id),
                    user_id: Set(user_id),
                    direction: Set(bill.direction),
                    category_id: Set(category_id),
                    bank_account_id: Set(bank_account_id),
                    amount: Set(paid_amount),
                    description: Set(format!("Payment: {}", bill.name)),
                    transaction_date: Set(occurrence.due_date),
                    due_date: Set(Some(occurrence.due_date)),
                    paid_date: Set(occurrence.paid_date),
                    is_paid_early: Set(timing.is_early()),
                    is_paid_late: Set(timing.is_late()),
                    days_early_late: Set(timing.days_early_late()),
                    status: Set(LedgerStatus::Completed),
                    recurring_bill_id: Set(Some(bill.id)),
                    recurring_bill_occurrence_id: Set(Some(occurrence.id)),
                    created_at: Set(self.clock.now()),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;

                apply_to_balance(&txn, tenant_id, bank_account_id, bill.direction, paid_amount).await?;
                Some(posted)
            }
            Some(_) => {
                debug!("Transaction materialization disabled by caller");
                None
            }
            None => {
                debug!(bill_id = bill.id, "Bill has no category or account, nothing to post");
                None
            }
        };

        txn.commit().await?;

        let balance_updated = transaction.is_some();
        let mut result = PaymentResult {
            occurrence,
            transaction,
            balance_updated,
            next_occurrence_generated: false,
            next_occurrence_error: None,
        };

        if bill.auto_generate && bill.status == BillStatus::Active {
            match self.generator.generate(bill.id, tenant_id, 1).await {
                Ok(next) => result.next_occurrence_generated = next.generated > 0,
                Err(e) => {
                    warn!(
                        target: "billcycle::next_occurrence",
                        recurring_bill_id = bill.id,
                        occurrence_id,
                        error = %e,
                        "Payment recorded but the next occurrence could not be generated"
                    );
                    result.next_occurrence_error = Some(e.to_string());
                }
            }
        }

        if let Err(e) = self.cache.invalidate(tenant_id, &CacheNamespace::AFTER_PAYMENT).await {
            warn!(tenant_id, error = %e, "Failed to invalidate tenant caches after payment");
        }

        info!(
            occurrence_id,
            bill_id = bill.id,
            balance_updated = result.balance_updated,
            next_occurrence_generated = result.next_occurrence_generated,
            "Occurrence paid"
        );
        Ok(result)
    }
}

fn not_payable(occurrence: &recurring_bill_occurrence::Model) -> BillError {
    match occurrence.status {
        OccurrenceStatus::Paid => {
            BillError::InvalidState(format!("occurrence {} is already paid", occurrence.id))
        }
        status => BillError::InvalidState(format!(
            "occurrence {} is {:?} and cannot be paid",
            occurrence.id, status
        )),
    }
}

/// Flips the occurrence to paid unless someone else paid or skipped it first.
async fn mark_paid(
    txn: &DatabaseTransaction,
    occurrence: &recurring_bill_occurrence::Model,
    paid_at: NaiveDateTime,
    paid_amount: Decimal,
    notes: Option<String>,
) -> Result<recurring_bill_occurrence::Model> {
    let paid = recurring_bill_occurrence::ActiveModel {
        status: Set(OccurrenceStatus::Paid),
        paid_date: Set(Some(start_of_day(paid_at).date())),
        paid_amount: Set(Some(paid_amount)),
        notes: Set(notes.or_else(|| occurrence.notes.clone())),
        ..Default::default()
    };

    let updated = recurring_bill_occurrence::Entity::update_many()
        .set(paid)
        .filter(recurring_bill_occurrence::Column::Id.eq(occurrence.id))
        .filter(
            recurring_bill_occurrence::Column::Status
                .is_in([OccurrenceStatus::Pending, OccurrenceStatus::Overdue]),
        )
        .exec(txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(BillError::InvalidState(format!(
            "occurrence {} is no longer payable",
            occurrence.id
        )));
    }

    recurring_bill_occurrence::Entity::find_by_id(occurrence.id)
        .one(txn)
        .await?
        .ok_or_else(|| BillError::occurrence_not_found(occurrence.id))
}

/// Relative balance change so concurrent payments on one account compose.
async fn apply_to_balance(
    txn: &DatabaseTransaction,
    tenant_id: i32,
    bank_account_id: i32,
    direction: Direction,
    amount: Decimal,
) -> Result<()> {
    let balance = Expr::col(bank_account::Column::CurrentBalance);
    let new_balance = match direction {
        Direction::Income => balance.add(amount),
        Direction::Expense => balance.sub(amount),
    };

    let updated = bank_account::Entity::update_many()
        .col_expr(bank_account::Column::CurrentBalance, new_balance)
        .filter(bank_account::Column::Id.eq(bank_account_id))
        .filter(bank_account::Column::TenantId.eq(tenant_id))
        .exec(txn)
        .await?;

    if updated.rows_affected == 0 {
        return Err(BillError::account_not_found(bank_account_id));
    }
    Ok(())
}
