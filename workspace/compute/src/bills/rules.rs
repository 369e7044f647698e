use std::sync::Arc;

use chrono::NaiveDate;
use model::entities::recurring_bill::{self, BillStatus, Direction, Frequency};
use model::entities::{bank_account, category};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, Set,
};
use tracing::{info, instrument, warn};

use super::find_bill;
use super::generator::OccurrenceGenerator;
use crate::clock::Clock;
use crate::error::{BillError, Result};

/// Periods materialized right after an auto-generating bill is created.
pub const INITIAL_PERIODS: u32 = 3;

/// User input for a new recurring bill.
#[derive(Debug, Clone)]
pub struct NewRecurringBill {
    pub name: String,
    pub direction: Direction,
    pub amount: Option<Decimal>,
    pub is_variable_amount: bool,
    pub frequency: Frequency,
    pub due_day: i32,
    pub auto_generate: bool,
    pub first_due_date: Option<NaiveDate>,
    pub last_due_date: Option<NaiveDate>,
    pub months_ahead: Option<i32>,
    pub category_id: Option<i32>,
    pub bank_account_id: Option<i32>,
    pub notes: Option<String>,
}

impl NewRecurringBill {
    /// A fixed-amount monthly bill with auto-generation on.
    pub fn monthly(name: impl Into<String>, direction: Direction, amount: Decimal, due_day: i32) -> Self {
        Self {
            name: name.into(),
            direction,
            amount: Some(amount),
            is_variable_amount: false,
            frequency: Frequency::Monthly,
            due_day,
            auto_generate: true,
            first_due_date: None,
            last_due_date: None,
            months_ahead: None,
            category_id: None,
            bank_account_id: None,
            notes: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BillError::Validation("name must not be empty".to_string()));
        }
        if !self.is_variable_amount && !self.amount.is_some_and(|amount| amount > Decimal::ZERO) {
            return Err(BillError::Validation(
                "amount must be positive unless the bill is variable".to_string(),
            ));
        }
        if !(1..=31).contains(&self.due_day) {
            return Err(BillError::Validation(format!(
                "due day {} is outside 1..=31",
                self.due_day
            )));
        }
        if self.months_ahead.is_some_and(|months| months < 1) {
            return Err(BillError::Validation("look-ahead must be at least 1".to_string()));
        }
        if let (Some(first), Some(last)) = (self.first_due_date, self.last_due_date) {
            if first > last {
                return Err(BillError::Validation(format!(
                    "first due date {} is after last due date {}",
                    first, last
                )));
            }
        }
        Ok(())
    }
}

impl From<&recurring_bill::Model> for NewRecurringBill {
    fn from(bill: &recurring_bill::Model) -> Self {
        Self {
            name: bill.name.clone(),
            direction: bill.direction,
            amount: bill.amount,
            is_variable_amount: bill.is_variable_amount,
            frequency: bill.frequency,
            due_day: bill.due_day,
            auto_generate: bill.auto_generate,
            first_due_date: bill.first_due_date,
            last_due_date: bill.last_due_date,
            months_ahead: bill.months_ahead,
            category_id: bill.category_id,
            bank_account_id: bill.bank_account_id,
            notes: bill.notes.clone(),
        }
    }
}

/// Partial edit of a recurring bill. Status changes go through
/// `pause`, `resume` and `end` instead.
#[derive(Debug, Clone, Default)]
pub struct RecurringBillChanges {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub is_variable_amount: Option<bool>,
    pub frequency: Option<Frequency>,
    pub due_day: Option<i32>,
    pub auto_generate: Option<bool>,
    pub last_due_date: Option<NaiveDate>,
    pub months_ahead: Option<i32>,
    pub category_id: Option<i32>,
    pub bank_account_id: Option<i32>,
    pub notes: Option<String>,
}

/// Creation and lifecycle transitions of recurring bills.
#[derive(Clone)]
pub struct RecurringBillRules {
    db: DatabaseConnection,
    clock: Arc<dyn Clock>,
    generator: OccurrenceGenerator,
}

impl RecurringBillRules {
    pub fn new(db: DatabaseConnection, clock: Arc<dyn Clock>, generator: OccurrenceGenerator) -> Self {
        Self { db, clock, generator }
    }

    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, tenant_id: i32, new: NewRecurringBill) -> Result<recurring_bill::Model> {
        new.validate()?;
        self.check_ownership(tenant_id, &new).await?;

        let bill = recurring_bill::ActiveModel {
            tenant_id: Set(tenant_id),
            name: Set(new.name.trim().to_string()),
            direction: Set(new.direction),
            amount: Set(new.amount),
            is_variable_amount: Set(new.is_variable_amount),
            frequency: Set(new.frequency),
            due_day: Set(new.due_day),
            status: Set(BillStatus::Active),
            auto_generate: Set(new.auto_generate),
            first_due_date: Set(new.first_due_date),
            last_due_date: Set(new.last_due_date),
            months_ahead: Set(new.months_ahead),
            category_id: Set(new.category_id),
            bank_account_id: Set(new.bank_account_id),
            notes: Set(new.notes),
            created_at: Set(self.clock.now()),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        if !bill.auto_generate {
            info!(bill_id = bill.id, "Recurring bill created");
            return Ok(bill);
        }

        // The bill is committed either way; the batch job tops up what is missing.
        match self.generator.generate(bill.id, tenant_id, INITIAL_PERIODS).await {
            Ok(initial) => {
                info!(bill_id = bill.id, generated = initial.generated, "Recurring bill created")
            }
            Err(e) => warn!(
                bill_id = bill.id,
                error = %e,
                "Recurring bill created but its first occurrences could not be generated"
            ),
        }
        Ok(bill)
    }

    /// Applies the given changes. Fields left `None` keep their value.
    /// Occurrences already issued keep their due date and amount.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        bill_id: i32,
        tenant_id: i32,
        changes: RecurringBillChanges,
    ) -> Result<recurring_bill::Model> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;

        let mut merged = NewRecurringBill::from(&bill);
        if let Some(name) = changes.name {
            merged.name = name.trim().to_string();
        }
        if let Some(amount) = changes.amount {
            merged.amount = Some(amount);
        }
        if let Some(is_variable_amount) = changes.is_variable_amount {
            merged.is_variable_amount = is_variable_amount;
        }
        if let Some(frequency) = changes.frequency {
            merged.frequency = frequency;
        }
        if let Some(due_day) = changes.due_day {
            merged.due_day = due_day;
        }
        if let Some(auto_generate) = changes.auto_generate {
            merged.auto_generate = auto_generate;
        }
        if let Some(last_due_date) = changes.last_due_date {
            merged.last_due_date = Some(last_due_date);
        }
        if let Some(months_ahead) = changes.months_ahead {
            merged.months_ahead = Some(months_ahead);
        }
        if let Some(category_id) = changes.category_id {
            merged.category_id = Some(category_id);
        }
        if let Some(bank_account_id) = changes.bank_account_id {
            merged.bank_account_id = Some(bank_account_id);
        }
        if let Some(notes) = changes.notes {
            merged.notes = Some(notes);
        }

        merged.validate()?;
        self.check_ownership(tenant_id, &merged).await?;

        let mut updated = bill.into_active_model();
        updated.name = Set(merged.name);
        updated.amount = Set(merged.amount);
        updated.is_variable_amount = Set(merged.is_variable_amount);
        updated.frequency = Set(merged.frequency);
        updated.due_day = Set(merged.due_day);
        updated.auto_generate = Set(merged.auto_generate);
        updated.last_due_date = Set(merged.last_due_date);
        updated.months_ahead = Set(merged.months_ahead);
        updated.category_id = Set(merged.category_id);
        updated.bank_account_id = Set(merged.bank_account_id);
        updated.notes = Set(merged.notes);
        let bill = updated.update(&self.db).await?;

        info!(bill_id = bill.id, "Recurring bill updated");
        Ok(bill)
    }

    #[instrument(skip(self))]
    pub async fn pause(&self, bill_id: i32, tenant_id: i32) -> Result<recurring_bill::Model> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;
        if bill.status == BillStatus::Ended {
            return Err(BillError::InvalidState("cannot pause an ended bill".to_string()));
        }
        self.set_status(bill, BillStatus::Paused).await
    }

    #[instrument(skip(self))]
    pub async fn resume(&self, bill_id: i32, tenant_id: i32) -> Result<recurring_bill::Model> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;
        if bill.status == BillStatus::Ended {
            return Err(BillError::InvalidState("cannot resume an ended bill".to_string()));
        }
        self.set_status(bill, BillStatus::Active).await
    }

    #[instrument(skip(self))]
    pub async fn end(&self, bill_id: i32, tenant_id: i32) -> Result<recurring_bill::Model> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;
        self.set_status(bill, BillStatus::Ended).await
    }

    /// Hides the bill from every other operation. Its occurrences and
    /// posted transactions stay for history.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, bill_id: i32, tenant_id: i32) -> Result<()> {
        let bill = find_bill(&self.db, tenant_id, bill_id).await?;

        let mut deleted = bill.into_active_model();
        deleted.status = Set(BillStatus::Ended);
        deleted.deleted_at = Set(Some(self.clock.now()));
        deleted.update(&self.db).await?;

        info!("Recurring bill deleted");
        Ok(())
    }

    async fn set_status(&self, bill: recurring_bill::Model, status: BillStatus) -> Result<recurring_bill::Model> {
        if bill.status == status {
            return Ok(bill);
        }
        let from = bill.status;
        let mut changed = bill.into_active_model();
        changed.status = Set(status);
        let bill = changed.update(&self.db).await?;

        info!(bill_id = bill.id, ?from, to = ?status, "Recurring bill status changed");
        Ok(bill)
    }

    async fn check_ownership(&self, tenant_id: i32, new: &NewRecurringBill) -> Result<()> {
        if let Some(category_id) = new.category_id {
            let owned = category::Entity::find_by_id(category_id)
                .filter(category::Column::TenantId.eq(tenant_id))
                .count(&self.db)
                .await?;
            if owned == 0 {
                return Err(BillError::Validation(format!("unknown category {}", category_id)));
            }
        }
        if let Some(bank_account_id) = new.bank_account_id {
            let owned = bank_account::Entity::find_by_id(bank_account_id)
                .filter(bank_account::Column::TenantId.eq(tenant_id))
                .count(&self.db)
                .await?;
            if owned == 0 {
                return Err(BillError::Validation(format!(
                    "unknown bank account {}",
                    bank_account_id
                )));
            }
        }
        Ok(())
    }
}
