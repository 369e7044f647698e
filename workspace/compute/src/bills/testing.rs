use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Set};

use migration::{Migrator, MigratorTrait};
use model::entities::recurring_bill::{BillStatus, Direction, Frequency};
use model::entities::recurring_bill_occurrence::OccurrenceStatus;
use model::entities::{bank_account, category, recurring_bill, recurring_bill_occurrence};

use crate::cache::{AggregateCache, CacheNamespace};
use crate::clock::{Clock, FixedClock};
use crate::error::{BillError, Result as BillResult};

pub type Result<T> = std::result::Result<T, DbErr>;

pub const TENANT: i32 = 1;
pub const OTHER_TENANT: i32 = 2;
pub const USER: i32 = 7;

/// Routes engine logs to the test harness output.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub async fn setup_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = Database::connect("sqlite::memory:").await?;
    db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn clock_at(date: NaiveDate) -> Arc<dyn Clock> {
    Arc::new(FixedClock::at_date(date))
}

/// Whole currency units, stored with two decimals like user input would be.
pub fn money(units: i64) -> Decimal {
    Decimal::new(units * 100, 2)
}

pub async fn new_account(db: &DatabaseConnection, tenant_id: i32, balance: i64) -> Result<bank_account::Model> {
    static ACCOUNT_ID: AtomicU64 = AtomicU64::new(0);
    let n = ACCOUNT_ID.fetch_add(1, Ordering::SeqCst);

    bank_account::ActiveModel {
        tenant_id: Set(tenant_id),
        name: Set(format!("Checking {}", n)),
        current_balance: Set(money(balance)),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn new_category(db: &DatabaseConnection, tenant_id: i32) -> Result<category::Model> {
    category::ActiveModel {
        tenant_id: Set(tenant_id),
        name: Set("Housing".to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Starting point for a bill row; tweak fields before calling `insert_bill`.
pub fn bill_template(tenant_id: i32, amount: i64, frequency: Frequency, due_day: i32) -> recurring_bill::ActiveModel {
    recurring_bill::ActiveModel {
        tenant_id: Set(tenant_id),
        name: Set("Rent".to_string()),
        direction: Set(Direction::Expense),
        amount: Set(Some(money(amount))),
        is_variable_amount: Set(false),
        frequency: Set(frequency),
        due_day: Set(due_day),
        status: Set(BillStatus::Active),
        auto_generate: Set(true),
        first_due_date: Set(None),
        last_due_date: Set(None),
        months_ahead: Set(None),
        category_id: Set(None),
        bank_account_id: Set(None),
        notes: Set(None),
        created_at: Set(ymd(2025, 1, 1).and_hms_opt(9, 0, 0).unwrap()),
        deleted_at: Set(None),
        ..Default::default()
    }
}

pub async fn insert_bill(db: &DatabaseConnection, bill: recurring_bill::ActiveModel) -> Result<recurring_bill::Model> {
    bill.insert(db).await
}

/// A monthly expense bill posting to `account`, with its first due date set.
pub async fn new_posting_bill(
    db: &DatabaseConnection,
    account: &bank_account::Model,
    category: &category::Model,
    amount: i64,
    first_due: NaiveDate,
) -> Result<recurring_bill::Model> {
    let mut bill = bill_template(account.tenant_id, amount, Frequency::Monthly, first_due.day() as i32);
    bill.first_due_date = Set(Some(first_due));
    bill.category_id = Set(Some(category.id));
    bill.bank_account_id = Set(Some(account.id));
    bill.insert(db).await
}

pub async fn new_occurrence(
    db: &DatabaseConnection,
    bill: &recurring_bill::Model,
    due_date: NaiveDate,
    status: OccurrenceStatus,
) -> Result<recurring_bill_occurrence::Model> {
    recurring_bill_occurrence::ActiveModel {
        tenant_id: Set(bill.tenant_id),
        recurring_bill_id: Set(bill.id),
        due_date: Set(due_date),
        amount: Set(bill.amount.unwrap_or_default()),
        status: Set(status),
        paid_date: Set(None),
        paid_amount: Set(None),
        notes: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Records every invalidation request.
#[derive(Debug, Default)]
pub struct RecordingCache {
    pub calls: Mutex<Vec<(i32, Vec<CacheNamespace>)>>,
}

impl RecordingCache {
    pub fn calls(&self) -> Vec<(i32, Vec<CacheNamespace>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AggregateCache for RecordingCache {
    async fn invalidate(&self, tenant_id: i32, namespaces: &[CacheNamespace]) -> BillResult<()> {
        self.calls.lock().unwrap().push((tenant_id, namespaces.to_vec()));
        Ok(())
    }
}

/// A cache whose backend is always down.
#[derive(Debug, Default)]
pub struct FailingCache;

#[async_trait]
impl AggregateCache for FailingCache {
    async fn invalidate(&self, _tenant_id: i32, _namespaces: &[CacheNamespace]) -> BillResult<()> {
        Err(BillError::Cache("connection refused".to_string()))
    }
}
