use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{bank_account, category, recurring_bill_occurrence};

/// Whether money comes in or goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Direction {
    #[sea_orm(string_value = "income")]
    Income,
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// Enum for recurrence periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Frequency {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "biweekly")]
    Biweekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "quarterly")]
    Quarterly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

/// Lifecycle of a recurring bill. Only `Active` bills generate occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum BillStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "paused")]
    Paused,
    #[sea_orm(string_value = "ended")]
    Ended,
}

/// A recurring bill template (rent, salary, phone plan...).
/// Concrete due dates live in `recurring_bill_occurrences`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_bills")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    pub direction: Direction,
    /// Nominal amount of each occurrence. `None` for variable-amount bills.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Option<Decimal>,
    #[sea_orm(default_value = "false")]
    pub is_variable_amount: bool,
    pub frequency: Frequency,
    /// Target day of the period (day of month for month-based frequencies).
    pub due_day: i32,
    pub status: BillStatus,
    /// Paying one occurrence generates the next one.
    #[sea_orm(default_value = "true")]
    pub auto_generate: bool,
    pub first_due_date: Option<NaiveDate>,
    pub last_due_date: Option<NaiveDate>,
    /// How many periods the scheduled job keeps materialized ahead.
    pub months_ahead: Option<i32>,
    /// Category used when posting a ledger transaction on payment.
    pub category_id: Option<i32>,
    /// Account whose balance moves on payment.
    pub bank_account_id: Option<i32>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    /// Soft-delete marker; deleted bills are kept for history only.
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "bank_account::Entity",
        from = "Column::BankAccountId",
        to = "bank_account::Column::Id",
        on_delete = "SetNull"
    )]
    BankAccount,
    #[sea_orm(
        belongs_to = "category::Entity",
        from = "Column::CategoryId",
        to = "category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(has_many = "recurring_bill_occurrence::Entity")]
    Occurrence,
}

impl Related<recurring_bill_occurrence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Occurrence.def()
    }
}

impl Related<bank_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccount.def()
    }
}

impl Related<category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A bill can post a ledger transaction only when both references are set.
    pub fn posting_target(&self) -> Option<(i32, i32)> {
        match (self.category_id, self.bank_account_id) {
            (Some(category_id), Some(bank_account_id)) => Some((category_id, bank_account_id)),
            _ => None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
