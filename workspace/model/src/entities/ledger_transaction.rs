use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::recurring_bill::Direction;
use super::{bank_account, category, recurring_bill, recurring_bill_occurrence};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum LedgerStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
}

/// A materialized money movement on a bank account.
/// Paying an occurrence posts one of these, linked back to the bill and occurrence.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    /// The user who recorded the payment.
    pub user_id: i32,
    pub direction: Direction,
    pub category_id: i32,
    pub bank_account_id: i32,
    /// Always positive; `direction` carries the sign.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub description: String,
    pub transaction_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<NaiveDate>,
    #[sea_orm(default_value = "false")]
    pub is_paid_early: bool,
    #[sea_orm(default_value = "false")]
    pub is_paid_late: bool,
    /// Distance between paid date and due date. `None` when paid on time.
    pub days_early_late: Option<i32>,
    pub status: LedgerStatus,
    pub recurring_bill_id: Option<i32>,
    pub recurring_bill_occurrence_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "bank_account::Entity",
        from = "Column::BankAccountId",
        to = "bank_account::Column::Id",
        on_delete = "Cascade"
    )]
    BankAccount,
    #[sea_orm(
        belongs_to = "category::Entity",
        from = "Column::CategoryId",
        to = "category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,
    #[sea_orm(
        belongs_to = "recurring_bill::Entity",
        from = "Column::RecurringBillId",
        to = "recurring_bill::Column::Id",
        on_delete = "SetNull"
    )]
    RecurringBill,
    #[sea_orm(
        belongs_to = "recurring_bill_occurrence::Entity",
        from = "Column::RecurringBillOccurrenceId",
        to = "recurring_bill_occurrence::Column::Id",
        on_delete = "SetNull"
    )]
    Occurrence,
}

impl Related<bank_account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
