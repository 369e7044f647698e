use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::recurring_bill;

/// Represents the status of a single occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(15))")]
pub enum OccurrenceStatus {
    #[sea_orm(string_value = "pending")]
    Pending, // Expected, not yet paid.
    #[sea_orm(string_value = "paid")]
    Paid, // Terminal.
    #[sea_orm(string_value = "skipped")]
    Skipped, // Terminal, set by the user.
    #[sea_orm(string_value = "overdue")]
    Overdue, // Due date passed while pending. Can still be paid.
}

/// One concrete instance of a recurring bill due on a specific date.
/// At most one row exists per (recurring_bill_id, due_date); the migration
/// backs this with a unique index.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_bill_occurrences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,

    /// The bill that generated this occurrence.
    pub recurring_bill_id: i32,

    pub due_date: NaiveDate,

    /// Copied from the bill when generated.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,

    pub status: OccurrenceStatus,

    pub paid_date: Option<NaiveDate>,

    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub paid_amount: Option<Decimal>,

    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "recurring_bill::Entity",
        from = "Column::RecurringBillId",
        to = "recurring_bill::Column::Id",
        on_delete = "Cascade"
    )]
    RecurringBill,
}

impl Related<recurring_bill::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecurringBill.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_paid(&self) -> bool {
        self.status == OccurrenceStatus::Paid
    }

    /// Paid and skipped are terminal.
    pub fn is_payable(&self) -> bool {
        matches!(self.status, OccurrenceStatus::Pending | OccurrenceStatus::Overdue)
    }
}
