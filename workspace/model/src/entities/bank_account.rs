use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A bank-account-like holder of a running balance.
/// Paying a recurring bill moves `current_balance` up (income) or down (expense).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// The tenant that owns this account.
    pub tenant_id: i32,
    pub name: String,
    /// Running balance. Only ever changed with relative updates.
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub current_balance: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_transaction::Entity")]
    LedgerTransaction,
    #[sea_orm(has_many = "super::recurring_bill::Entity")]
    RecurringBill,
}

impl Related<super::ledger_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
