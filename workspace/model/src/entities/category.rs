use sea_orm::entity::prelude::*;

/// A tenant-scoped category that ledger transactions are booked against.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tenant_id: i32,
    pub name: String,
    /// A description of what the category is for.
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recurring_bill::Entity")]
    RecurringBill,
}

impl ActiveModelBehavior for ActiveModel {}
