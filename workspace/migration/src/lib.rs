pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_table;
mod m20250101_000002_create_recurring_bill_occurrence;
mod m20250101_000003_create_ledger_transaction;
pub mod entity_iden;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_table::Migration),
            Box::new(m20250101_000002_create_recurring_bill_occurrence::Migration),
            Box::new(m20250101_000003_create_ledger_transaction::Migration),
        ]
    }
}
