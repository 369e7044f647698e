//! This file serves as the root for all SeaORM entity modules.
//! Every row is tenant-scoped through a plain `tenant_id` column; tenant
//! identity itself is owned by the surrounding application.

pub mod bank_account;
pub mod category;
pub mod ledger_transaction;
pub mod recurring_bill;
pub mod recurring_bill_occurrence;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::bank_account::Entity as BankAccount;
    pub use super::category::Entity as Category;
    pub use super::ledger_transaction::Entity as LedgerTransaction;
    pub use super::recurring_bill::Entity as RecurringBill;
    pub use super::recurring_bill_occurrence::Entity as RecurringBillOccurrence;
}
