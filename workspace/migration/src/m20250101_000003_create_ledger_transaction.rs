use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{
    bank_account, category, ledger_transaction, recurring_bill, recurring_bill_occurrence,
};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerTransaction::table())
                    .if_not_exists()
                    .col(pk_auto(LedgerTransaction::column(ledger_transaction::Column::Id)))
                    .col(integer(LedgerTransaction::column(ledger_transaction::Column::TenantId)))
                    .col(integer(LedgerTransaction::column(ledger_transaction::Column::UserId)))
                    .col(string(LedgerTransaction::column(ledger_transaction::Column::Direction)).string_len(10))
                    .col(integer(LedgerTransaction::column(ledger_transaction::Column::CategoryId)))
                    .col(integer(LedgerTransaction::column(ledger_transaction::Column::BankAccountId)))
                    .col(
                        decimal(LedgerTransaction::column(ledger_transaction::Column::Amount))
                            .decimal_len(16, 4),
                    )
                    .col(string(LedgerTransaction::column(ledger_transaction::Column::Description)))
                    .col(date(LedgerTransaction::column(ledger_transaction::Column::TransactionDate)))
                    .col(date_null(LedgerTransaction::column(ledger_transaction::Column::DueDate)))
                    .col(date_null(LedgerTransaction::column(ledger_transaction::Column::PaidDate)))
                    .col(
                        boolean(LedgerTransaction::column(ledger_transaction::Column::IsPaidEarly))
                            .default(false),
                    )
                    .col(
                        boolean(LedgerTransaction::column(ledger_transaction::Column::IsPaidLate))
                            .default(false),
                    )
                    .col(integer_null(LedgerTransaction::column(
                        ledger_transaction::Column::DaysEarlyLate,
                    )))
                    .col(string(LedgerTransaction::column(ledger_transaction::Column::Status)).string_len(15))
                    .col(integer_null(LedgerTransaction::column(
                        ledger_transaction::Column::RecurringBillId,
                    )))
                    .col(integer_null(LedgerTransaction::column(
                        ledger_transaction::Column::RecurringBillOccurrenceId,
                    )))
                    .col(date_time(LedgerTransaction::column(ledger_transaction::Column::CreatedAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_transactions_bank_account")
                            .from(
                                LedgerTransaction::table(),
                                LedgerTransaction::column(ledger_transaction::Column::BankAccountId),
                            )
                            .to(BankAccount::table(), BankAccount::column(bank_account::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_transactions_category")
                            .from(
                                LedgerTransaction::table(),
                                LedgerTransaction::column(ledger_transaction::Column::CategoryId),
                            )
                            .to(Category::table(), Category::column(category::Column::Id))
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_transactions_recurring_bill")
                            .from(
                                LedgerTransaction::table(),
                                LedgerTransaction::column(ledger_transaction::Column::RecurringBillId),
                            )
                            .to(
                                RecurringBill::table(),
                                RecurringBill::column(recurring_bill::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_transactions_occurrence")
                            .from(
                                LedgerTransaction::table(),
                                LedgerTransaction::column(
                                    ledger_transaction::Column::RecurringBillOccurrenceId,
                                ),
                            )
                            .to(
                                RecurringBillOccurrence::table(),
                                RecurringBillOccurrence::column(recurring_bill_occurrence::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerTransaction::table()).to_owned())
            .await?;

        Ok(())
    }
}
