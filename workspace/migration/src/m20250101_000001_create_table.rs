use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{bank_account, category, recurring_bill};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create bank_accounts table
        manager
            .create_table(
                Table::create()
                    .table(BankAccount::table())
                    .if_not_exists()
                    .col(pk_auto(BankAccount::column(bank_account::Column::Id)))
                    .col(integer(BankAccount::column(bank_account::Column::TenantId)))
                    .col(string(BankAccount::column(bank_account::Column::Name)))
                    .col(
                        decimal(BankAccount::column(bank_account::Column::CurrentBalance))
                            .decimal_len(16, 4),
                    )
                    .to_owned(),
            )
            .await?;

        // Create categories table
        manager
            .create_table(
                Table::create()
                    .table(Category::table())
                    .if_not_exists()
                    .col(pk_auto(Category::column(category::Column::Id)))
                    .col(integer(Category::column(category::Column::TenantId)))
                    .col(string(Category::column(category::Column::Name)))
                    .col(string_null(Category::column(category::Column::Description)))
                    .to_owned(),
            )
            .await?;

        // Create recurring_bills table
        manager
            .create_table(
                Table::create()
                    .table(RecurringBill::table())
                    .if_not_exists()
                    .col(pk_auto(RecurringBill::column(recurring_bill::Column::Id)))
                    .col(integer(RecurringBill::column(recurring_bill::Column::TenantId)))
                    .col(string(RecurringBill::column(recurring_bill::Column::Name)))
                    .col(string(RecurringBill::column(recurring_bill::Column::Direction)).string_len(10))
                    .col(
                        decimal_null(RecurringBill::column(recurring_bill::Column::Amount))
                            .decimal_len(16, 4),
                    )
                    .col(
                        boolean(RecurringBill::column(recurring_bill::Column::IsVariableAmount))
                            .default(false),
                    )
                    .col(string(RecurringBill::column(recurring_bill::Column::Frequency)).string_len(10))
                    .col(integer(RecurringBill::column(recurring_bill::Column::DueDay)))
                    .col(string(RecurringBill::column(recurring_bill::Column::Status)).string_len(10))
                    .col(
                        boolean(RecurringBill::column(recurring_bill::Column::AutoGenerate))
                            .default(true),
                    )
                    .col(date_null(RecurringBill::column(recurring_bill::Column::FirstDueDate)))
                    .col(date_null(RecurringBill::column(recurring_bill::Column::LastDueDate)))
                    .col(integer_null(RecurringBill::column(recurring_bill::Column::MonthsAhead)))
                    .col(integer_null(RecurringBill::column(recurring_bill::Column::CategoryId)))
                    .col(integer_null(RecurringBill::column(recurring_bill::Column::BankAccountId)))
                    .col(string_null(RecurringBill::column(recurring_bill::Column::Notes)))
                    .col(date_time(RecurringBill::column(recurring_bill::Column::CreatedAt)))
                    .col(date_time_null(RecurringBill::column(recurring_bill::Column::DeletedAt)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_bills_bank_account")
                            .from(
                                RecurringBill::table(),
                                RecurringBill::column(recurring_bill::Column::BankAccountId),
                            )
                            .to(
                                BankAccount::table(),
                                BankAccount::column(bank_account::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_bills_category")
                            .from(
                                RecurringBill::table(),
                                RecurringBill::column(recurring_bill::Column::CategoryId),
                            )
                            .to(Category::table(), Category::column(category::Column::Id))
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The batch job scans active bills per tenant
        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_bills_tenant_status")
                    .table(RecurringBill::table())
                    .col(RecurringBill::column(recurring_bill::Column::TenantId))
                    .col(RecurringBill::column(recurring_bill::Column::Status))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringBill::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Category::table()).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BankAccount::table()).to_owned())
            .await?;

        Ok(())
    }
}
