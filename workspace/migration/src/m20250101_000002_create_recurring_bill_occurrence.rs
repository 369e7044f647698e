use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{recurring_bill, recurring_bill_occurrence};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create recurring_bill_occurrences table
        manager
            .create_table(
                Table::create()
                    .table(RecurringBillOccurrence::table())
                    .if_not_exists()
                    .col(pk_auto(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::Id,
                    )))
                    .col(integer(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::TenantId,
                    )))
                    .col(integer(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::RecurringBillId,
                    )))
                    .col(date(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::DueDate,
                    )))
                    .col(
                        decimal(RecurringBillOccurrence::column(
                            recurring_bill_occurrence::Column::Amount,
                        ))
                        .decimal_len(16, 4),
                    )
                    .col(string(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::Status,
                    )).string_len(15))
                    .col(date_null(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::PaidDate,
                    )))
                    .col(
                        decimal_null(RecurringBillOccurrence::column(
                            recurring_bill_occurrence::Column::PaidAmount,
                        ))
                        .decimal_len(16, 4),
                    )
                    .col(string_null(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::Notes,
                    )))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_bill_occurrences_recurring_bill")
                            .from(
                                RecurringBillOccurrence::table(),
                                RecurringBillOccurrence::column(
                                    recurring_bill_occurrence::Column::RecurringBillId,
                                ),
                            )
                            .to(
                                RecurringBill::table(),
                                RecurringBill::column(recurring_bill::Column::Id),
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One occurrence per bill and due date. Concurrent generators that lose
        // the race hit this index and count the period as skipped.
        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_bill_occurrences_bill_due_date")
                    .table(RecurringBillOccurrence::table())
                    .col(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::RecurringBillId,
                    ))
                    .col(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::DueDate,
                    ))
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Overdue sweep: tenant + status + due date
        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_bill_occurrences_tenant_status_due")
                    .table(RecurringBillOccurrence::table())
                    .col(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::TenantId,
                    ))
                    .col(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::Status,
                    ))
                    .col(RecurringBillOccurrence::column(
                        recurring_bill_occurrence::Column::DueDate,
                    ))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(RecurringBillOccurrence::table())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
