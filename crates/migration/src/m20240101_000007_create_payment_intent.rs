//! Create `payment_intent` table tracking gateway references.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PaymentIntent::Table)
                    .if_not_exists()
                    .col(uuid(PaymentIntent::Id).primary_key())
                    .col(uuid(PaymentIntent::UserId).not_null())
                    .col(uuid_null(PaymentIntent::OrderId))
                    .col(string_len(PaymentIntent::Reference, 128).unique_key().not_null())
                    .col(decimal_len(PaymentIntent::Amount, 12, 2).not_null())
                    .col(string_len(PaymentIntent::Currency, 8).default("NGN").not_null())
                    .col(string_len(PaymentIntent::Status, 32).default("pending").not_null())
                    .col(timestamp_with_time_zone(PaymentIntent::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(PaymentIntent::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_intent_user")
                            .from(PaymentIntent::Table, PaymentIntent::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_intent_order")
                            .from(PaymentIntent::Table, PaymentIntent::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(PaymentIntent::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum PaymentIntent { Table, Id, UserId, OrderId, Reference, Amount, Currency, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Orders { Table, Id }
