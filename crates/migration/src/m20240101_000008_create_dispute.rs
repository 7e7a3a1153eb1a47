//! Create `dispute` table. Disputes are filed by the order's owner.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Dispute::Table)
                    .if_not_exists()
                    .col(uuid(Dispute::Id).primary_key())
                    .col(uuid(Dispute::UserId).not_null())
                    .col(uuid(Dispute::OrderId).not_null())
                    .col(string_len(Dispute::Status, 32).default("OPEN").not_null())
                    .col(string_len(Dispute::Title, 255).not_null())
                    .col(text(Dispute::Description).not_null())
                    .col(text_null(Dispute::AdminNotes))
                    .col(timestamp_with_time_zone(Dispute::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Dispute::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dispute_user")
                            .from(Dispute::Table, Dispute::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_dispute_order")
                            .from(Dispute::Table, Dispute::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Dispute::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Dispute { Table, Id, UserId, OrderId, Status, Title, Description, AdminNotes, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Orders { Table, Id }
