//! Create `password_reset_token` table. Tokens are single-use and expire.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PasswordResetToken::Table)
                    .if_not_exists()
                    .col(uuid(PasswordResetToken::Id).primary_key())
                    .col(uuid(PasswordResetToken::UserId).not_null())
                    .col(string_len(PasswordResetToken::Token, 128).unique_key().not_null())
                    .col(timestamp_with_time_zone(PasswordResetToken::ExpiresAt).not_null())
                    .col(boolean(PasswordResetToken::Used).default(false).not_null())
                    .col(timestamp_with_time_zone(PasswordResetToken::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_password_reset_token_user")
                            .from(PasswordResetToken::Table, PasswordResetToken::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PasswordResetToken::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PasswordResetToken { Table, Id, UserId, Token, ExpiresAt, Used, CreatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }
