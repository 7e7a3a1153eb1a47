//! Create `cart` and `cart_item` tables.
//!
//! One cart per user; one line per (cart, product).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cart::Table)
                    .if_not_exists()
                    .col(uuid(Cart::Id).primary_key())
                    .col(uuid(Cart::UserId).unique_key().not_null())
                    .col(timestamp_with_time_zone(Cart::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Cart::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_user")
                            .from(Cart::Table, Cart::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CartItem::Table)
                    .if_not_exists()
                    .col(uuid(CartItem::Id).primary_key())
                    .col(uuid(CartItem::CartId).not_null())
                    .col(uuid(CartItem::ProductId).not_null())
                    .col(integer(CartItem::Quantity).not_null().check(Expr::col(CartItem::Quantity).gte(1)))
                    .col(timestamp_with_time_zone(CartItem::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(CartItem::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_item_cart")
                            .from(CartItem::Table, CartItem::CartId)
                            .to(Cart::Table, Cart::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cart_item_product")
                            .from(CartItem::Table, CartItem::ProductId)
                            .to(Product::Table, Product::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(CartItem::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Cart::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Cart { Table, Id, UserId, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum CartItem { Table, Id, CartId, ProductId, Quantity, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Users { Table, Id }

#[derive(DeriveIden)]
enum Product { Table, Id }
