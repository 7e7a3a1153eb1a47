use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // CartItem: one line per product within a cart
        manager
            .create_index(
                Index::create()
                    .name("uniq_cart_item_cart_product")
                    .table(CartItem::Table)
                    .col(CartItem::CartId)
                    .col(CartItem::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Orders: per-user listing and admin status/date filters
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_user")
                    .table(Orders::Table)
                    .col(Orders::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_status_created")
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_item_order")
                    .table(OrderItem::Table)
                    .col(OrderItem::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_intent_user")
                    .table(PaymentIntent::Table)
                    .col(PaymentIntent::UserId)
                    .to_owned(),
            )
            .await?;

        // Dispute: open-dispute lookup per order
        manager
            .create_index(
                Index::create()
                    .name("idx_dispute_order_status")
                    .table(Dispute::Table)
                    .col(Dispute::OrderId)
                    .col(Dispute::Status)
                    .to_owned(),
            )
            .await?;
        // 每个订单最多一个未结争议
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uniq_dispute_active_order ON dispute (order_id) \
                 WHERE status IN ('OPEN', 'IN_PROGRESS')",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_created")
                    .table(Product::Table)
                    .col(Product::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_cart_item_cart_product").table(CartItem::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_user").table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_orders_status_created").table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_item_order").table(OrderItem::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_payment_intent_user").table(PaymentIntent::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_dispute_order_status").table(Dispute::Table).to_owned())
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uniq_dispute_active_order")
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_created").table(Product::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CartItem { Table, CartId, ProductId }

#[derive(DeriveIden)]
enum Orders { Table, UserId, Status, CreatedAt }

#[derive(DeriveIden)]
enum OrderItem { Table, OrderId }

#[derive(DeriveIden)]
enum PaymentIntent { Table, UserId }

#[derive(DeriveIden)]
enum Dispute { Table, OrderId, Status }

#[derive(DeriveIden)]
enum Product { Table, CreatedAt }
