//! Migrator registering entity-specific migrations in dependency order.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_user_credentials;
mod m20240101_000003_create_password_reset_token;
mod m20240101_000004_create_product;
mod m20240101_000005_create_cart;
mod m20240101_000006_create_orders;
mod m20240101_000007_create_payment_intent;
mod m20240101_000008_create_dispute;
mod m20240101_000020_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_user_credentials::Migration),
            Box::new(m20240101_000003_create_password_reset_token::Migration),
            Box::new(m20240101_000004_create_product::Migration),
            Box::new(m20240101_000005_create_cart::Migration),
            Box::new(m20240101_000006_create_orders::Migration),
            Box::new(m20240101_000007_create_payment_intent::Migration),
            Box::new(m20240101_000008_create_dispute::Migration),
            // Indexes should always be applied last
            Box::new(m20240101_000020_add_indexes::Migration),
        ]
    }
}
