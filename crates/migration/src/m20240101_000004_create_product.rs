//! Create `product` table.
//!
//! Generic catalog fields plus optional vehicle attributes and image URLs.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(string_len(Product::Title, 255).not_null())
                    .col(text(Product::Description).not_null())
                    .col(decimal_len(Product::Price, 12, 2).not_null())
                    .col(string_len(Product::Sku, 128).unique_key().not_null())
                    .col(string_len_null(Product::Make, 128))
                    .col(string_len_null(Product::Model, 128))
                    .col(integer_null(Product::Year))
                    .col(string_len_null(Product::Brand, 128))
                    .col(string_len_null(Product::CarName, 255))
                    .col(string_len_null(Product::BodyType, 64))
                    .col(string_len_null(Product::Engine, 128))
                    .col(string_len_null(Product::Horsepower, 64))
                    .col(string_len_null(Product::FuelType, 64))
                    .col(string_len_null(Product::FuelCapacity, 64))
                    .col(string_len_null(Product::EngineDisplacement, 64))
                    .col(string_len_null(Product::Rpm, 64))
                    .col(string_len_null(Product::CarPrice, 64))
                    .col(string_len_null(Product::CarLocation, 255))
                    .col(string_len_null(Product::Transmission, 64))
                    .col(string_len_null(Product::Colour, 64))
                    .col(string_len_null(Product::Mileage, 64))
                    .col(
                        ColumnDef::new(Product::Images)
                            .array(ColumnType::Text)
                            .not_null()
                            .default(Expr::cust("'{}'::text[]")),
                    )
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    Title,
    Description,
    Price,
    Sku,
    Make,
    Model,
    Year,
    Brand,
    CarName,
    BodyType,
    Engine,
    Horsepower,
    FuelType,
    FuelCapacity,
    EngineDisplacement,
    Rpm,
    CarPrice,
    CarLocation,
    Transmission,
    Colour,
    Mileage,
    Images,
    CreatedAt,
    UpdatedAt,
}
