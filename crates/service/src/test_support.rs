#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::{connect_with_config, DatabaseConfig, DATABASE_URL};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// DB-backed tests are skipped when `SKIP_DB_TESTS` is set or no database is configured.
pub fn skip_db() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

fn test_config() -> DatabaseConfig {
    DatabaseConfig {
        url: DATABASE_URL.clone(),
        max_connections: 20,
        min_connections: 1,
        acquire_timeout_secs: 10,
        ..DatabaseConfig::default()
    }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    // Run migrations exactly once, with a throwaway connection
    MIGRATED
        .get_or_try_init(|| async {
            let db = connect_with_config(&test_config()).await?;
            migration::Migrator::up(&db, None).await?;
            drop(db);
            Ok::<(), anyhow::Error>(())
        })
        .await?;

    // Return a fresh connection for the current test's runtime
    connect_with_config(&test_config()).await
}

/// Unique suffix so parallel tests never collide on unique columns.
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Insert a customer with no credentials.
pub async fn make_user(db: &DatabaseConnection) -> Result<models::user::Model, anyhow::Error> {
    let email = format!("{}@example.com", unique("user"));
    Ok(models::user::create(db, &email, "Test User", &[]).await?)
}

/// Insert a product priced at `price`.
pub async fn make_product(db: &DatabaseConnection, price: &str) -> Result<models::product::Model, anyhow::Error> {
    use std::str::FromStr;
    let input = crate::products::ProductInput {
        title: "Brake pad".into(),
        description: "Front brake pad set".into(),
        price: rust_decimal::Decimal::from_str(price)?,
        sku: unique("SKU"),
        make: Some("Toyota".into()),
        model: Some("Corolla".into()),
        year: Some(2018),
        ..Default::default()
    };
    Ok(crate::products::create(db, input).await?)
}
