/// Database connection tests
pub mod db_tests;

/// CRUD and transaction tests for the shop entities
pub mod crud_tests;

use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// DB tests are opt-out via `SKIP_DB_TESTS` and need `DATABASE_URL`.
pub(crate) fn skip_db() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok() || std::env::var("DATABASE_URL").is_err()
}

pub(crate) async fn setup_test_db() -> Result<DatabaseConnection> {
    MIGRATED
        .get_or_try_init(|| async {
            let db = crate::db::connect().await?;
            migration::Migrator::up(&db, None).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await?;
    crate::db::connect().await
}
