//! Common test utilities
//!
//! Integration tests need a reachable MySQL server. Point
//! `TEST_DATABASE_URL` (or `DATABASE_URL`) at one; each call to
//! `get_test_pool` creates a throwaway database so tests stay isolated.

use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::sync::Once;
use std::time::Duration;

static ENV_INIT: Once = Once::new();

fn init_env() {
    ENV_INIT.call_once(|| {
        let _ = dotenvy::dotenv();
    });
}

/// Connect to the test server and create a fresh, uniquely named database.
pub async fn get_test_pool() -> Result<MySqlPool, sqlx::Error> {
    init_env();

    let base_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| {
            sqlx::Error::Configuration("TEST_DATABASE_URL or DATABASE_URL must be set".into())
        })?;

    let admin_pool = MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&base_url)
        .await?;

    let db_name = format!("tessera_test_{}", uuid::Uuid::new_v4().simple());
    sqlx::query(&format!("CREATE DATABASE {}", db_name))
        .execute(&admin_pool)
        .await?;

    let mut db_url = url::Url::parse(&base_url)
        .map_err(|e| sqlx::Error::Configuration(e.to_string().into()))?;
    db_url.set_path(&format!("/{}", db_name));

    MySqlPoolOptions::new()
        .max_connections(5)
        .connect(db_url.as_str())
        .await
}

/// Run migrations on the test database.
pub async fn setup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Remove all rows, child tables first.
#[allow(dead_code)]
pub async fn cleanup_database(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM users").execute(pool).await?;
    sqlx::query("DELETE FROM tenants").execute(pool).await?;
    sqlx::query("DELETE FROM clients").execute(pool).await?;
    Ok(())
}
