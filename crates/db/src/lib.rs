//! Postgres persistence for the analysis pipeline.
//!
//! Repositories are zero-sized structs of static async methods over a
//! `&PgPool`, returning `sqlx::Error`; [`PgStore`] wraps them behind
//! the `mealscan-core` ports and owns the error translation into
//! `CoreError`.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod models;
pub mod repositories;
pub mod store;

pub use store::PgStore;

/// Connect a pool to the given database URL.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Apply all pending migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Cheap connectivity probe for startup and liveness checks.
pub async fn health_check(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
