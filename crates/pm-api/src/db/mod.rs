//! # Database Persistence Layer
//!
//! Postgres persistence for patients and login users via SQLx.
//!
//! The database layer is optional. When `DATABASE_URL` is set, patients and
//! users live in PostgreSQL and email uniqueness is enforced by unique
//! indexes. When absent, the API runs on in-memory stores (development and
//! tests).

pub mod patients;
pub mod users;

use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the connection pool and run migrations.
///
/// Returns `None` if no database URL is configured (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set, running with in-memory stores. \
             Patients and users will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}
