pub mod memory;
pub mod repository;

pub mod connection {
    use std::time::Duration;

    pub async fn create_sqlx_pool(
        database_url: &str,
        max_connections: u32,
    ) -> Result<sqlx::PgPool, sqlx::Error> {
        sqlx::postgres::PgPoolOptions::new()
            .min_connections(1)
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_millis(1000))
            .idle_timeout(Duration::from_millis(1000 * 30))
            .max_lifetime(Duration::from_millis(1000 * 60 * 30))
            .connect(database_url)
            .await
    }
}

pub mod schema {
    use sqlx::PgPool;

    use crate::error::persistence::PersistenceError;

    pub const SCHEMA: &str = include_str!("../../dbschema.sql");

    /// Applies every statement of the schema file in a single transaction.
    /// Statements are idempotent, so running it on every start is safe.
    pub async fn migrate(pool: &PgPool) -> Result<(), PersistenceError> {
        let mut trx = pool.begin().await?;
        for sttm in SCHEMA.split(';').filter(|sttm| !sttm.trim().is_empty()) {
            sqlx::query(sttm).execute(&mut trx).await?;
        }
        trx.commit().await?;

        tracing::info!("database schema applied");
        Ok(())
    }

    /// Drops the schema with every table in it.
    pub async fn drop(pool: &PgPool) -> Result<(), PersistenceError> {
        sqlx::query("DROP SCHEMA IF EXISTS registry CASCADE")
            .execute(pool)
            .await?;
        Ok(())
    }
}
