//! PostgreSQL persistence
//!
//! [`Database`] wraps a connection pool. Queries are grouped per entity in the
//! submodules, each adding methods to `Database`.

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::{config::DatabaseConfig, errors::FleetError};

mod alarms;
mod devices;
mod licenses;
mod maintenance;
mod movements;
mod routes;
mod users;
mod vehicle_items;
mod vehicles;
mod work_orders;

#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to the configured database and run pending migrations
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, FleetError> {
        config.validate()?;
        info!(
            "Connecting to database: max_connections={}, acquire_timeout={:?}",
            config.max_connections, config.acquire_timeout
        );

        let pool = match Self::pool_options(config).connect(&config.url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to connect to database: {}", e);
                return Err(e.into());
            }
        };

        Self::new(pool).await
    }

    /// Database on a pool that connects on first use, migrations not run
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, FleetError> {
        config.validate()?;
        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, running pending migrations
    pub async fn new(pool: PgPool) -> Result<Self, FleetError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Database migrations applied");
        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check that the database answers
    pub async fn ping(&self) -> Result<(), FleetError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `rows_affected` of a DELETE into `NotFound` when nothing was removed
fn deleted(
    result: sqlx::postgres::PgQueryResult,
    entity: &'static str,
    key: impl ToString,
) -> Result<(), FleetError> {
    if result.rows_affected() == 0 {
        return Err(FleetError::not_found(entity, key));
    }
    Ok(())
}
