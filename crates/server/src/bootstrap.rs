use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use tiffin_core::config::{AppConfig, ConfigError, LoadOptions};
use tiffin_db::{connect, migrations, DbPool, SqlOrderStore};
use tiffin_dialog::IntentDispatcher;

use crate::agent::OrderAgent;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<IntentDispatcher<OrderAgent>>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let store = Arc::new(SqlOrderStore::new(db_pool.clone()));
    let dispatcher = Arc::new(IntentDispatcher::new(OrderAgent::new(store)));

    Ok(Application { config, db_pool, dispatcher })
}
