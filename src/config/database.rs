//! Database configuration module for `EcoTrade`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Creation is idempotent (`IF NOT EXISTS`).

use crate::config::marketplace::DatabaseConfig;
use crate::entities::{Account, Credit, SystemState, Trade};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::debug;

/// Used when neither `DATABASE_URL` nor config.toml names a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ecotrade.sqlite?mode=rwc";

/// Resolves the database URL.
///
/// `DATABASE_URL` in the environment wins, then the `[database] url` from
/// config.toml, then [`DEFAULT_DATABASE_URL`].
///
/// # Errors
/// Returns `Error::EnvVar` if `DATABASE_URL` is set but not valid unicode.
pub fn get_database_url(config: &DatabaseConfig) -> Result<String> {
    let from_env = match std::env::var("DATABASE_URL") {
        Ok(url) => Some(url),
        Err(std::env::VarError::NotPresent) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(from_env
        .or_else(|| config.url.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()))
}

/// Establishes a connection to the database at `database_url`.
///
/// For file-backed `SQLite` urls the parent directory is created first.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    if let Some(dir) = sqlite_parent_dir(database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Directory holding the `SQLite` file named by `database_url`, if any.
fn sqlite_parent_dir(database_url: &str) -> Option<&std::path::Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    std::path::Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Creates all tables from the entity definitions.
///
/// Accounts come before credits and credits before trades so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables = [
        schema.create_table_from_entity(Account),
        schema.create_table_from_entity(Credit),
        schema.create_table_from_entity(Trade),
        schema.create_table_from_entity(SystemState),
    ];

    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    Ok(())
}
