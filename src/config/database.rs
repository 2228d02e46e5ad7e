//! Database configuration module for `PTrab Inteligente`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Creation is idempotent and safe to run on every start.

use crate::entities::{ExpenseRecord, Ptrab};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Database used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/ptrab.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// An unset variable falls back to [`DEFAULT_DATABASE_URL`]; a value that is
/// not valid unicode is an error.
pub fn get_database_url() -> Result<String> {
    match std::env::var("DATABASE_URL") {
        Ok(url) => Ok(url),
        Err(std::env::VarError::NotPresent) => Ok(DEFAULT_DATABASE_URL.to_string()),
        Err(e) => Err(e.into()),
    }
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// A local `SQLite` file gets its parent directory created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;

    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }

    info!(url = %database_url, "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Directory holding the file of a `sqlite://` URL, if it has one.
fn sqlite_parent_dir(url: &str) -> Option<&str> {
    let path = url.strip_prefix("sqlite://")?;
    let path = path.split('?').next().unwrap_or(path);
    let (dir, _) = path.rsplit_once('/')?;
    (!dir.is_empty()).then_some(dir)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let name = entity.table_name().to_string();
    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(builder.build(&table)).await?;
    debug!(table = %name, "Table ready");
    Ok(())
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity
/// definitions.
///
/// Plans are created before records so the foreign key has a target.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Ptrab).await?;
    create_table(db, &schema, ExpenseRecord).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ExpenseRecordModel, PtrabModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<PtrabModel> = Ptrab::find().limit(1).all(&db).await?;
        let _: Vec<ExpenseRecordModel> = ExpenseRecord::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_sqlite_parent_dir() {
        assert_eq!(sqlite_parent_dir(DEFAULT_DATABASE_URL), Some("data"));
        assert_eq!(sqlite_parent_dir("sqlite://ptrab.sqlite"), None);
        assert_eq!(sqlite_parent_dir("sqlite::memory:"), None);
        assert_eq!(
            sqlite_parent_dir("sqlite:///var/lib/ptrab/db.sqlite"),
            Some("/var/lib/ptrab")
        );
    }
}
