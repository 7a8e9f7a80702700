use crate::domain::error::{AppError, Result};
use crate::infrastructure::storage::ensure_parent_dir;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const SCHEMA: &str = include_str!("../../../resources/schema.sql");

const SCHEMA_VERSION: i32 = 1;

/// Opens the pool, applies the embedded schema and checks the connection.
pub async fn init_db(database_url: &str) -> Result<SqlitePool> {
    let pool = connect_pool(database_url).await?;

    let current_version = read_user_version(&pool).await?;
    if current_version > SCHEMA_VERSION {
        return Err(AppError::DatabaseError(format!(
            "Database schema too new: db user_version={} > supported_version={}",
            current_version, SCHEMA_VERSION
        )));
    }

    apply_schema(&pool).await?;
    set_user_version(&pool, SCHEMA_VERSION).await?;

    sqlx::query("SELECT 1")
        .execute(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Database health check failed: {e}")))?;

    Ok(pool)
}

pub async fn connect_pool(database_url: &str) -> Result<SqlitePool> {
    let in_memory = is_in_memory(database_url);
    if !in_memory {
        if let Some(path) = database_file(database_url) {
            ensure_parent_dir(Path::new(path))?;
        }
    }

    let mut options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse database URL: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    if !in_memory {
        options = options
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
    }

    // Every connection to ":memory:" opens its own database.
    let max_connections = if in_memory { 1 } else { 4 };

    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }

    pool_options
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to connect to database: {e}")))
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn database_file(database_url: &str) -> Option<&str> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA.split(';') {
        let stmt = statement.trim();
        if stmt.is_empty() {
            continue;
        }
        sqlx::query(stmt)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to apply schema statement: {e}")))?;
    }
    Ok(())
}

async fn read_user_version(pool: &SqlitePool) -> Result<i32> {
    let row = sqlx::query("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to read user_version: {e}")))?;
    Ok(row.get::<i32, _>(0))
}

async fn set_user_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to set user_version: {e}")))?;
    Ok(())
}
