//! Database pool setup.
//!
//! Postgres in deployment, SQLite for local runs and tests. Connecting is
//! retried with exponential backoff so the service can start before its
//! database does.

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::AppConfig;

const CONNECT_ATTEMPTS: u32 = 5;
const FIRST_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to connect to database after {attempts} attempts: {source}")]
    ConnectionFailed {
        attempts: u32,
        #[source]
        source: sea_orm::DbErr,
    },
    #[error("invalid database configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("database health check failed: {0}")]
    Unhealthy(#[from] sea_orm::DbErr),
}

fn is_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:")
}

fn connect_options(cfg: &AppConfig) -> ConnectOptions {
    let mut opt = ConnectOptions::new(&cfg.database_url);
    // Each in-memory SQLite connection is its own database.
    let max_connections = if is_sqlite(&cfg.database_url) && cfg.database_url.contains(":memory:") {
        1
    } else {
        cfg.db_max_connections
    };
    opt.max_connections(max_connections)
        .acquire_timeout(Duration::from_millis(cfg.db_acquire_timeout_ms))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);
    opt
}

/// Open the pool described by `cfg`.
///
/// SQLite connections get `PRAGMA foreign_keys = ON` so client deletes
/// cascade the same way they do on Postgres.
///
/// ```no_run
/// use beacon::{config::AppConfig, db::init_pool};
///
/// #[tokio::main]
/// async fn main() -> Result<(), beacon::db::DatabaseError> {
///     let db = init_pool(&AppConfig::default()).await?;
///     Ok(())
/// }
/// ```
pub async fn init_pool(cfg: &AppConfig) -> Result<DatabaseConnection, DatabaseError> {
    if cfg.database_url.trim().is_empty() {
        return Err(DatabaseError::InvalidConfiguration {
            message: "BEACON_DATABASE_URL cannot be empty".to_string(),
        });
    }

    let opt = connect_options(cfg);
    let mut delay = FIRST_RETRY_DELAY;
    let mut attempt = 1;
    let db = loop {
        match Database::connect(opt.clone()).await {
            Ok(db) => break db,
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                tracing::error!(attempts = attempt, error = %source, "Giving up on database connection");
                return Err(DatabaseError::ConnectionFailed {
                    attempts: attempt,
                    source,
                });
            }
            Err(error) => {
                tracing::warn!(
                    attempt,
                    retry_in_ms = delay.as_millis() as u64,
                    error = %error,
                    "Database connection failed, retrying"
                );
                sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
        }
    };

    if db.get_database_backend() == DbBackend::Sqlite {
        db.execute(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA foreign_keys = ON".to_string(),
        ))
        .await?;
    }

    tracing::info!(attempt, backend = ?db.get_database_backend(), "Connected to database");
    Ok(db)
}

/// Run `SELECT 1` against the pool
pub async fn health_check(db: &DatabaseConnection) -> Result<(), DatabaseError> {
    db.query_one(Statement::from_string(
        db.get_database_backend(),
        "SELECT 1".to_string(),
    ))
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_url_is_a_configuration_error() {
        let config = AppConfig {
            database_url: "  ".to_string(),
            ..AppConfig::default()
        };

        assert!(matches!(
            init_pool(&config).await,
            Err(DatabaseError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn in_memory_sqlite_uses_a_single_connection() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 10,
            ..AppConfig::default()
        };
        assert_eq!(connect_options(&config).get_max_connections(), Some(1));

        let postgres = AppConfig {
            database_url: "postgres://beacon@localhost/beacon".to_string(),
            db_max_connections: 10,
            ..AppConfig::default()
        };
        assert_eq!(connect_options(&postgres).get_max_connections(), Some(10));
    }

    #[tokio::test]
    async fn sqlite_pool_is_healthy_with_foreign_keys_on() {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            ..AppConfig::default()
        };
        let db = init_pool(&config).await.unwrap();
        assert!(health_check(&db).await.is_ok());

        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "PRAGMA foreign_keys".to_string(),
            ))
            .await
            .unwrap()
            .unwrap();
        let enabled: i32 = row.try_get_by_index(0).unwrap();
        assert_eq!(enabled, 1);
    }
}
