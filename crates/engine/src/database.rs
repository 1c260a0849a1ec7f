//! SQLite connection pool used by the engine.
//!
//! File databases run in WAL mode with several pooled connections: readers
//! never wait on a writer, and a writer waits up to [`BUSY_TIMEOUT`] for the
//! database write lock held by another book's transaction. An in-memory
//! database lives inside a single connection, so its pool is pinned to one.

use std::{path::PathBuf, time::Duration};

use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, sqlx::sqlite::SqliteJournalMode,
};

use crate::ResultEngine;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// How long a writer waits for the database write lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Storage {
    Memory,
    File(PathBuf),
}

impl Storage {
    pub fn url(&self) -> String {
        match self {
            Self::Memory => "sqlite::memory:".to_string(),
            Self::File(path) => format!("sqlite:{}?mode=rwc", path.display()),
        }
    }
}

pub fn connect_options(storage: &Storage, max_connections: u32) -> ConnectOptions {
    let mut options = ConnectOptions::new(storage.url());
    match storage {
        Storage::Memory => {
            options.max_connections(1);
        }
        Storage::File(_) => {
            options
                .max_connections(max_connections.max(2))
                .map_sqlx_sqlite_opts(|opts| {
                    opts.journal_mode(SqliteJournalMode::Wal)
                        .busy_timeout(BUSY_TIMEOUT)
                });
        }
    }
    options.sqlx_logging(false);
    options
}

pub async fn connect(storage: &Storage, max_connections: u32) -> ResultEngine<DatabaseConnection> {
    let options = connect_options(storage, max_connections);
    let max_connections = options.get_max_connections().unwrap_or(1);
    let db = Database::connect(options).await?;
    tracing::info!(url = %storage.url(), max_connections, "database connected");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_is_pinned_to_one_connection() {
        let options = connect_options(&Storage::Memory, 16);
        assert_eq!(options.get_max_connections(), Some(1));
    }

    #[test]
    fn files_get_a_real_pool() {
        let storage = Storage::File(PathBuf::from("/tmp/tally.db"));
        assert_eq!(storage.url(), "sqlite:/tmp/tally.db?mode=rwc");
        assert_eq!(connect_options(&storage, 16).get_max_connections(), Some(16));
        assert_eq!(connect_options(&storage, 1).get_max_connections(), Some(2));
    }
}
