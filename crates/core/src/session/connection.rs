//! Opening the session database.
//!
//! A `SessionDb` owns one SQLite connection in WAL mode with the sessions
//! schema applied, plus the lifetime granted to every saved session.

use super::migrations;
use crate::Error;
use chrono::Duration;
use std::path::Path;
use tokio_rusqlite::Connection;

const PRAGMAS: &str = "PRAGMA journal_mode=WAL;
     PRAGMA synchronous=NORMAL;
     PRAGMA temp_store=MEMORY;";

/// Session database handle. Cloning shares the connection.
#[derive(Clone, Debug)]
pub struct SessionDb {
    pub(crate) conn: Connection,
    pub(crate) ttl: Duration,
}

/// Convert a configured lifetime into a chrono duration.
fn session_ttl(ttl_secs: i64) -> Result<Duration, Error> {
    Duration::try_seconds(ttl_secs)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or_else(|| Error::InvalidInput(format!("session ttl out of range: {ttl_secs}s")))
}

impl SessionDb {
    /// Open (or create) the session database at `path`.
    ///
    /// Saved sessions expire `ttl_secs` after their last write.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidInput` if `ttl_secs` is not a positive, representable lifetime
    /// - `Error::Database` / `Error::MigrationFailed` if the file cannot be prepared
    pub async fn open(path: impl AsRef<Path>, ttl_secs: i64) -> Result<Self, Error> {
        let ttl = session_ttl(ttl_secs)?;
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, ttl).await
    }

    /// Open a throwaway in-memory database.
    pub async fn open_in_memory(ttl_secs: i64) -> Result<Self, Error> {
        let ttl = session_ttl(ttl_secs)?;
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::init(conn, ttl).await
    }

    async fn init(conn: Connection, ttl: Duration) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(PRAGMAS)?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn, ttl })
    }
}
