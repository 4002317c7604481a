//! Sessions schema versions.
//!
//! `_migrations` records which schema versions are applied. Version 1
//! creates the `sessions` table (hashed key, serialized page store,
//! write and expiry timestamps) and the expiry index used by the purge.

use crate::Error;
use tokio_rusqlite::{Connection, params};

/// Schema versions in application order.
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../../migrations/001_sessions.sql"))];

/// Bring the sessions schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )?;

        let current: i64 = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;

        for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
            tracing::debug!(version, "applying sessions schema version");
            conn.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
            conn.execute(
                "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
                params![version, chrono::Utc::now().to_rfc3339()],
            )?;
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
