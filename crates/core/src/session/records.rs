//! Session load/save operations.

use super::connection::SessionDb;
use super::{SessionContext, hash::session_key};
use crate::Error;
use crate::pages::PageStore;
use chrono::Utc;
use tokio_rusqlite::params;

impl SessionDb {
    /// Load the context for a session id.
    ///
    /// Unknown or expired sessions yield a fresh, empty context. Stored state
    /// that no longer decodes is discarded the same way.
    pub async fn load(&self, session_id: &str) -> Result<SessionContext, Error> {
        let key_hash = session_key(session_id);
        let now = Utc::now().to_rfc3339();

        let stored = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let mut stmt = conn.prepare("SELECT pages_json FROM sessions WHERE key_hash = ?1 AND expires_at > ?2")?;

                match stmt.query_row(params![key_hash, now], |row| row.get(0)) {
                    Ok(json) => Ok(Some(json)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some(json) = stored else {
            return Ok(SessionContext::new(session_id));
        };

        match serde_json::from_str::<PageStore>(&json) {
            Ok(pages) => Ok(SessionContext::with_pages(session_id, pages)),
            Err(e) => {
                tracing::warn!(error = %e, "discarding undecodable session state");
                Ok(SessionContext::new(session_id))
            }
        }
    }

    /// Write a context back, refreshing its expiry.
    ///
    /// Uses UPSERT semantics keyed by the hashed session id.
    pub async fn save(&self, ctx: &SessionContext) -> Result<(), Error> {
        let key_hash = session_key(ctx.session_id());
        let pages_json = serde_json::to_string(ctx.pages())?;

        let now = Utc::now();
        let updated_at = now.to_rfc3339();
        let expires_at = (now + self.ttl).to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO sessions (key_hash, pages_json, updated_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        pages_json = excluded.pages_json,
                        updated_at = excluded.updated_at,
                        expires_at = excluded.expires_at",
                    params![key_hash, pages_json, updated_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a session. Returns whether a row was deleted.
    pub async fn delete(&self, session_id: &str) -> Result<bool, Error> {
        let key_hash = session_key(session_id);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM sessions WHERE key_hash = ?1", params![key_hash])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired sessions.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
