//! Torrent record CRUD operations.

use crate::error::DatabaseError;
use crate::types::TorrentId;
use crate::{Error, Result};
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, NewTorrent, Torrent, TorrentRow, TorrentUpdate};

const TORRENT_COLUMNS: &str = r#"
    id, filename, hash, bytes, host, split, progress, status,
    added_at, ended_at, links, mirror_available, mirror_available_at
"#;

fn query_error(action: &str, e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return Error::Database(DatabaseError::ConstraintViolation(format!(
            "Failed to {}: {}",
            action, e
        )));
    }
    Error::Database(DatabaseError::QueryFailed(format!(
        "Failed to {}: {}",
        action, e
    )))
}

impl Database {
    /// Insert a new torrent record
    ///
    /// Size, split and progress start at zero and the link list starts empty;
    /// the reconciler fills them in from the debrid service.
    pub async fn insert_torrent(&self, torrent: &NewTorrent) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO torrents (
                id, filename, hash, bytes, host, split, progress, status,
                added_at, links, mirror_available
            ) VALUES (?, ?, ?, 0, ?, 0, 0, ?, ?, '[]', 0)
            "#,
        )
        .bind(&torrent.id)
        .bind(&torrent.filename)
        .bind(&torrent.hash)
        .bind(&torrent.host)
        .bind(&torrent.status)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("insert torrent", e))?;

        Ok(())
    }

    /// Get a torrent by ID
    pub async fn get_torrent(&self, id: &TorrentId) -> Result<Option<Torrent>> {
        let row = sqlx::query_as::<_, TorrentRow>(&format!(
            "SELECT {} FROM torrents WHERE id = ?",
            TORRENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get torrent", e))?;

        Ok(row.map(Torrent::from))
    }

    /// List all torrents, most recently added first
    pub async fn list_torrents(&self) -> Result<Vec<Torrent>> {
        let rows = sqlx::query_as::<_, TorrentRow>(&format!(
            "SELECT {} FROM torrents ORDER BY added_at DESC, rowid DESC",
            TORRENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list torrents", e))?;

        Ok(rows.into_iter().map(Torrent::from).collect())
    }

    /// Apply a partial update in a single transaction
    ///
    /// Returns `false` when no row matched, which happens when the record was
    /// deleted after it was read. The row is never recreated.
    pub async fn update_torrent(&self, id: &TorrentId, update: &TorrentUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(self.get_torrent(id).await?.is_some());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE torrents SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(filename) = &update.filename {
                fields.push("filename = ");
                fields.push_bind_unseparated(filename.clone());
            }
            if let Some(hash) = &update.hash {
                fields.push("hash = ");
                fields.push_bind_unseparated(hash.clone());
            }
            if let Some(bytes) = update.bytes {
                fields.push("bytes = ");
                fields.push_bind_unseparated(bytes);
            }
            if let Some(host) = &update.host {
                fields.push("host = ");
                fields.push_bind_unseparated(host.clone());
            }
            if let Some(split) = update.split {
                fields.push("split = ");
                fields.push_bind_unseparated(split);
            }
            if let Some(progress) = update.progress {
                fields.push("progress = ");
                fields.push_bind_unseparated(progress);
            }
            if let Some(status) = &update.status {
                fields.push("status = ");
                fields.push_bind_unseparated(status.clone());
            }
            if let Some(links) = &update.links {
                fields.push("links = ");
                fields.push_bind_unseparated(serde_json::to_string(links)?);
            }
            if let Some(ended_at) = update.ended_at {
                fields.push("ended_at = ");
                fields.push_bind_unseparated(ended_at);
            }
            if let Some(available_at) = update.mirror_available_at {
                fields.push("mirror_available = 1");
                fields.push("mirror_available_at = ");
                fields.push_bind_unseparated(available_at);
            }
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id.clone());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| query_error("begin torrent update", e))?;

        let result = builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| query_error("update torrent", e))?;

        tx.commit()
            .await
            .map_err(|e| query_error("commit torrent update", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a torrent record
    ///
    /// Returns `false` when no record with this ID exists.
    pub async fn delete_torrent(&self, id: &TorrentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM torrents WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("delete torrent", e))?;

        Ok(result.rows_affected() > 0)
    }

    /// Count stored torrent records
    pub async fn count_torrents(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM torrents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error("count torrents", e))?;

        Ok(count)
    }
}
