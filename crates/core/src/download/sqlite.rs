use super::store::{DownloadStore, DownloadStoreError};
use super::types::{Download, DownloadStatus, GrabHistory, GrabStatus, NewDownload};
use crate::indexer::ReleaseProtocol;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed download store.
pub struct SqliteDownloadStore {
    conn: Mutex<Connection>,
}

impl SqliteDownloadStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DownloadStoreError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, DownloadStoreError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DownloadStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS downloads (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_id INTEGER,
                client_id TEXT NOT NULL,
                external_job_id TEXT NOT NULL,
                release_title TEXT NOT NULL,
                indexer_id TEXT NOT NULL,
                protocol TEXT NOT NULL,
                status TEXT NOT NULL,
                status_type TEXT NOT NULL,
                progress REAL NOT NULL DEFAULT 0,
                download_path TEXT,
                score INTEGER NOT NULL DEFAULT 0,
                stalled_notified INTEGER NOT NULL DEFAULT 0,
                grabbed_at TEXT NOT NULL,
                last_progress_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_downloads_status_type
                ON downloads(status_type);
            CREATE INDEX IF NOT EXISTS idx_downloads_media
                ON downloads(media_id);

            CREATE TABLE IF NOT EXISTS grab_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_id INTEGER NOT NULL,
                download_id INTEGER,
                release_title TEXT NOT NULL,
                indexer_id TEXT NOT NULL,
                score INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_grab_history_media
                ON grab_history(media_id);
            "#,
        )?;
        Ok(())
    }

    fn row_to_download(row: &Row) -> Result<Download, rusqlite::Error> {
        let protocol: String = row.get("protocol")?;
        let status_json: String = row.get("status")?;
        let grabbed_at: String = row.get("grabbed_at")?;
        let last_progress_at: String = row.get("last_progress_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(Download {
            id: row.get("id")?,
            media_id: row.get("media_id")?,
            client_id: row.get("client_id")?,
            external_job_id: row.get("external_job_id")?,
            release_title: row.get("release_title")?,
            indexer_id: row.get("indexer_id")?,
            protocol: match protocol.as_str() {
                "torrent" => ReleaseProtocol::Torrent,
                "usenet" => ReleaseProtocol::Usenet,
                other => {
                    return Err(rusqlite::Error::InvalidColumnType(
                        0,
                        format!("unknown protocol '{other}'"),
                        rusqlite::types::Type::Text,
                    ))
                }
            },
            status: serde_json::from_str(&status_json).map_err(json_err)?,
            progress: row.get("progress")?,
            download_path: row.get("download_path")?,
            score: row.get("score")?,
            stalled_notified: row.get("stalled_notified")?,
            grabbed_at: parse_rfc3339(&grabbed_at)?,
            last_progress_at: parse_rfc3339(&last_progress_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        })
    }

    fn row_to_grab(row: &Row) -> Result<GrabHistory, rusqlite::Error> {
        let status: String = row.get("status")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(GrabHistory {
            id: row.get("id")?,
            media_id: row.get("media_id")?,
            download_id: row.get("download_id")?,
            release_title: row.get("release_title")?,
            indexer_id: row.get("indexer_id")?,
            score: row.get("score")?,
            size_bytes: row.get::<_, i64>("size_bytes")? as u64,
            status: GrabStatus::parse(&status).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    format!("unknown grab status '{status}'"),
                    rusqlite::types::Type::Text,
                )
            })?,
            created_at: parse_rfc3339(&created_at)?,
            updated_at: parse_rfc3339(&updated_at)?,
        })
    }
}

fn json_err(e: serde_json::Error) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
        })
}

const TERMINAL_TYPES: &str = "('imported', 'failed', 'superseded')";

impl DownloadStore for SqliteDownloadStore {
    fn create_download(&self, new: &NewDownload) -> Result<Download, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let status = DownloadStatus::Downloading;
        let status_json =
            serde_json::to_string(&status).map_err(|e| DownloadStoreError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO downloads
             (media_id, client_id, external_job_id, release_title, indexer_id, protocol,
              status, status_type, progress, score, grabbed_at, last_progress_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?10, ?10)",
            params![
                new.media_id,
                new.client_id,
                new.external_job_id,
                new.release_title,
                new.indexer_id,
                new.protocol.as_str(),
                status_json,
                status.status_type(),
                new.score,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        let download = conn.query_row(
            "SELECT * FROM downloads WHERE id = ?1",
            params![id],
            Self::row_to_download,
        )?;
        Ok(download)
    }

    fn get_download(&self, id: i64) -> Result<Option<Download>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let download = conn
            .query_row(
                "SELECT * FROM downloads WHERE id = ?1",
                params![id],
                Self::row_to_download,
            )
            .optional()?;
        Ok(download)
    }

    fn list_downloads(
        &self,
        status_type: Option<&str>,
    ) -> Result<Vec<Download>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let (sql, filter) = match status_type {
            Some(t) => (
                "SELECT * FROM downloads WHERE status_type = ?1 ORDER BY grabbed_at DESC",
                Some(t),
            ),
            None => ("SELECT * FROM downloads ORDER BY grabbed_at DESC", None),
        };
        let mut stmt = conn.prepare(sql)?;
        let downloads = match filter {
            Some(t) => stmt
                .query_map(params![t], Self::row_to_download)?
                .collect::<Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], Self::row_to_download)?
                .collect::<Result<Vec<_>, _>>()?,
        };
        Ok(downloads)
    }

    fn active_downloads(&self) -> Result<Vec<Download>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM downloads WHERE status_type NOT IN {TERMINAL_TYPES} ORDER BY id"
        ))?;
        let downloads = stmt
            .query_map([], Self::row_to_download)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(downloads)
    }

    fn has_active_for_media(&self, media_id: i64) -> Result<bool, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM downloads
                 WHERE media_id = ?1 AND status_type NOT IN {TERMINAL_TYPES}"
            ),
            params![media_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn active_for_media(&self, media_id: i64) -> Result<Vec<Download>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM downloads
             WHERE media_id = ?1 AND status_type NOT IN {TERMINAL_TYPES}
             ORDER BY id"
        ))?;
        let downloads = stmt
            .query_map(params![media_id], Self::row_to_download)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(downloads)
    }

    fn update_progress(&self, id: i64, progress: f64) -> Result<(), DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        let changed = conn.execute(
            "UPDATE downloads SET
                last_progress_at = CASE WHEN ?1 > progress THEN ?2 ELSE last_progress_at END,
                progress = ?1,
                updated_at = ?2
             WHERE id = ?3",
            params![progress, now, id],
        )?;
        if changed == 0 {
            return Err(DownloadStoreError::NotFound(id));
        }
        Ok(())
    }

    fn set_download_path(&self, id: i64, path: &str) -> Result<(), DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE downloads SET download_path = ?1, updated_at = ?2 WHERE id = ?3",
            params![path, Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(DownloadStoreError::NotFound(id));
        }
        Ok(())
    }

    fn transition(&self, id: i64, status: &DownloadStatus) -> Result<(), DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let status_json = serde_json::to_string(status)
            .map_err(|e| DownloadStoreError::Database(e.to_string()))?;
        let changed = conn.execute(
            "UPDATE downloads SET status = ?1, status_type = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                status_json,
                status.status_type(),
                Utc::now().to_rfc3339(),
                id
            ],
        )?;
        if changed == 0 {
            return Err(DownloadStoreError::NotFound(id));
        }
        Ok(())
    }

    fn mark_stalled_notified(&self, id: i64) -> Result<(), DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE downloads SET stalled_notified = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn failed_count_for_media(&self, media_id: i64) -> Result<u32, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM downloads
             WHERE media_id = ?1 AND status_type = 'failed'",
            params![media_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_stalled(
        &self,
        now: DateTime<Utc>,
        timeout_secs: u64,
    ) -> Result<Vec<Download>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (now - Duration::seconds(timeout_secs as i64)).to_rfc3339();
        let mut stmt = conn.prepare(
            "SELECT * FROM downloads
             WHERE status_type = 'downloading' AND last_progress_at <= ?1
             ORDER BY id",
        )?;
        let downloads = stmt
            .query_map(params![cutoff], Self::row_to_download)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(downloads)
    }

    fn add_grab(
        &self,
        media_id: i64,
        download_id: Option<i64>,
        release_title: &str,
        indexer_id: &str,
        score: i64,
        size_bytes: u64,
    ) -> Result<GrabHistory, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO grab_history
             (media_id, download_id, release_title, indexer_id, score, size_bytes,
              status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'grabbed', ?7, ?7)",
            params![
                media_id,
                download_id,
                release_title,
                indexer_id,
                score,
                size_bytes as i64,
                now
            ],
        )?;
        let id = conn.last_insert_rowid();
        let grab = conn.query_row(
            "SELECT * FROM grab_history WHERE id = ?1",
            params![id],
            Self::row_to_grab,
        )?;
        Ok(grab)
    }

    fn set_grab_status(
        &self,
        download_id: i64,
        status: GrabStatus,
    ) -> Result<(), DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE grab_history SET status = ?1, updated_at = ?2 WHERE download_id = ?3",
            params![status.as_str(), Utc::now().to_rfc3339(), download_id],
        )?;
        Ok(())
    }

    fn grabs_for_media(&self, media_id: i64) -> Result<Vec<GrabHistory>, DownloadStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM grab_history WHERE media_id = ?1 ORDER BY id")?;
        let grabs = stmt
            .query_map(params![media_id], Self::row_to_grab)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grabs)
    }
}
