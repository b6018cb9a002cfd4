use super::types::{ImportError, ImportHistory};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

/// Storage for import history.
pub trait ImportStore: Send + Sync {
    fn record(
        &self,
        download_id: i64,
        media_id: i64,
        source_path: &str,
        dest_path: &str,
        success: bool,
        error: Option<&str>,
    ) -> Result<ImportHistory, ImportError>;

    fn list_for_media(&self, media_id: i64) -> Result<Vec<ImportHistory>, ImportError>;

    fn list_recent(&self, limit: u32) -> Result<Vec<ImportHistory>, ImportError>;
}

/// SQLite-backed import history store.
pub struct SqliteImportStore {
    conn: Mutex<Connection>,
}

impl SqliteImportStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, ImportError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ImportError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS import_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                download_id INTEGER NOT NULL,
                media_id INTEGER NOT NULL,
                source_path TEXT NOT NULL,
                dest_path TEXT NOT NULL,
                success INTEGER NOT NULL,
                error TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_import_history_media
                ON import_history(media_id);
            "#,
        )?;
        Ok(())
    }

    fn row_to_history(row: &Row) -> Result<ImportHistory, rusqlite::Error> {
        let created_at: String = row.get("created_at")?;
        Ok(ImportHistory {
            id: row.get("id")?,
            download_id: row.get("download_id")?,
            media_id: row.get("media_id")?,
            source_path: row.get("source_path")?,
            dest_path: row.get("dest_path")?,
            success: row.get("success")?,
            error: row.get("error")?,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        e.to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?,
        })
    }
}

impl ImportStore for SqliteImportStore {
    fn record(
        &self,
        download_id: i64,
        media_id: i64,
        source_path: &str,
        dest_path: &str,
        success: bool,
        error: Option<&str>,
    ) -> Result<ImportHistory, ImportError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO import_history
             (download_id, media_id, source_path, dest_path, success, error, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                download_id,
                media_id,
                source_path,
                dest_path,
                success,
                error,
                Utc::now().to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();
        let history = conn.query_row(
            "SELECT * FROM import_history WHERE id = ?1",
            params![id],
            Self::row_to_history,
        )?;
        Ok(history)
    }

    fn list_for_media(&self, media_id: i64) -> Result<Vec<ImportHistory>, ImportError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM import_history WHERE media_id = ?1 ORDER BY id")?;
        let history = stmt
            .query_map(params![media_id], Self::row_to_history)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }

    fn list_recent(&self, limit: u32) -> Result<Vec<ImportHistory>, ImportError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM import_history ORDER BY id DESC LIMIT ?1")?;
        let history = stmt
            .query_map(params![limit], Self::row_to_history)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }
}
