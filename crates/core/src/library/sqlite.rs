use super::store::{LibraryError, LibraryStore};
use super::types::{MediaItem, MediaQualityOverride, MediaQualityStatus, MediaSpec};
use crate::quality::{MediaType, QualityAttrs};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed library store.
pub struct SqliteLibraryStore {
    conn: Mutex<Connection>,
}

impl SqliteLibraryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LibraryError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, LibraryError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), LibraryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                year INTEGER,
                media_type TEXT NOT NULL,
                library_id INTEGER NOT NULL,
                monitored INTEGER NOT NULL DEFAULT 1,
                added_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS media_quality_status (
                media_id INTEGER PRIMARY KEY REFERENCES media_items(id) ON DELETE CASCADE,
                attrs TEXT,
                target_met INTEGER NOT NULL DEFAULT 0,
                upgrade_available INTEGER NOT NULL DEFAULT 0,
                last_search_at TEXT,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS media_quality_override (
                media_id INTEGER PRIMARY KEY REFERENCES media_items(id) ON DELETE CASCADE,
                preset_id INTEGER,
                monitored INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    fn row_to_media(row: &Row) -> Result<MediaItem, rusqlite::Error> {
        let media_type: String = row.get("media_type")?;
        let added_at: String = row.get("added_at")?;
        Ok(MediaItem {
            id: row.get("id")?,
            title: row.get("title")?,
            year: row.get("year")?,
            media_type: parse_media_type(&media_type)?,
            library_id: row.get("library_id")?,
            monitored: row.get("monitored")?,
            added_at: parse_rfc3339(&added_at)?,
        })
    }

    fn row_to_status(row: &Row) -> Result<MediaQualityStatus, rusqlite::Error> {
        let attrs_json: Option<String> = row.get("attrs")?;
        let last_search_at: Option<String> = row.get("last_search_at")?;
        let updated_at: String = row.get("updated_at")?;
        Ok(MediaQualityStatus {
            media_id: row.get("media_id")?,
            attrs: match attrs_json {
                Some(json) => Some(serde_json::from_str(&json).map_err(|e| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        e.to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?),
                None => None,
            },
            target_met: row.get("target_met")?,
            upgrade_available: row.get("upgrade_available")?,
            last_search_at: last_search_at.as_deref().map(parse_rfc3339).transpose()?,
            updated_at: parse_rfc3339(&updated_at)?,
        })
    }

    fn due_query(
        &self,
        target_met: bool,
        now: DateTime<Utc>,
        backoff_hours: u32,
    ) -> Result<Vec<MediaItem>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let cutoff = (now - Duration::hours(backoff_hours as i64)).to_rfc3339();
        let mut stmt = conn.prepare(
            "SELECT m.* FROM media_items m
             LEFT JOIN media_quality_status s ON s.media_id = m.id
             LEFT JOIN media_quality_override o ON o.media_id = m.id
             WHERE COALESCE(o.monitored, m.monitored) = 1
               AND COALESCE(s.target_met, 0) = ?1
               AND (s.last_search_at IS NULL OR s.last_search_at <= ?2)
             ORDER BY m.id",
        )?;
        let items = stmt
            .query_map(params![target_met, cutoff], Self::row_to_media)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn parse_media_type(s: &str) -> Result<MediaType, rusqlite::Error> {
    match s {
        "movie" => Ok(MediaType::Movie),
        "tv" => Ok(MediaType::Tv),
        "anime" => Ok(MediaType::Anime),
        other => Err(rusqlite::Error::InvalidColumnType(
            0,
            format!("unknown media type '{other}'"),
            rusqlite::types::Type::Text,
        )),
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
        })
}

impl LibraryStore for SqliteLibraryStore {
    fn add_media(&self, spec: &MediaSpec) -> Result<MediaItem, LibraryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO media_items (title, year, media_type, library_id, monitored, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                spec.title,
                spec.year,
                spec.media_type.as_str(),
                spec.library_id,
                spec.monitored,
                Utc::now().to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();
        let item = conn.query_row(
            "SELECT * FROM media_items WHERE id = ?1",
            params![id],
            Self::row_to_media,
        )?;
        Ok(item)
    }

    fn get_media(&self, id: i64) -> Result<Option<MediaItem>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let item = conn
            .query_row(
                "SELECT * FROM media_items WHERE id = ?1",
                params![id],
                Self::row_to_media,
            )
            .optional()?;
        Ok(item)
    }

    fn list_media(&self) -> Result<Vec<MediaItem>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM media_items ORDER BY id")?;
        let items = stmt
            .query_map([], Self::row_to_media)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn set_monitored(&self, id: i64, monitored: bool) -> Result<(), LibraryError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE media_items SET monitored = ?1 WHERE id = ?2",
            params![monitored, id],
        )?;
        if changed == 0 {
            return Err(LibraryError::NotFound(id));
        }
        Ok(())
    }

    fn due_for_search(
        &self,
        now: DateTime<Utc>,
        backoff_hours: u32,
    ) -> Result<Vec<MediaItem>, LibraryError> {
        self.due_query(false, now, backoff_hours)
    }

    fn due_for_upgrade(
        &self,
        now: DateTime<Utc>,
        backoff_hours: u32,
    ) -> Result<Vec<MediaItem>, LibraryError> {
        self.due_query(true, now, backoff_hours)
    }

    fn get_status(&self, media_id: i64) -> Result<Option<MediaQualityStatus>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let status = conn
            .query_row(
                "SELECT * FROM media_quality_status WHERE media_id = ?1",
                params![media_id],
                Self::row_to_status,
            )
            .optional()?;
        Ok(status)
    }

    fn upsert_status(
        &self,
        media_id: i64,
        attrs: Option<&QualityAttrs>,
        target_met: bool,
        upgrade_available: bool,
    ) -> Result<(), LibraryError> {
        let conn = self.conn.lock().unwrap();
        let attrs_json = attrs
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| LibraryError::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO media_quality_status
             (media_id, attrs, target_met, upgrade_available, last_search_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5)
             ON CONFLICT(media_id) DO UPDATE SET
                attrs = ?2, target_met = ?3, upgrade_available = ?4, updated_at = ?5",
            params![
                media_id,
                attrs_json,
                target_met,
                upgrade_available,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn set_last_searched(&self, media_id: i64, at: DateTime<Utc>) -> Result<(), LibraryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO media_quality_status
             (media_id, attrs, target_met, upgrade_available, last_search_at, updated_at)
             VALUES (?1, NULL, 0, 0, ?2, ?2)
             ON CONFLICT(media_id) DO UPDATE SET last_search_at = ?2",
            params![media_id, at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn get_override(
        &self,
        media_id: i64,
    ) -> Result<Option<MediaQualityOverride>, LibraryError> {
        let conn = self.conn.lock().unwrap();
        let ovr = conn
            .query_row(
                "SELECT * FROM media_quality_override WHERE media_id = ?1",
                params![media_id],
                |row| {
                    Ok(MediaQualityOverride {
                        media_id: row.get("media_id")?,
                        preset_id: row.get("preset_id")?,
                        monitored: row.get("monitored")?,
                    })
                },
            )
            .optional()?;
        Ok(ovr)
    }

    fn set_override(&self, ovr: &MediaQualityOverride) -> Result<(), LibraryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO media_quality_override (media_id, preset_id, monitored)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(media_id) DO UPDATE SET preset_id = ?2, monitored = ?3",
            params![ovr.media_id, ovr.preset_id, ovr.monitored],
        )?;
        Ok(())
    }

    fn remove_override(&self, media_id: i64) -> Result<(), LibraryError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM media_quality_override WHERE media_id = ?1",
            params![media_id],
        )?;
        Ok(())
    }
}
