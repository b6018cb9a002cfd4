use super::store::{TrustError, TrustStore};
use super::types::{
    normalize_title, BlockedGroup, BlocklistEntry, BlocklistSpec, Exclusion, ExclusionScope,
    TrustedGroup,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed trust store.
pub struct SqliteTrustStore {
    conn: Mutex<Connection>,
}

impl SqliteTrustStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, TrustError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, TrustError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TrustError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS blocklist (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                release_title TEXT NOT NULL,
                normalized_title TEXT NOT NULL,
                release_group TEXT,
                indexer_id TEXT,
                media_id INTEGER,
                reason TEXT NOT NULL,
                added_at TEXT NOT NULL,
                expires_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_blocklist_normalized
                ON blocklist(normalized_title);

            CREATE TABLE IF NOT EXISTS blocked_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                failure_count INTEGER NOT NULL DEFAULT 0,
                blocked INTEGER NOT NULL DEFAULT 0,
                auto_blocked INTEGER NOT NULL DEFAULT 0,
                added_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS trusted_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                added_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS exclusions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_id INTEGER,
                indexer_id TEXT,
                library_id INTEGER,
                added_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn row_to_entry(row: &Row) -> Result<BlocklistEntry, rusqlite::Error> {
        let added_at: String = row.get("added_at")?;
        let expires_at: Option<String> = row.get("expires_at")?;
        Ok(BlocklistEntry {
            id: row.get("id")?,
            release_title: row.get("release_title")?,
            normalized_title: row.get("normalized_title")?,
            release_group: row.get("release_group")?,
            indexer_id: row.get("indexer_id")?,
            media_id: row.get("media_id")?,
            reason: row.get("reason")?,
            added_at: parse_rfc3339(&added_at)?,
            expires_at: expires_at.as_deref().map(parse_rfc3339).transpose()?,
        })
    }

    fn row_to_blocked_group(row: &Row) -> Result<BlockedGroup, rusqlite::Error> {
        let added_at: String = row.get("added_at")?;
        Ok(BlockedGroup {
            id: row.get("id")?,
            name: row.get("name")?,
            failure_count: row.get("failure_count")?,
            auto_blocked: row.get("auto_blocked")?,
            added_at: parse_rfc3339(&added_at)?,
        })
    }

    fn row_to_exclusion(row: &Row) -> Result<Exclusion, rusqlite::Error> {
        let added_at: String = row.get("added_at")?;
        let media_id: Option<i64> = row.get("media_id")?;
        let indexer_id: Option<String> = row.get("indexer_id")?;
        let library_id: Option<i64> = row.get("library_id")?;
        let scope = match (media_id, indexer_id, library_id) {
            (Some(media_id), _, _) => ExclusionScope::Media { media_id },
            (None, Some(indexer_id), Some(library_id)) => ExclusionScope::IndexerLibrary {
                indexer_id,
                library_id,
            },
            _ => {
                return Err(rusqlite::Error::InvalidColumnType(
                    0,
                    "exclusion row without a scope".to_string(),
                    rusqlite::types::Type::Null,
                ))
            }
        };
        Ok(Exclusion {
            id: row.get("id")?,
            scope,
            added_at: parse_rfc3339(&added_at)?,
        })
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
        })
}

impl TrustStore for SqliteTrustStore {
    fn add_blocklist_entry(&self, spec: &BlocklistSpec) -> Result<BlocklistEntry, TrustError> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO blocklist
             (release_title, normalized_title, release_group, indexer_id, media_id,
              reason, added_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                spec.release_title,
                normalize_title(&spec.release_title),
                spec.release_group,
                spec.indexer_id,
                spec.media_id,
                spec.reason,
                now.to_rfc3339(),
                spec.expires_at.map(|at| at.to_rfc3339()),
            ],
        )?;
        let id = conn.last_insert_rowid();
        let entry = conn.query_row(
            "SELECT * FROM blocklist WHERE id = ?1",
            params![id],
            Self::row_to_entry,
        )?;
        Ok(entry)
    }

    fn remove_blocklist_entry(&self, id: i64) -> Result<(), TrustError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM blocklist WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(TrustError::NotFound(id));
        }
        Ok(())
    }

    fn list_blocklist(&self) -> Result<Vec<BlocklistEntry>, TrustError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM blocklist ORDER BY added_at DESC")?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn is_blocklisted(
        &self,
        normalized_title: &str,
        indexer_id: &str,
        media_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, TrustError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blocklist
             WHERE normalized_title = ?1
               AND (indexer_id IS NULL OR indexer_id = ?2)
               AND (media_id IS NULL OR media_id = ?3)
               AND (expires_at IS NULL OR expires_at > ?4)",
            params![normalized_title, indexer_id, media_id, now.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, TrustError> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM blocklist WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(removed)
    }

    fn block_group(&self, name: &str, auto: bool) -> Result<BlockedGroup, TrustError> {
        let conn = self.conn.lock().unwrap();
        let name = name.to_lowercase();
        conn.execute(
            "INSERT INTO blocked_groups (name, failure_count, blocked, auto_blocked, added_at)
             VALUES (?1, 0, 1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET blocked = 1, auto_blocked = ?2",
            params![name, auto, Utc::now().to_rfc3339()],
        )?;
        let group = conn.query_row(
            "SELECT * FROM blocked_groups WHERE name = ?1",
            params![name],
            Self::row_to_blocked_group,
        )?;
        Ok(group)
    }

    fn unblock_group(&self, name: &str) -> Result<(), TrustError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM blocked_groups WHERE name = ?1",
            params![name.to_lowercase()],
        )?;
        Ok(())
    }

    fn list_blocked_groups(&self) -> Result<Vec<BlockedGroup>, TrustError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM blocked_groups WHERE blocked = 1 ORDER BY name")?;
        let groups = stmt
            .query_map([], Self::row_to_blocked_group)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    fn is_group_blocked(&self, name: &str) -> Result<bool, TrustError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blocked_groups WHERE name = ?1 AND blocked = 1",
            params![name.to_lowercase()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn record_group_failure(&self, name: &str) -> Result<u32, TrustError> {
        let conn = self.conn.lock().unwrap();
        let name = name.to_lowercase();
        conn.execute(
            "INSERT INTO blocked_groups (name, failure_count, blocked, auto_blocked, added_at)
             VALUES (?1, 1, 0, 0, ?2)
             ON CONFLICT(name) DO UPDATE SET failure_count = failure_count + 1",
            params![name, Utc::now().to_rfc3339()],
        )?;
        let count: u32 = conn.query_row(
            "SELECT failure_count FROM blocked_groups WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn trust_group(&self, name: &str) -> Result<TrustedGroup, TrustError> {
        let conn = self.conn.lock().unwrap();
        let name = name.to_lowercase();
        conn.execute(
            "INSERT INTO trusted_groups (name, added_at) VALUES (?1, ?2)
             ON CONFLICT(name) DO NOTHING",
            params![name, Utc::now().to_rfc3339()],
        )?;
        let group = conn.query_row(
            "SELECT * FROM trusted_groups WHERE name = ?1",
            params![name],
            |row| {
                let added_at: String = row.get("added_at")?;
                Ok(TrustedGroup {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    added_at: parse_rfc3339(&added_at)?,
                })
            },
        )?;
        Ok(group)
    }

    fn untrust_group(&self, name: &str) -> Result<(), TrustError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM trusted_groups WHERE name = ?1",
            params![name.to_lowercase()],
        )?;
        Ok(())
    }

    fn list_trusted_groups(&self) -> Result<Vec<TrustedGroup>, TrustError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM trusted_groups ORDER BY name")?;
        let groups = stmt
            .query_map([], |row| {
                let added_at: String = row.get("added_at")?;
                Ok(TrustedGroup {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    added_at: parse_rfc3339(&added_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    fn is_group_trusted(&self, name: &str) -> Result<bool, TrustError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM trusted_groups WHERE name = ?1",
            params![name.to_lowercase()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn add_exclusion(&self, scope: &ExclusionScope) -> Result<Exclusion, TrustError> {
        let conn = self.conn.lock().unwrap();
        let (media_id, indexer_id, library_id) = match scope {
            ExclusionScope::Media { media_id } => (Some(*media_id), None, None),
            ExclusionScope::IndexerLibrary {
                indexer_id,
                library_id,
            } => (None, Some(indexer_id.clone()), Some(*library_id)),
        };
        conn.execute(
            "INSERT INTO exclusions (media_id, indexer_id, library_id, added_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![media_id, indexer_id, library_id, Utc::now().to_rfc3339()],
        )?;
        let id = conn.last_insert_rowid();
        let exclusion = conn.query_row(
            "SELECT * FROM exclusions WHERE id = ?1",
            params![id],
            Self::row_to_exclusion,
        )?;
        Ok(exclusion)
    }

    fn remove_exclusion(&self, id: i64) -> Result<(), TrustError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM exclusions WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(TrustError::NotFound(id));
        }
        Ok(())
    }

    fn list_exclusions(&self) -> Result<Vec<Exclusion>, TrustError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM exclusions ORDER BY id")?;
        let exclusions = stmt
            .query_map([], Self::row_to_exclusion)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(exclusions)
    }

    fn is_excluded(
        &self,
        media_id: i64,
        indexer_id: &str,
        library_id: i64,
    ) -> Result<bool, TrustError> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exclusions
             WHERE media_id = ?1
                OR (indexer_id = ?2 AND library_id = ?3)",
            params![media_id, indexer_id, library_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
