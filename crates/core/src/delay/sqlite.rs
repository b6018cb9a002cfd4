use super::store::{DelayError, DelayStore};
use super::types::{DelayProfile, DelayProfileSpec, PendingGrab, PendingOutcome};
use crate::indexer::CandidateRelease;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed delay store.
pub struct SqliteDelayStore {
    conn: Mutex<Connection>,
}

impl SqliteDelayStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DelayError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, DelayError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DelayError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS delay_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                enabled INTEGER NOT NULL DEFAULT 1,
                delay_minutes INTEGER NOT NULL,
                library_id INTEGER,
                bypass TEXT
            );

            CREATE TABLE IF NOT EXISTS pending_grabs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                media_id INTEGER NOT NULL UNIQUE,
                release TEXT NOT NULL,
                score INTEGER NOT NULL,
                eligible_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pending_grabs_eligible
                ON pending_grabs(eligible_at);
            "#,
        )?;
        Ok(())
    }

    fn row_to_profile(row: &Row) -> Result<DelayProfile, rusqlite::Error> {
        let bypass_json: Option<String> = row.get("bypass")?;
        Ok(DelayProfile {
            id: row.get("id")?,
            name: row.get("name")?,
            enabled: row.get("enabled")?,
            delay_minutes: row.get("delay_minutes")?,
            library_id: row.get("library_id")?,
            bypass: match bypass_json {
                Some(json) => Some(serde_json::from_str(&json).map_err(json_err)?),
                None => None,
            },
        })
    }

    fn row_to_pending(row: &Row) -> Result<PendingGrab, rusqlite::Error> {
        let release_json: String = row.get("release")?;
        let eligible_at: String = row.get("eligible_at")?;
        let created_at: String = row.get("created_at")?;
        Ok(PendingGrab {
            id: row.get("id")?,
            media_id: row.get("media_id")?,
            release: serde_json::from_str(&release_json).map_err(json_err)?,
            score: row.get("score")?,
            eligible_at: parse_rfc3339(&eligible_at)?,
            created_at: parse_rfc3339(&created_at)?,
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

impl DelayStore for SqliteDelayStore {
    fn create_profile(&self, spec: &DelayProfileSpec) -> Result<DelayProfile, DelayError> {
        let conn = self.conn.lock().unwrap();
        let bypass_json = spec
            .bypass
            .as_ref()
            .map(|b| serde_json::to_string(b).unwrap_or_default());
        conn.execute(
            "INSERT INTO delay_profiles (name, enabled, delay_minutes, library_id, bypass)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                spec.name,
                spec.enabled,
                spec.delay_minutes,
                spec.library_id,
                bypass_json
            ],
        )?;
        let id = conn.last_insert_rowid();
        let profile = conn.query_row(
            "SELECT * FROM delay_profiles WHERE id = ?1",
            params![id],
            Self::row_to_profile,
        )?;
        Ok(profile)
    }

    fn update_profile(
        &self,
        id: i64,
        spec: &DelayProfileSpec,
    ) -> Result<DelayProfile, DelayError> {
        let conn = self.conn.lock().unwrap();
        let bypass_json = spec
            .bypass
            .as_ref()
            .map(|b| serde_json::to_string(b).unwrap_or_default());
        let changed = conn.execute(
            "UPDATE delay_profiles
             SET name = ?1, enabled = ?2, delay_minutes = ?3, library_id = ?4, bypass = ?5
             WHERE id = ?6",
            params![
                spec.name,
                spec.enabled,
                spec.delay_minutes,
                spec.library_id,
                bypass_json,
                id
            ],
        )?;
        if changed == 0 {
            return Err(DelayError::NotFound(id));
        }
        let profile = conn.query_row(
            "SELECT * FROM delay_profiles WHERE id = ?1",
            params![id],
            Self::row_to_profile,
        )?;
        Ok(profile)
    }

    fn delete_profile(&self, id: i64) -> Result<(), DelayError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM delay_profiles WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DelayError::NotFound(id));
        }
        Ok(())
    }

    fn list_profiles(&self) -> Result<Vec<DelayProfile>, DelayError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM delay_profiles ORDER BY id")?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn profile_for_library(&self, library_id: i64) -> Result<Option<DelayProfile>, DelayError> {
        let conn = self.conn.lock().unwrap();
        // Library-scoped profiles win over global ones.
        let profile = conn
            .query_row(
                "SELECT * FROM delay_profiles
                 WHERE enabled = 1 AND (library_id = ?1 OR library_id IS NULL)
                 ORDER BY library_id IS NULL
                 LIMIT 1",
                params![library_id],
                Self::row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    fn offer_pending(
        &self,
        media_id: i64,
        release: &CandidateRelease,
        score: i64,
        eligible_at: DateTime<Utc>,
    ) -> Result<PendingOutcome, DelayError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let held: Option<(i64, i64)> = tx
            .query_row(
                "SELECT id, score FROM pending_grabs WHERE media_id = ?1",
                params![media_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let release_json = serde_json::to_string(release)
            .map_err(|e| DelayError::Database(e.to_string()))?;
        let outcome = match held {
            None => {
                tx.execute(
                    "INSERT INTO pending_grabs (media_id, release, score, eligible_at, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        media_id,
                        release_json,
                        score,
                        eligible_at.to_rfc3339(),
                        Utc::now().to_rfc3339()
                    ],
                )?;
                PendingOutcome::Created
            }
            Some((held_id, held_score)) if score > held_score => {
                // Replacement restarts the delay clock.
                tx.execute(
                    "UPDATE pending_grabs
                     SET release = ?1, score = ?2, eligible_at = ?3, created_at = ?4
                     WHERE id = ?5",
                    params![
                        release_json,
                        score,
                        eligible_at.to_rfc3339(),
                        Utc::now().to_rfc3339(),
                        held_id
                    ],
                )?;
                PendingOutcome::Replaced
            }
            Some(_) => PendingOutcome::Kept,
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn list_pending(&self) -> Result<Vec<PendingGrab>, DelayError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM pending_grabs ORDER BY eligible_at")?;
        let pending = stmt
            .query_map([], Self::row_to_pending)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    fn ready_for_promotion(&self, now: DateTime<Utc>) -> Result<Vec<PendingGrab>, DelayError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM pending_grabs WHERE eligible_at <= ?1 ORDER BY eligible_at",
        )?;
        let pending = stmt
            .query_map(params![now.to_rfc3339()], Self::row_to_pending)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pending)
    }

    fn remove_pending(&self, id: i64) -> Result<(), DelayError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM pending_grabs WHERE id = ?1", params![id])?;
        if changed == 0 {
            return Err(DelayError::NotFound(id));
        }
        Ok(())
    }

    fn remove_pending_for_media(&self, media_id: i64) -> Result<(), DelayError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM pending_grabs WHERE media_id = ?1",
            params![media_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::ReleaseProtocol;
    use crate::quality::parse_release_title;
    use chrono::Duration;

    fn candidate(title: &str) -> CandidateRelease {
        CandidateRelease {
            attrs: parse_release_title(title),
            title: title.to_string(),
            size_bytes: 1,
            seeders: Some(10),
            protocol: ReleaseProtocol::Torrent,
            indexer_id: "idx".to_string(),
            indexer_priority: 10,
            download_url: "magnet:?xt=urn:btih:abc".to_string(),
            publish_date: None,
        }
    }

    fn profile_spec(name: &str, library_id: Option<i64>) -> DelayProfileSpec {
        DelayProfileSpec {
            name: name.to_string(),
            enabled: true,
            delay_minutes: 60,
            library_id,
            bypass: None,
        }
    }

    #[test]
    fn test_profile_crud() {
        let store = SqliteDelayStore::in_memory().unwrap();
        let created = store.create_profile(&profile_spec("global", None)).unwrap();
        assert_eq!(created.delay_minutes, 60);

        let mut spec = profile_spec("global", None);
        spec.delay_minutes = 30;
        let updated = store.update_profile(created.id, &spec).unwrap();
        assert_eq!(updated.delay_minutes, 30);

        store.delete_profile(created.id).unwrap();
        assert!(store.list_profiles().unwrap().is_empty());
        assert!(matches!(
            store.delete_profile(created.id),
            Err(DelayError::NotFound(_))
        ));
    }

    #[test]
    fn test_library_profile_wins_over_global() {
        let store = SqliteDelayStore::in_memory().unwrap();
        store.create_profile(&profile_spec("global", None)).unwrap();
        let scoped = store
            .create_profile(&profile_spec("lib-2", Some(2)))
            .unwrap();

        assert_eq!(store.profile_for_library(2).unwrap().unwrap().id, scoped.id);
        assert_eq!(
            store.profile_for_library(9).unwrap().unwrap().name,
            "global"
        );
    }

    #[test]
    fn test_offer_pending_creates_then_keeps_lower() {
        let store = SqliteDelayStore::in_memory().unwrap();
        let eligible_at = Utc::now() + Duration::minutes(60);

        let first = store
            .offer_pending(1, &candidate("First.1080p.WEB-GRP"), 900, eligible_at)
            .unwrap();
        assert_eq!(first, PendingOutcome::Created);

        let equal = store
            .offer_pending(1, &candidate("Equal.1080p.WEB-GRP"), 900, eligible_at)
            .unwrap();
        assert_eq!(equal, PendingOutcome::Kept);

        let pending = store.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].release.title, "First.1080p.WEB-GRP");
    }

    #[test]
    fn test_offer_pending_replaces_on_higher_score() {
        let store = SqliteDelayStore::in_memory().unwrap();
        let first_eligible = Utc::now() + Duration::minutes(5);
        store
            .offer_pending(1, &candidate("First.1080p.WEB-GRP"), 900, first_eligible)
            .unwrap();

        let later_eligible = Utc::now() + Duration::minutes(60);
        let outcome = store
            .offer_pending(1, &candidate("Better.2160p.WEB-GRP"), 1200, later_eligible)
            .unwrap();
        assert_eq!(outcome, PendingOutcome::Replaced);

        let pending = store.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].score, 1200);
        // The clock restarted at the new eligible_at.
        assert_eq!(pending[0].eligible_at, later_eligible.with_timezone(&Utc));
    }

    #[test]
    fn test_one_pending_per_media_item() {
        let store = SqliteDelayStore::in_memory().unwrap();
        let eligible_at = Utc::now() + Duration::minutes(60);
        for score in [100, 200, 300] {
            store
                .offer_pending(7, &candidate("R.1080p.WEB-GRP"), score, eligible_at)
                .unwrap();
        }
        assert_eq!(store.list_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_ready_for_promotion() {
        let store = SqliteDelayStore::in_memory().unwrap();
        let now = Utc::now();
        store
            .offer_pending(1, &candidate("Ready.1080p.WEB-GRP"), 100, now - Duration::minutes(1))
            .unwrap();
        store
            .offer_pending(2, &candidate("Waiting.1080p.WEB-GRP"), 100, now + Duration::minutes(30))
            .unwrap();

        let ready = store.ready_for_promotion(now).unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].media_id, 1);

        store.remove_pending(ready[0].id).unwrap();
        assert!(store.ready_for_promotion(now).unwrap().is_empty());
    }

    #[test]
    fn test_remove_pending_for_media() {
        let store = SqliteDelayStore::in_memory().unwrap();
        store
            .offer_pending(1, &candidate("R.1080p.WEB-GRP"), 100, Utc::now())
            .unwrap();
        store.remove_pending_for_media(1).unwrap();
        store.remove_pending_for_media(1).unwrap(); // no-op
        assert!(store.list_pending().unwrap().is_empty());
    }
}
