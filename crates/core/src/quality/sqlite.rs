use super::preset::{FilterKind, FilterSpec, PresetSpec, QualityPreset, ReleaseFilter};
use super::store::{PresetError, PresetStore};
use super::types::{AnimePreferences, Codec, Edition, MediaType, Resolution, Source};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

/// SQLite-backed preset store.
pub struct SqlitePresetStore {
    conn: Mutex<Connection>,
}

impl SqlitePresetStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, PresetError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Self::seed_built_ins(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, PresetError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Self::seed_built_ins(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), PresetError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS quality_presets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                media_type TEXT NOT NULL,
                resolution TEXT NOT NULL,
                source TEXT NOT NULL,
                codec TEXT NOT NULL,
                edition TEXT NOT NULL,
                hdr_formats TEXT NOT NULL,
                audio_formats TEXT NOT NULL,
                min_seeders INTEGER NOT NULL DEFAULT 0,
                prefer_season_packs INTEGER NOT NULL DEFAULT 0,
                auto_upgrade INTEGER NOT NULL DEFAULT 0,
                upgrade_delete_old INTEGER NOT NULL DEFAULT 0,
                is_default INTEGER NOT NULL DEFAULT 0,
                is_built_in INTEGER NOT NULL DEFAULT 0,
                anime TEXT
            );

            CREATE TABLE IF NOT EXISTS release_filters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                preset_id INTEGER NOT NULL REFERENCES quality_presets(id) ON DELETE CASCADE,
                kind TEXT NOT NULL,
                value TEXT NOT NULL,
                is_regex INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_release_filters_preset
                ON release_filters(preset_id);
            "#,
        )?;
        Ok(())
    }

    /// Seeds the immutable built-in presets on first run. "HD 1080p"
    /// starts out as the default.
    fn seed_built_ins(conn: &Connection) -> Result<(), PresetError> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM quality_presets", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let built_ins = [
            ("Any", "r480p", "any", 0, 0),
            ("HD 720p", "r720p", "web", 0, 0),
            ("HD 1080p", "r1080p", "web", 1, 1),
            ("Ultra HD", "r2160p", "bluray", 0, 1),
        ];
        for (name, resolution, source, is_default, auto_upgrade) in built_ins {
            conn.execute(
                "INSERT INTO quality_presets
                 (name, media_type, resolution, source, codec, edition,
                  hdr_formats, audio_formats, min_seeders, prefer_season_packs,
                  auto_upgrade, upgrade_delete_old, is_default, is_built_in, anime)
                 VALUES (?1, 'movie', ?2, ?3, 'any', 'any', '[]', '[]', 0, 0, ?4, ?4, ?5, 1, NULL)",
                params![name, resolution, source, auto_upgrade, is_default],
            )?;
        }
        Ok(())
    }

    fn row_to_preset(row: &Row) -> Result<QualityPreset, rusqlite::Error> {
        let media_type: String = row.get("media_type")?;
        let resolution: String = row.get("resolution")?;
        let source: String = row.get("source")?;
        let codec: String = row.get("codec")?;
        let edition: String = row.get("edition")?;
        let hdr_json: String = row.get("hdr_formats")?;
        let audio_json: String = row.get("audio_formats")?;
        let anime_json: Option<String> = row.get("anime")?;

        Ok(QualityPreset {
            id: row.get("id")?,
            name: row.get("name")?,
            media_type: parse_json_keyword(&media_type, row)?,
            resolution: parse_json_keyword::<Resolution>(&resolution, row)?,
            source: parse_json_keyword::<Source>(&source, row)?,
            codec: parse_json_keyword::<Codec>(&codec, row)?,
            edition: parse_json_keyword::<Edition>(&edition, row)?,
            hdr_formats: serde_json::from_str(&hdr_json).map_err(json_column_err(row))?,
            audio_formats: serde_json::from_str(&audio_json).map_err(json_column_err(row))?,
            min_seeders: row.get("min_seeders")?,
            prefer_season_packs: row.get("prefer_season_packs")?,
            auto_upgrade: row.get("auto_upgrade")?,
            upgrade_delete_old: row.get("upgrade_delete_old")?,
            is_default: row.get("is_default")?,
            is_built_in: row.get("is_built_in")?,
            anime: match anime_json {
                Some(json) => {
                    Some(serde_json::from_str::<AnimePreferences>(&json)
                        .map_err(json_column_err(row))?)
                }
                None => None,
            },
        })
    }

    fn row_to_filter(row: &Row) -> Result<ReleaseFilter, rusqlite::Error> {
        let kind: String = row.get("kind")?;
        Ok(ReleaseFilter {
            id: row.get("id")?,
            preset_id: row.get("preset_id")?,
            kind: FilterKind::parse(&kind).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    0,
                    format!("unknown filter kind '{kind}'"),
                    rusqlite::types::Type::Text,
                )
            })?,
            value: row.get("value")?,
            is_regex: row.get("is_regex")?,
        })
    }

    fn get_with_conn(conn: &Connection, id: i64) -> Result<Option<QualityPreset>, PresetError> {
        let preset = conn
            .query_row(
                "SELECT * FROM quality_presets WHERE id = ?1",
                params![id],
                Self::row_to_preset,
            )
            .optional()?;
        Ok(preset)
    }
}

/// Enum keywords are stored as their snake_case serde names.
fn parse_json_keyword<T: serde::de::DeserializeOwned>(
    keyword: &str,
    _row: &Row,
) -> Result<T, rusqlite::Error> {
    serde_json::from_str(&format!("\"{keyword}\"")).map_err(|e| {
        rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
    })
}

fn json_column_err(_row: &Row) -> impl Fn(serde_json::Error) -> rusqlite::Error {
    |e| rusqlite::Error::InvalidColumnType(0, e.to_string(), rusqlite::types::Type::Text)
}

fn keyword<T: serde::Serialize>(value: &T) -> String {
    // serde_json renders unit enum variants as "\"name\"".
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

impl PresetStore for SqlitePresetStore {
    fn create(&self, spec: &PresetSpec) -> Result<QualityPreset, PresetError> {
        let conn = self.conn.lock().unwrap();
        let anime_json = spec
            .anime
            .as_ref()
            .map(|a| serde_json::to_string(a).unwrap_or_default());
        let result = conn.execute(
            "INSERT INTO quality_presets
             (name, media_type, resolution, source, codec, edition,
              hdr_formats, audio_formats, min_seeders, prefer_season_packs,
              auto_upgrade, upgrade_delete_old, is_default, is_built_in, anime)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 0, 0, ?13)",
            params![
                spec.name,
                keyword(&spec.media_type),
                keyword(&spec.resolution),
                keyword(&spec.source),
                keyword(&spec.codec),
                keyword(&spec.edition),
                serde_json::to_string(&spec.hdr_formats).unwrap_or_default(),
                serde_json::to_string(&spec.audio_formats).unwrap_or_default(),
                spec.min_seeders,
                spec.prefer_season_packs,
                spec.auto_upgrade,
                spec.upgrade_delete_old,
                anime_json,
            ],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(PresetError::DuplicateName(spec.name.clone()));
            }
            Err(e) => return Err(e.into()),
        }
        let id = conn.last_insert_rowid();
        Self::get_with_conn(&conn, id)?.ok_or(PresetError::NotFound(id))
    }

    fn get(&self, id: i64) -> Result<Option<QualityPreset>, PresetError> {
        let conn = self.conn.lock().unwrap();
        Self::get_with_conn(&conn, id)
    }

    fn list(&self) -> Result<Vec<QualityPreset>, PresetError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT * FROM quality_presets ORDER BY id")?;
        let presets = stmt
            .query_map([], Self::row_to_preset)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(presets)
    }

    fn update(&self, id: i64, spec: &PresetSpec) -> Result<QualityPreset, PresetError> {
        let conn = self.conn.lock().unwrap();
        let existing = Self::get_with_conn(&conn, id)?.ok_or(PresetError::NotFound(id))?;
        if existing.is_built_in {
            return Err(PresetError::BuiltInImmutable(existing.name));
        }
        let anime_json = spec
            .anime
            .as_ref()
            .map(|a| serde_json::to_string(a).unwrap_or_default());
        conn.execute(
            "UPDATE quality_presets SET
             name = ?1, media_type = ?2, resolution = ?3, source = ?4,
             codec = ?5, edition = ?6, hdr_formats = ?7, audio_formats = ?8,
             min_seeders = ?9, prefer_season_packs = ?10, auto_upgrade = ?11,
             upgrade_delete_old = ?12, anime = ?13
             WHERE id = ?14",
            params![
                spec.name,
                keyword(&spec.media_type),
                keyword(&spec.resolution),
                keyword(&spec.source),
                keyword(&spec.codec),
                keyword(&spec.edition),
                serde_json::to_string(&spec.hdr_formats).unwrap_or_default(),
                serde_json::to_string(&spec.audio_formats).unwrap_or_default(),
                spec.min_seeders,
                spec.prefer_season_packs,
                spec.auto_upgrade,
                spec.upgrade_delete_old,
                anime_json,
                id,
            ],
        )?;
        Self::get_with_conn(&conn, id)?.ok_or(PresetError::NotFound(id))
    }

    fn delete(&self, id: i64) -> Result<(), PresetError> {
        let conn = self.conn.lock().unwrap();
        let existing = Self::get_with_conn(&conn, id)?.ok_or(PresetError::NotFound(id))?;
        if existing.is_built_in {
            return Err(PresetError::BuiltInImmutable(existing.name));
        }
        if existing.is_default {
            // Hand the default back to the first built-in before removal.
            conn.execute(
                "UPDATE quality_presets SET is_default = 1
                 WHERE id = (SELECT MIN(id) FROM quality_presets WHERE is_built_in = 1)",
                [],
            )?;
        }
        conn.execute("DELETE FROM quality_presets WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn set_default(&self, id: i64) -> Result<(), PresetError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT id FROM quality_presets WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(PresetError::NotFound(id));
        }
        tx.execute("UPDATE quality_presets SET is_default = 0", [])?;
        tx.execute(
            "UPDATE quality_presets SET is_default = 1 WHERE id = ?1",
            params![id],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn default_preset(&self) -> Result<QualityPreset, PresetError> {
        let conn = self.conn.lock().unwrap();
        let preset = conn
            .query_row(
                "SELECT * FROM quality_presets WHERE is_default = 1 LIMIT 1",
                [],
                Self::row_to_preset,
            )
            .optional()?;
        preset.ok_or_else(|| PresetError::Database("no default preset".to_string()))
    }

    fn filters_for(&self, preset_id: i64) -> Result<Vec<ReleaseFilter>, PresetError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT * FROM release_filters WHERE preset_id = ?1 ORDER BY id")?;
        let filters = stmt
            .query_map(params![preset_id], Self::row_to_filter)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(filters)
    }

    fn add_filter(&self, preset_id: i64, spec: &FilterSpec) -> Result<ReleaseFilter, PresetError> {
        let conn = self.conn.lock().unwrap();
        if Self::get_with_conn(&conn, preset_id)?.is_none() {
            return Err(PresetError::NotFound(preset_id));
        }
        conn.execute(
            "INSERT INTO release_filters (preset_id, kind, value, is_regex)
             VALUES (?1, ?2, ?3, ?4)",
            params![preset_id, spec.kind.as_str(), spec.value, spec.is_regex],
        )?;
        let id = conn.last_insert_rowid();
        let filter = conn.query_row(
            "SELECT * FROM release_filters WHERE id = ?1",
            params![id],
            Self::row_to_filter,
        )?;
        Ok(filter)
    }

    fn delete_filter(&self, filter_id: i64) -> Result<(), PresetError> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM release_filters WHERE id = ?1",
            params![filter_id],
        )?;
        if changed == 0 {
            return Err(PresetError::NotFound(filter_id));
        }
        Ok(())
    }
}
