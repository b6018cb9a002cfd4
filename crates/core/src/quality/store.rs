use super::preset::{FilterSpec, PresetSpec, QualityPreset, ReleaseFilter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset not found: {0}")]
    NotFound(i64),

    #[error("preset '{0}' is built in and cannot be modified")]
    BuiltInImmutable(String),

    #[error("a preset named '{0}' already exists")]
    DuplicateName(String),

    #[error("database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for PresetError {
    fn from(e: rusqlite::Error) -> Self {
        PresetError::Database(e.to_string())
    }
}

/// Storage for quality presets and their release filters.
pub trait PresetStore: Send + Sync {
    fn create(&self, spec: &PresetSpec) -> Result<QualityPreset, PresetError>;

    fn get(&self, id: i64) -> Result<Option<QualityPreset>, PresetError>;

    fn list(&self) -> Result<Vec<QualityPreset>, PresetError>;

    /// Rejected with `BuiltInImmutable` for built-in presets.
    fn update(&self, id: i64, spec: &PresetSpec) -> Result<QualityPreset, PresetError>;

    /// Rejected with `BuiltInImmutable` for built-in presets.
    fn delete(&self, id: i64) -> Result<(), PresetError>;

    /// Makes `id` the single default preset. Clearing the previous
    /// default and setting the new one happen in one transaction, so
    /// exactly one default exists at all times.
    fn set_default(&self, id: i64) -> Result<(), PresetError>;

    fn default_preset(&self) -> Result<QualityPreset, PresetError>;

    fn filters_for(&self, preset_id: i64) -> Result<Vec<ReleaseFilter>, PresetError>;

    fn add_filter(&self, preset_id: i64, spec: &FilterSpec) -> Result<ReleaseFilter, PresetError>;

    fn delete_filter(&self, filter_id: i64) -> Result<(), PresetError>;
}
