mod preset;
mod release_name;
mod sqlite;
mod store;
mod types;

pub use preset::{FilterKind, FilterSpec, PresetSpec, QualityPreset, ReleaseFilter};
pub use release_name::{parse_episode_ids, parse_release_title, EpisodeIds};
pub use sqlite::SqlitePresetStore;
pub use store::{PresetError, PresetStore};
pub use types::{
    AnimePreferences, AudioFormat, Codec, Edition, HdrFormat, MediaType, QualityAttrs, Resolution,
    Source,
};
