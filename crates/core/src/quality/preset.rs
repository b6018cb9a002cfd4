use super::types::{
    AnimePreferences, AudioFormat, Codec, Edition, HdrFormat, MediaType, Resolution, Source,
};
use serde::{Deserialize, Serialize};

/// A named quality profile applied to media items.
///
/// `resolution` and `source` act both as the rejection floor and the
/// scoring target. Built-in presets ship with the database and cannot
/// be modified or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPreset {
    pub id: i64,
    pub name: String,
    pub media_type: MediaType,
    pub resolution: Resolution,
    pub source: Source,
    pub codec: Codec,
    pub edition: Edition,
    pub hdr_formats: Vec<HdrFormat>,
    pub audio_formats: Vec<AudioFormat>,
    /// Torrent candidates with fewer seeders are rejected outright.
    pub min_seeders: u32,
    pub prefer_season_packs: bool,
    /// Keep searching after the target is met and grab better releases.
    pub auto_upgrade: bool,
    /// Replace the old file when an upgrade import collides with it.
    pub upgrade_delete_old: bool,
    pub is_default: bool,
    pub is_built_in: bool,
    pub anime: Option<AnimePreferences>,
}

/// Fields settable when creating or updating a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetSpec {
    pub name: String,
    pub media_type: MediaType,
    pub resolution: Resolution,
    pub source: Source,
    #[serde(default = "default_codec")]
    pub codec: Codec,
    #[serde(default = "default_edition")]
    pub edition: Edition,
    #[serde(default)]
    pub hdr_formats: Vec<HdrFormat>,
    #[serde(default)]
    pub audio_formats: Vec<AudioFormat>,
    #[serde(default)]
    pub min_seeders: u32,
    #[serde(default)]
    pub prefer_season_packs: bool,
    #[serde(default)]
    pub auto_upgrade: bool,
    #[serde(default)]
    pub upgrade_delete_old: bool,
    #[serde(default)]
    pub anime: Option<AnimePreferences>,
}

fn default_codec() -> Codec {
    Codec::Any
}

fn default_edition() -> Edition {
    Edition::Any
}

/// Whether a filter term must or must not appear in a release title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    MustContain,
    MustNotContain,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::MustContain => "must_contain",
            FilterKind::MustNotContain => "must_not_contain",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "must_contain" => Some(FilterKind::MustContain),
            "must_not_contain" => Some(FilterKind::MustNotContain),
            _ => None,
        }
    }
}

/// A per-preset title filter, applied before any scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseFilter {
    pub id: i64,
    pub preset_id: i64,
    pub kind: FilterKind,
    /// Substring, or a regex when `is_regex` is set.
    pub value: String,
    pub is_regex: bool,
}

/// Fields settable when adding a filter to a preset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub value: String,
    #[serde(default)]
    pub is_regex: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_spec_defaults() {
        let json = r#"{
            "name": "HD",
            "media_type": "movie",
            "resolution": "r1080p",
            "source": "web"
        }"#;
        let spec: PresetSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.codec, Codec::Any);
        assert_eq!(spec.edition, Edition::Any);
        assert_eq!(spec.min_seeders, 0);
        assert!(!spec.auto_upgrade);
        assert!(spec.anime.is_none());
    }

    #[test]
    fn test_filter_kind_roundtrip() {
        for kind in [FilterKind::MustContain, FilterKind::MustNotContain] {
            assert_eq!(FilterKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(FilterKind::parse("bogus"), None);
    }
}
