use serde::{Deserialize, Serialize};

/// Video resolution, ordered from lowest to highest.
///
/// The derived `Ord` gives the ranking used for floor checks and
/// upgrade comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    R480p,
    R720p,
    R1080p,
    R2160p,
}

impl Resolution {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Resolution::R480p => "480p",
            Resolution::R720p => "720p",
            Resolution::R1080p => "1080p",
            Resolution::R2160p => "2160p",
        }
    }
}

/// Release source, ordered from least to most desirable.
///
/// `Any` sits at the bottom so a preset with an `Any` source floor
/// admits every candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Any,
    Web,
    Bluray,
    Remux,
}

impl Source {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Source::Any => "any",
            Source::Web => "web",
            Source::Bluray => "bluray",
            Source::Remux => "remux",
        }
    }
}

/// HDR metadata format detected in a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrFormat {
    Hdr10,
    Hdr10Plus,
    DolbyVision,
    Hlg,
}

impl HdrFormat {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            HdrFormat::Hdr10 => "HDR10",
            HdrFormat::Hdr10Plus => "HDR10+",
            HdrFormat::DolbyVision => "DV",
            HdrFormat::Hlg => "HLG",
        }
    }
}

/// Audio codec detected in a release name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Aac,
    Ac3,
    Eac3,
    Dts,
    TrueHd,
    Atmos,
    Flac,
}

impl AudioFormat {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            AudioFormat::Aac => "AAC",
            AudioFormat::Ac3 => "AC3",
            AudioFormat::Eac3 => "EAC3",
            AudioFormat::Dts => "DTS",
            AudioFormat::TrueHd => "TrueHD",
            AudioFormat::Atmos => "Atmos",
            AudioFormat::Flac => "FLAC",
        }
    }
}

/// Video codec preference. `Any` disables the codec check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    Any,
    X264,
    X265,
    Av1,
}

impl Codec {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Codec::Any => "any",
            Codec::X264 => "x264",
            Codec::X265 => "x265",
            Codec::Av1 => "AV1",
        }
    }
}

/// Cut/edition preference. `Any` disables the edition check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    Any,
    Theatrical,
    Extended,
    Directors,
    Remastered,
}

impl Edition {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Edition::Any => "any",
            Edition::Theatrical => "Theatrical",
            Edition::Extended => "Extended",
            Edition::Directors => "Directors Cut",
            Edition::Remastered => "Remastered",
        }
    }
}

/// Kind of media an item or preset applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Tv,
    Anime,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Anime => "anime",
        }
    }
}

/// Anime-specific scoring preferences, only meaningful on anime presets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimePreferences {
    /// Prefer releases carrying both original and localized audio tracks.
    #[serde(default)]
    pub prefer_dual_audio: bool,
    /// Prefer dubbed releases over subbed ones.
    #[serde(default)]
    pub prefer_dubbed: bool,
    /// Bonus for releases tagged with this language.
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// Quality attributes parsed out of a release title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAttrs {
    pub resolution: Option<Resolution>,
    /// `None` when no source keyword was detected.
    pub source: Option<Source>,
    pub codec: Option<Codec>,
    #[serde(default)]
    pub hdr_formats: Vec<HdrFormat>,
    #[serde(default)]
    pub audio_formats: Vec<AudioFormat>,
    pub edition: Option<Edition>,
    #[serde(default)]
    pub season_pack: bool,
    /// Trailing or bracketed release group name.
    pub release_group: Option<String>,
    #[serde(default)]
    pub dual_audio: bool,
    #[serde(default)]
    pub dubbed: bool,
    /// Language tag detected in the title, lowercase.
    pub language: Option<String>,
}

impl QualityAttrs {
    /// Short human-readable label, used by naming templates.
    pub fn quality_label(&self) -> String {
        let mut parts = Vec::new();
        if let Some(resolution) = self.resolution {
            parts.push(resolution.as_keyword().to_string());
        }
        if let Some(source) = self.source {
            if source != Source::Any {
                parts.push(match source {
                    Source::Web => "WEB-DL".to_string(),
                    Source::Bluray => "BluRay".to_string(),
                    Source::Remux => "Remux".to_string(),
                    Source::Any => unreachable!(),
                });
            }
        }
        if parts.is_empty() {
            "Unknown".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_ordering() {
        assert!(Resolution::R480p < Resolution::R720p);
        assert!(Resolution::R720p < Resolution::R1080p);
        assert!(Resolution::R1080p < Resolution::R2160p);
    }

    #[test]
    fn test_source_ordering() {
        assert!(Source::Any < Source::Web);
        assert!(Source::Web < Source::Bluray);
        assert!(Source::Bluray < Source::Remux);
    }

    #[test]
    fn test_resolution_serde_snake_case() {
        let json = serde_json::to_string(&Resolution::R1080p).unwrap();
        assert_eq!(json, "\"r1080p\"");
        let back: Resolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Resolution::R1080p);
    }

    #[test]
    fn test_quality_attrs_roundtrip() {
        let attrs = QualityAttrs {
            resolution: Some(Resolution::R2160p),
            source: Some(Source::Bluray),
            codec: Some(Codec::X265),
            hdr_formats: vec![HdrFormat::Hdr10, HdrFormat::DolbyVision],
            audio_formats: vec![AudioFormat::Atmos],
            edition: Some(Edition::Extended),
            season_pack: true,
            release_group: Some("GROUP".to_string()),
            dual_audio: false,
            dubbed: false,
            language: None,
        };
        let json = serde_json::to_string(&attrs).unwrap();
        let back: QualityAttrs = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);
    }

    #[test]
    fn test_quality_label() {
        let attrs = QualityAttrs {
            resolution: Some(Resolution::R1080p),
            source: Some(Source::Web),
            ..Default::default()
        };
        assert_eq!(attrs.quality_label(), "1080p WEB-DL");

        let unknown = QualityAttrs::default();
        assert_eq!(unknown.quality_label(), "Unknown");
    }
}
