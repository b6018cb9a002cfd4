use super::types::{AudioFormat, Codec, Edition, HdrFormat, QualityAttrs, Resolution, Source};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex_lite::Regex;

static EPISODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,2})[\s._-]?E(\d{1,3})\b").unwrap());

static SEASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:S(\d{1,2})|Season[\s._]?(\d{1,2}))\b").unwrap());

static AIR_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[.\-](\d{2})[.\-](\d{2})\b").unwrap());

static TRAILING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-([A-Za-z0-9]+)$").unwrap());

static LEADING_GROUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[([^\]]+)\]").unwrap());

static TRAILING_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]$").unwrap());

static EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(mkv|mp4|avi|nzb|torrent)$").unwrap());

static WEB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bWEB(-?DL|RIP)?\b").unwrap());

/// Season/episode identifiers parsed from a release title, used by the
/// import pipeline to render naming templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeIds {
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub air_date: Option<NaiveDate>,
}

/// Parses quality attributes out of a release title.
///
/// Detection is keyword based and case insensitive. Anything that does
/// not match a known keyword is left as `None`, never guessed.
pub fn parse_release_title(title: &str) -> QualityAttrs {
    let normalized = title.replace(['.', '_'], " ");
    let upper = normalized.to_uppercase();

    let mut attrs = QualityAttrs {
        resolution: parse_resolution(&upper),
        source: parse_source(&upper),
        codec: parse_codec(&upper),
        hdr_formats: parse_hdr(&upper),
        audio_formats: parse_audio(&upper),
        edition: parse_edition(&upper),
        season_pack: false,
        release_group: parse_release_group(title),
        dual_audio: upper.contains("DUAL AUDIO") || upper.contains("DUAL-AUDIO"),
        dubbed: upper.contains("DUBBED") || upper.contains(" DUB "),
        language: parse_language(&upper),
    };

    // A season marker without an episode marker means a full-season pack.
    attrs.season_pack = !EPISODE_RE.is_match(&normalized)
        && (SEASON_RE.is_match(&normalized) || upper.contains("COMPLETE"));

    attrs
}

/// Parses season/episode/air-date identifiers from a release title.
pub fn parse_episode_ids(title: &str) -> EpisodeIds {
    let normalized = title.replace(['.', '_'], " ");

    if let Some(caps) = EPISODE_RE.captures(&normalized) {
        return EpisodeIds {
            season: caps.get(1).and_then(|m| m.as_str().parse().ok()),
            episode: caps.get(2).and_then(|m| m.as_str().parse().ok()),
            air_date: None,
        };
    }

    if let Some(caps) = AIR_DATE_RE.captures(&normalized) {
        let date = match (
            caps.get(1).and_then(|m| m.as_str().parse().ok()),
            caps.get(2).and_then(|m| m.as_str().parse().ok()),
            caps.get(3).and_then(|m| m.as_str().parse().ok()),
        ) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        };
        if date.is_some() {
            return EpisodeIds {
                season: None,
                episode: None,
                air_date: date,
            };
        }
    }

    if let Some(caps) = SEASON_RE.captures(&normalized) {
        let season = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| m.as_str().parse().ok());
        return EpisodeIds {
            season,
            episode: None,
            air_date: None,
        };
    }

    EpisodeIds::default()
}

fn parse_resolution(upper: &str) -> Option<Resolution> {
    if upper.contains("2160P") || upper.contains("4K") || upper.contains("UHD") {
        Some(Resolution::R2160p)
    } else if upper.contains("1080P") {
        Some(Resolution::R1080p)
    } else if upper.contains("720P") {
        Some(Resolution::R720p)
    } else if upper.contains("480P") || upper.contains("DVDRIP") {
        Some(Resolution::R480p)
    } else {
        None
    }
}

fn parse_source(upper: &str) -> Option<Source> {
    // Remux first, remux titles usually also carry a BluRay keyword.
    if upper.contains("REMUX") {
        Some(Source::Remux)
    } else if upper.contains("BLURAY")
        || upper.contains("BLU-RAY")
        || upper.contains("BDRIP")
        || upper.contains("BRRIP")
    {
        Some(Source::Bluray)
    } else if WEB_RE.is_match(upper) {
        Some(Source::Web)
    } else {
        None
    }
}

fn parse_codec(upper: &str) -> Option<Codec> {
    if upper.contains("X265") || upper.contains("H265") || upper.contains("HEVC") {
        Some(Codec::X265)
    } else if upper.contains("X264") || upper.contains("H264") || upper.contains("AVC") {
        Some(Codec::X264)
    } else if upper.contains("AV1") {
        Some(Codec::Av1)
    } else {
        None
    }
}

fn parse_hdr(upper: &str) -> Vec<HdrFormat> {
    let mut formats = Vec::new();
    if upper.contains("HDR10+") || upper.contains("HDR10PLUS") {
        formats.push(HdrFormat::Hdr10Plus);
    } else if upper.contains("HDR10") || upper.contains("HDR") {
        formats.push(HdrFormat::Hdr10);
    }
    if upper.contains("DOLBY VISION") || upper.contains("DOVI") || upper.contains(" DV ") {
        formats.push(HdrFormat::DolbyVision);
    }
    if upper.contains("HLG") {
        formats.push(HdrFormat::Hlg);
    }
    formats
}

fn parse_audio(upper: &str) -> Vec<AudioFormat> {
    let mut formats = Vec::new();
    if upper.contains("ATMOS") {
        formats.push(AudioFormat::Atmos);
    }
    if upper.contains("TRUEHD") {
        formats.push(AudioFormat::TrueHd);
    }
    if upper.contains("EAC3") || upper.contains("E-AC3") || upper.contains("DDP") {
        formats.push(AudioFormat::Eac3);
    } else if upper.contains("AC3") || upper.contains("DD5 1") {
        formats.push(AudioFormat::Ac3);
    }
    if upper.contains("DTS") {
        formats.push(AudioFormat::Dts);
    }
    if upper.contains("FLAC") {
        formats.push(AudioFormat::Flac);
    }
    if upper.contains("AAC") {
        formats.push(AudioFormat::Aac);
    }
    formats
}

fn parse_edition(upper: &str) -> Option<Edition> {
    if upper.contains("EXTENDED") {
        Some(Edition::Extended)
    } else if upper.contains("DIRECTOR") {
        Some(Edition::Directors)
    } else if upper.contains("REMASTER") {
        Some(Edition::Remastered)
    } else if upper.contains("THEATRICAL") {
        Some(Edition::Theatrical)
    } else {
        None
    }
}

fn parse_language(upper: &str) -> Option<String> {
    for lang in ["MULTI", "GERMAN", "FRENCH", "ITALIAN", "SPANISH", "JAPANESE"] {
        if upper.contains(&format!(" {lang} ")) || upper.contains(&format!(" {lang})")) {
            return Some(lang.to_lowercase());
        }
    }
    None
}

fn parse_release_group(title: &str) -> Option<String> {
    // Anime convention puts the group in a leading bracket tag.
    if let Some(caps) = LEADING_GROUP_RE.captures(title) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    let mut trimmed = EXTENSION_RE.replace(title.trim(), "").to_string();
    // Strip trailing indexer tags like "[rartv]".
    trimmed = TRAILING_TAG_RE.replace(trimmed.trim(), "").trim().to_string();

    TRAILING_GROUP_RE
        .captures(&trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_movie_title() {
        let attrs =
            parse_release_title("The.Heist.2021.1080p.BluRay.x264.DTS-FGT");
        assert_eq!(attrs.resolution, Some(Resolution::R1080p));
        assert_eq!(attrs.source, Some(Source::Bluray));
        assert_eq!(attrs.codec, Some(Codec::X264));
        assert_eq!(attrs.audio_formats, vec![AudioFormat::Dts]);
        assert_eq!(attrs.release_group.as_deref(), Some("FGT"));
        assert!(!attrs.season_pack);
    }

    #[test]
    fn test_parse_web_episode() {
        let attrs = parse_release_title(
            "Some.Show.S02E05.2160p.WEB-DL.DDP5.1.Atmos.HDR10.x265-NTb",
        );
        assert_eq!(attrs.resolution, Some(Resolution::R2160p));
        assert_eq!(attrs.source, Some(Source::Web));
        assert_eq!(attrs.codec, Some(Codec::X265));
        assert!(attrs.hdr_formats.contains(&HdrFormat::Hdr10));
        assert!(attrs.audio_formats.contains(&AudioFormat::Atmos));
        assert!(attrs.audio_formats.contains(&AudioFormat::Eac3));
        assert!(!attrs.season_pack);
    }

    #[test]
    fn test_parse_season_pack() {
        let attrs =
            parse_release_title("Some.Show.S03.1080p.WEB-DL.x264-GROUP");
        assert!(attrs.season_pack);

        let complete = parse_release_title("Some Show COMPLETE 720p WEBRip");
        assert!(complete.season_pack);

        let episode = parse_release_title("Some.Show.S03E01.1080p.WEB-DL.x264-GROUP");
        assert!(!episode.season_pack);
    }

    #[test]
    fn test_parse_remux_over_bluray() {
        let attrs = parse_release_title("Film.2019.2160p.BluRay.REMUX.HEVC.TrueHD.7.1-EPSiLON");
        assert_eq!(attrs.source, Some(Source::Remux));
    }

    #[test]
    fn test_parse_anime_bracket_group() {
        let attrs = parse_release_title(
            "[SubsPlease] Cool Anime - 12 (1080p) [F02B9CEE].mkv",
        );
        assert_eq!(attrs.release_group.as_deref(), Some("SubsPlease"));
        assert_eq!(attrs.resolution, Some(Resolution::R1080p));
    }

    #[test]
    fn test_parse_dual_audio() {
        let attrs = parse_release_title(
            "[Judas] Anime Title (Season 1) [BD 1080p][HEVC x265][Dual-Audio]",
        );
        assert!(attrs.dual_audio);
        assert!(attrs.season_pack);
    }

    #[test]
    fn test_parse_unknown_title_leaves_none() {
        let attrs = parse_release_title("Completely Opaque Name");
        assert_eq!(attrs.resolution, None);
        assert_eq!(attrs.source, None);
        assert_eq!(attrs.codec, None);
        assert!(attrs.hdr_formats.is_empty());
    }

    #[test]
    fn test_parse_edition() {
        let attrs = parse_release_title("Film.1999.Directors.Cut.1080p.BluRay.x264-GRP");
        assert_eq!(attrs.edition, Some(Edition::Directors));
    }

    #[test]
    fn test_episode_ids_from_sxxexx() {
        let ids = parse_episode_ids("Some.Show.S02E05.1080p.WEB-DL-GRP");
        assert_eq!(ids.season, Some(2));
        assert_eq!(ids.episode, Some(5));
        assert_eq!(ids.air_date, None);
    }

    #[test]
    fn test_episode_ids_from_air_date() {
        let ids = parse_episode_ids("Daily.Show.2024.03.15.1080p.WEB-GRP");
        assert_eq!(ids.air_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(ids.episode, None);
    }

    #[test]
    fn test_episode_ids_season_only() {
        let ids = parse_episode_ids("Some.Show.S04.COMPLETE.1080p-GRP");
        assert_eq!(ids.season, Some(4));
        assert_eq!(ids.episode, None);
    }

    #[test]
    fn test_trailing_indexer_tag_stripped_before_group() {
        let attrs = parse_release_title("Show.S01E01.720p.HDTV.x264-AVS[rartv]");
        assert_eq!(attrs.release_group.as_deref(), Some("AVS"));
    }
}
