use crate::indexer::{CandidateRelease, ReleaseProtocol};
use crate::quality::{Codec, Edition, FilterKind, QualityPreset, ReleaseFilter, Source};
use tracing::warn;

// Attribute weights. The gaps keep higher-priority attributes from
// ever being outvoted by combinations of lower ones.
pub const RESOLUTION_MATCH: i64 = 1000;
pub const RESOLUTION_STEP_PENALTY: i64 = 250;
pub const SOURCE_MATCH: i64 = 500;
pub const SOURCE_STEP_PENALTY: i64 = 150;
pub const CODEC_MATCH: i64 = 100;
pub const EDITION_MATCH: i64 = 60;
pub const HDR_FORMAT_BONUS: i64 = 50;
pub const SEASON_PACK_BONUS: i64 = 40;
pub const AUDIO_FORMAT_BONUS: i64 = 30;
pub const TRUSTED_GROUP_BONUS: i64 = 25;
pub const DUAL_AUDIO_BONUS: i64 = 20;
pub const LANGUAGE_MATCH_BONUS: i64 = 20;
pub const DUBBED_BONUS: i64 = 15;

/// A replacement release must beat the current one by this much before
/// an auto-upgrade grab is allowed.
pub const UPGRADE_SCORE_MARGIN: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

/// Result of scoring one candidate against one preset.
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub verdict: Verdict,
    pub score: i64,
    /// Rejection causes, or notable score contributions on accept.
    pub reasons: Vec<String>,
}

impl ScoreOutcome {
    fn reject(reason: String) -> Self {
        Self {
            verdict: Verdict::Reject,
            score: 0,
            reasons: vec![reason],
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.verdict == Verdict::Accept
    }
}

/// Scores a candidate against a preset and its filters.
///
/// Deterministic: the same inputs always produce the same outcome.
/// Rejection short-circuits in filter, floor, seeder order.
pub fn score_release(
    preset: &QualityPreset,
    filters: &[ReleaseFilter],
    candidate: &CandidateRelease,
) -> ScoreOutcome {
    if let Some(reason) = check_filters(filters, &candidate.title) {
        return ScoreOutcome::reject(reason);
    }

    let resolution = match candidate.attrs.resolution {
        Some(resolution) => resolution,
        None => return ScoreOutcome::reject("resolution not detected".to_string()),
    };
    if resolution < preset.resolution {
        return ScoreOutcome::reject(format!(
            "resolution {} below floor {}",
            resolution.as_keyword(),
            preset.resolution.as_keyword()
        ));
    }

    let source = candidate.attrs.source.unwrap_or(Source::Any);
    if source < preset.source {
        return ScoreOutcome::reject(format!(
            "source {} below floor {}",
            source.as_keyword(),
            preset.source.as_keyword()
        ));
    }

    if candidate.protocol == ReleaseProtocol::Torrent {
        let seeders = candidate.seeders.unwrap_or(0);
        if seeders < preset.min_seeders {
            return ScoreOutcome::reject(format!(
                "{seeders} seeders below minimum {}",
                preset.min_seeders
            ));
        }
    }

    let mut score = 0i64;
    let mut reasons = Vec::new();

    let resolution_steps = resolution as i64 - preset.resolution as i64;
    let resolution_score = RESOLUTION_MATCH - RESOLUTION_STEP_PENALTY * resolution_steps;
    score += resolution_score;
    if resolution_steps == 0 {
        reasons.push(format!("resolution match {}", resolution.as_keyword()));
    }

    if preset.source != Source::Any && source != Source::Any {
        let source_steps = source as i64 - preset.source as i64;
        score += SOURCE_MATCH - SOURCE_STEP_PENALTY * source_steps;
        if source_steps == 0 {
            reasons.push(format!("source match {}", source.as_keyword()));
        }
    }

    if preset.codec != Codec::Any && candidate.attrs.codec == Some(preset.codec) {
        score += CODEC_MATCH;
        reasons.push(format!("codec match {}", preset.codec.as_keyword()));
    }

    if preset.edition != Edition::Any && candidate.attrs.edition == Some(preset.edition) {
        score += EDITION_MATCH;
        reasons.push(format!("edition match {}", preset.edition.as_keyword()));
    }

    for hdr in &preset.hdr_formats {
        if candidate.attrs.hdr_formats.contains(hdr) {
            score += HDR_FORMAT_BONUS;
            reasons.push(format!("hdr {}", hdr.as_keyword()));
        }
    }

    for audio in &preset.audio_formats {
        if candidate.attrs.audio_formats.contains(audio) {
            score += AUDIO_FORMAT_BONUS;
            reasons.push(format!("audio {}", audio.as_keyword()));
        }
    }

    if preset.prefer_season_packs && candidate.attrs.season_pack {
        score += SEASON_PACK_BONUS;
        reasons.push("season pack".to_string());
    }

    if let Some(anime) = &preset.anime {
        if anime.prefer_dual_audio && candidate.attrs.dual_audio {
            score += DUAL_AUDIO_BONUS;
            reasons.push("dual audio".to_string());
        }
        if anime.prefer_dubbed && candidate.attrs.dubbed {
            score += DUBBED_BONUS;
            reasons.push("dubbed".to_string());
        }
        if let (Some(preferred), Some(detected)) =
            (&anime.preferred_language, &candidate.attrs.language)
        {
            if preferred.eq_ignore_ascii_case(detected) {
                score += LANGUAGE_MATCH_BONUS;
                reasons.push(format!("language {detected}"));
            }
        }
    }

    ScoreOutcome {
        verdict: Verdict::Accept,
        score,
        reasons,
    }
}

/// Scores bare attributes, for comparing an existing file against a
/// new candidate. Attributes the preset would reject score below
/// anything accepted.
pub fn score_attrs(preset: &QualityPreset, attrs: &crate::quality::QualityAttrs) -> i64 {
    let candidate = CandidateRelease {
        title: String::new(),
        size_bytes: 0,
        seeders: None,
        protocol: ReleaseProtocol::Usenet,
        indexer_id: String::new(),
        indexer_priority: 0,
        download_url: String::new(),
        publish_date: None,
        attrs: attrs.clone(),
    };
    let outcome = score_release(preset, &[], &candidate);
    if outcome.is_accepted() {
        outcome.score
    } else {
        -1
    }
}

fn check_filters(filters: &[ReleaseFilter], title: &str) -> Option<String> {
    for filter in filters {
        let matched = if filter.is_regex {
            match regex_lite::Regex::new(&filter.value) {
                Ok(re) => re.is_match(title),
                Err(e) => {
                    warn!(filter = %filter.value, error = %e, "invalid filter regex, skipped");
                    continue;
                }
            }
        } else {
            title.to_lowercase().contains(&filter.value.to_lowercase())
        };
        match filter.kind {
            FilterKind::MustContain if !matched => {
                return Some(format!("missing required term '{}'", filter.value));
            }
            FilterKind::MustNotContain if matched => {
                return Some(format!("contains forbidden term '{}'", filter.value));
            }
            _ => {}
        }
    }
    None
}
