mod scorer;
mod select;

pub use scorer::{
    score_attrs, score_release, ScoreOutcome, Verdict, AUDIO_FORMAT_BONUS, CODEC_MATCH, DUAL_AUDIO_BONUS,
    DUBBED_BONUS, EDITION_MATCH, HDR_FORMAT_BONUS, LANGUAGE_MATCH_BONUS, RESOLUTION_MATCH,
    RESOLUTION_STEP_PENALTY, SEASON_PACK_BONUS, SOURCE_MATCH, SOURCE_STEP_PENALTY,
    TRUSTED_GROUP_BONUS, UPGRADE_SCORE_MARGIN,
};
pub use select::{select_best, ScoredCandidate};
