use super::types::{DelayDecision, DelayProfile};
use crate::quality::QualityAttrs;
use chrono::{DateTime, Duration, Utc};

/// Decides whether an accepted candidate is grabbed immediately or
/// deferred until the profile's delay has elapsed.
///
/// Pure: the caller supplies `now`, so `eligible_at` is always in the
/// future relative to it.
pub fn evaluate(
    attrs: &QualityAttrs,
    score: i64,
    profile: Option<&DelayProfile>,
    now: DateTime<Utc>,
) -> DelayDecision {
    let profile = match profile {
        Some(p) if p.enabled && p.delay_minutes > 0 => p,
        _ => return DelayDecision::GrabNow,
    };

    if let Some(bypass) = &profile.bypass {
        let resolution_ok = match (bypass.resolution_at_least, attrs.resolution) {
            (Some(min), Some(actual)) => actual >= min,
            _ => false,
        };
        let source_ok = match (bypass.source_at_least, attrs.source) {
            (Some(min), Some(actual)) => actual >= min,
            _ => false,
        };
        let score_ok = bypass.score_above.is_some_and(|min| score > min);
        if resolution_ok || source_ok || score_ok {
            return DelayDecision::GrabNow;
        }
    }

    DelayDecision::Defer {
        eligible_at: now + Duration::minutes(profile.delay_minutes as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::BypassConditions;
    use crate::quality::{parse_release_title, Resolution, Source};

    fn profile(delay_minutes: u32, bypass: Option<BypassConditions>) -> DelayProfile {
        DelayProfile {
            id: 1,
            name: "default".to_string(),
            enabled: true,
            delay_minutes,
            library_id: None,
            bypass,
        }
    }

    fn attrs(title: &str) -> QualityAttrs {
        parse_release_title(title)
    }

    #[test]
    fn test_no_profile_grabs_now() {
        let decision = evaluate(&attrs("Show.1080p.WEB-GRP"), 1500, None, Utc::now());
        assert_eq!(decision, DelayDecision::GrabNow);
    }

    #[test]
    fn test_disabled_profile_grabs_now() {
        let mut p = profile(60, None);
        p.enabled = false;
        let decision = evaluate(&attrs("Show.1080p.WEB-GRP"), 1500, Some(&p), Utc::now());
        assert_eq!(decision, DelayDecision::GrabNow);
    }

    #[test]
    fn test_sixty_minute_delay_defers() {
        let now = Utc::now();
        let p = profile(60, None);
        match evaluate(&attrs("Show.1080p.WEB-GRP"), 1500, Some(&p), now) {
            DelayDecision::Defer { eligible_at } => {
                assert_eq!(eligible_at, now + Duration::minutes(60));
                assert!(eligible_at > now);
            }
            other => panic!("expected defer, got {other:?}"),
        }
    }

    #[test]
    fn test_resolution_bypass() {
        let p = profile(
            60,
            Some(BypassConditions {
                resolution_at_least: Some(Resolution::R2160p),
                ..Default::default()
            }),
        );
        assert_eq!(
            evaluate(&attrs("Show.2160p.WEB-GRP"), 100, Some(&p), Utc::now()),
            DelayDecision::GrabNow
        );
        assert!(matches!(
            evaluate(&attrs("Show.1080p.WEB-GRP"), 100, Some(&p), Utc::now()),
            DelayDecision::Defer { .. }
        ));
    }

    #[test]
    fn test_source_bypass() {
        let p = profile(
            60,
            Some(BypassConditions {
                source_at_least: Some(Source::Remux),
                ..Default::default()
            }),
        );
        assert_eq!(
            evaluate(
                &attrs("Show.2160p.BluRay.REMUX-GRP"),
                100,
                Some(&p),
                Utc::now()
            ),
            DelayDecision::GrabNow
        );
    }

    #[test]
    fn test_score_bypass_is_strict() {
        let p = profile(
            60,
            Some(BypassConditions {
                score_above: Some(1500),
                ..Default::default()
            }),
        );
        assert!(matches!(
            evaluate(&attrs("Show.1080p.WEB-GRP"), 1500, Some(&p), Utc::now()),
            DelayDecision::Defer { .. }
        ));
        assert_eq!(
            evaluate(&attrs("Show.1080p.WEB-GRP"), 1501, Some(&p), Utc::now()),
            DelayDecision::GrabNow
        );
    }

    #[test]
    fn test_bypass_conditions_are_or() {
        let p = profile(
            60,
            Some(BypassConditions {
                resolution_at_least: Some(Resolution::R2160p),
                source_at_least: None,
                score_above: Some(9000),
            }),
        );
        // Fails the score condition but meets the resolution one.
        assert_eq!(
            evaluate(&attrs("Show.2160p.WEB-GRP"), 100, Some(&p), Utc::now()),
            DelayDecision::GrabNow
        );
    }

    #[test]
    fn test_undetected_attr_cannot_bypass() {
        let p = profile(
            60,
            Some(BypassConditions {
                resolution_at_least: Some(Resolution::R720p),
                ..Default::default()
            }),
        );
        assert!(matches!(
            evaluate(&QualityAttrs::default(), 100, Some(&p), Utc::now()),
            DelayDecision::Defer { .. }
        ));
    }
}
