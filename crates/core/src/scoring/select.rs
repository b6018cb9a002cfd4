use crate::indexer::CandidateRelease;

/// A candidate together with its accepted score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: CandidateRelease,
    pub score: i64,
}

/// Picks the winner among accepted candidates.
///
/// Ties break by seeder count (descending, usenet counts as zero),
/// then indexer priority (ascending), then size (ascending).
pub fn select_best(scored: &[ScoredCandidate]) -> Option<&ScoredCandidate> {
    scored.iter().min_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| {
                b.candidate
                    .seeders
                    .unwrap_or(0)
                    .cmp(&a.candidate.seeders.unwrap_or(0))
            })
            .then_with(|| {
                a.candidate
                    .indexer_priority
                    .cmp(&b.candidate.indexer_priority)
            })
            .then_with(|| a.candidate.size_bytes.cmp(&b.candidate.size_bytes))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::ReleaseProtocol;
    use crate::quality::parse_release_title;

    fn scored(
        title: &str,
        score: i64,
        seeders: Option<u32>,
        priority: u8,
        size: u64,
    ) -> ScoredCandidate {
        ScoredCandidate {
            candidate: CandidateRelease {
                attrs: parse_release_title(title),
                title: title.to_string(),
                size_bytes: size,
                seeders,
                protocol: ReleaseProtocol::Torrent,
                indexer_id: "idx".to_string(),
                indexer_priority: priority,
                download_url: "magnet:?xt=urn:btih:abc".to_string(),
                publish_date: None,
            },
            score,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_highest_score_wins() {
        let candidates = vec![
            scored("a", 100, Some(1), 1, 1),
            scored("b", 300, Some(1), 1, 1),
            scored("c", 200, Some(1), 1, 1),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.title, "b");
    }

    #[test]
    fn test_tie_breaks_on_seeders() {
        let candidates = vec![
            scored("few", 100, Some(3), 1, 1),
            scored("many", 100, Some(90), 1, 1),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.title, "many");
    }

    #[test]
    fn test_tie_breaks_on_indexer_priority() {
        let candidates = vec![
            scored("low_prio", 100, Some(10), 50, 1),
            scored("high_prio", 100, Some(10), 5, 1),
        ];
        assert_eq!(
            select_best(&candidates).unwrap().candidate.title,
            "high_prio"
        );
    }

    #[test]
    fn test_tie_breaks_on_size_last() {
        let candidates = vec![
            scored("big", 100, Some(10), 5, 9_000_000),
            scored("small", 100, Some(10), 5, 2_000_000),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.title, "small");
    }

    #[test]
    fn test_usenet_seeders_count_as_zero() {
        let candidates = vec![
            scored("usenet", 100, None, 1, 1),
            scored("torrent", 100, Some(1), 1, 1),
        ];
        assert_eq!(select_best(&candidates).unwrap().candidate.title, "torrent");
    }
}
