use super::store::{TrustError, TrustStore};
use super::types::normalize_title;
use crate::indexer::CandidateRelease;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Gate verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admittance {
    /// Candidate may proceed to scoring. `trusted_group` grants the
    /// trusted bonus downstream.
    Admitted { trusted_group: bool },
    Refused { reason: String },
}

impl Admittance {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admittance::Admitted { .. })
    }
}

/// Checks a candidate against exclusions, the blocklist and group
/// blocks, in that order.
pub struct TrustGate {
    store: Arc<dyn TrustStore>,
}

impl TrustGate {
    pub fn new(store: Arc<dyn TrustStore>) -> Self {
        Self { store }
    }

    pub fn admit(
        &self,
        candidate: &CandidateRelease,
        media_id: i64,
        library_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Admittance, TrustError> {
        if self
            .store
            .is_excluded(media_id, &candidate.indexer_id, library_id)?
        {
            return Ok(Admittance::Refused {
                reason: "excluded".to_string(),
            });
        }

        let normalized = normalize_title(&candidate.title);
        if self
            .store
            .is_blocklisted(&normalized, &candidate.indexer_id, media_id, now)?
        {
            return Ok(Admittance::Refused {
                reason: "blocklisted".to_string(),
            });
        }

        if let Some(group) = &candidate.attrs.release_group {
            // Trusted membership overrides a block on the same group.
            if self.store.is_group_trusted(group)? {
                return Ok(Admittance::Admitted {
                    trusted_group: true,
                });
            }
            if self.store.is_group_blocked(group)? {
                return Ok(Admittance::Refused {
                    reason: format!("release group '{group}' is blocked"),
                });
            }
        }

        Ok(Admittance::Admitted {
            trusted_group: false,
        })
    }
}
