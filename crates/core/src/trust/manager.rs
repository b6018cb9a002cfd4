use super::store::{TrustError, TrustStore};
use super::types::BlocklistSpec;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Records download failures: blocklists the failed release for a
/// while, counts the failure against its release group, and
/// auto-blocks the group once it hits the threshold.
pub struct TrustManager {
    store: Arc<dyn TrustStore>,
    group_failure_threshold: u32,
    failure_blocklist_ttl: Duration,
}

impl TrustManager {
    pub fn new(
        store: Arc<dyn TrustStore>,
        group_failure_threshold: u32,
        failure_blocklist_ttl_hours: u32,
    ) -> Self {
        Self {
            store,
            group_failure_threshold,
            failure_blocklist_ttl: Duration::hours(failure_blocklist_ttl_hours as i64),
        }
    }

    pub fn record_release_failure(
        &self,
        release_title: &str,
        release_group: Option<&str>,
        indexer_id: &str,
        media_id: i64,
        reason: &str,
    ) -> Result<(), TrustError> {
        self.record(
            release_title,
            release_group,
            indexer_id,
            media_id,
            reason,
            Some(Utc::now() + self.failure_blocklist_ttl),
        )
    }

    /// Blocklists a release for good, once it has exhausted its retries.
    pub fn record_permanent_failure(
        &self,
        release_title: &str,
        release_group: Option<&str>,
        indexer_id: &str,
        media_id: i64,
        reason: &str,
    ) -> Result<(), TrustError> {
        self.record(release_title, release_group, indexer_id, media_id, reason, None)
    }

    fn record(
        &self,
        release_title: &str,
        release_group: Option<&str>,
        indexer_id: &str,
        media_id: i64,
        reason: &str,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<(), TrustError> {
        self.store.add_blocklist_entry(&BlocklistSpec {
            release_title: release_title.to_string(),
            release_group: release_group.map(str::to_string),
            indexer_id: Some(indexer_id.to_string()),
            media_id: Some(media_id),
            reason: reason.to_string(),
            expires_at,
        })?;
        info!(title = %release_title, %reason, "release blocklisted after failure");

        if let Some(group) = release_group {
            let failures = self.store.record_group_failure(group)?;
            if failures >= self.group_failure_threshold && !self.store.is_group_blocked(group)? {
                self.store.block_group(group, true)?;
                warn!(%group, failures, "release group auto-blocked");
            }
        }
        Ok(())
    }

    /// Removes expired blocklist entries.
    pub fn expire_blocklist(&self) -> Result<usize, TrustError> {
        let removed = self.store.delete_expired(Utc::now())?;
        if removed > 0 {
            info!(removed, "expired blocklist entries removed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::{normalize_title, SqliteTrustStore};

    fn manager(threshold: u32) -> (TrustManager, Arc<SqliteTrustStore>) {
        let store = Arc::new(SqliteTrustStore::in_memory().unwrap());
        (TrustManager::new(store.clone(), threshold, 24), store)
    }

    #[test]
    fn test_failure_blocklists_release_with_ttl() {
        let (manager, store) = manager(5);
        manager
            .record_release_failure("Bad.Release.1080p-GRP", Some("GRP"), "idx", 1, "stalled")
            .unwrap();

        let entries = store.list_blocklist().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].expires_at.is_some());
        assert!(store
            .is_blocklisted(
                &normalize_title("Bad.Release.1080p-GRP"),
                "idx",
                1,
                Utc::now()
            )
            .unwrap());
    }

    #[test]
    fn test_group_auto_blocked_at_threshold() {
        let (manager, store) = manager(3);
        for i in 0..2 {
            manager
                .record_release_failure(
                    &format!("Release.{i}.1080p-GRP"),
                    Some("GRP"),
                    "idx",
                    1,
                    "failed",
                )
                .unwrap();
            assert!(!store.is_group_blocked("grp").unwrap());
        }

        manager
            .record_release_failure("Release.2.1080p-GRP", Some("GRP"), "idx", 1, "failed")
            .unwrap();
        assert!(store.is_group_blocked("grp").unwrap());
        assert!(store.list_blocked_groups().unwrap()[0].auto_blocked);
    }

    #[test]
    fn test_permanent_failure_never_expires() {
        let (manager, store) = manager(5);
        manager
            .record_permanent_failure("Bad.Release.1080p-GRP", Some("GRP"), "idx", 1, "retries")
            .unwrap();

        let entries = store.list_blocklist().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].expires_at.is_none());
        assert_eq!(manager.expire_blocklist().unwrap(), 0);
    }

    #[test]
    fn test_failure_without_group_only_blocklists() {
        let (manager, store) = manager(1);
        manager
            .record_release_failure("Anonymous.Release.1080p", None, "idx", 1, "failed")
            .unwrap();
        assert_eq!(store.list_blocklist().unwrap().len(), 1);
        assert!(store.list_blocked_groups().unwrap().is_empty());
    }
}
