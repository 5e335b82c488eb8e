use std::sync::Arc;

use chrono::Utc;
use reelcast_scheduler::{
    EntryStatus, PlatformResult, PublishResults, ScheduleEntry, ScheduleError, ScheduleStore,
};
use tracing::{error, info, warn};

use crate::{platform::PlatformPublisher, registry::AccountRegistry};

/// Drives one publish attempt for an entry across all of its platforms.
///
/// The caller must already have claimed the entry (status `publishing`).
/// Platforms are attempted independently: one failing never prevents the
/// others, and a platform that already succeeded in an earlier attempt is
/// never re-published. The aggregate status and per-platform results are
/// written back through the store in one update.
pub struct PublishDispatcher {
    store: Arc<ScheduleStore>,
    registry: Arc<AccountRegistry>,
    publishers: Vec<Arc<dyn PlatformPublisher>>,
}

impl PublishDispatcher {
    pub fn new(
        store: Arc<ScheduleStore>,
        registry: Arc<AccountRegistry>,
        publishers: Vec<Arc<dyn PlatformPublisher>>,
    ) -> Self {
        Self {
            store,
            registry,
            publishers,
        }
    }

    /// Attempt every pending platform of a claimed entry and record the
    /// aggregate outcome.
    ///
    /// Never returns an error for publish failures — those become the
    /// entry's `failed`/`partial` status. Only the final store write can
    /// fail, and an entry deleted mid-flight is logged and dropped rather
    /// than resurrected.
    pub async fn dispatch(&self, entry: ScheduleEntry) -> reelcast_scheduler::Result<()> {
        let mut results: PublishResults = entry.publish_results.clone();
        let mut newly_succeeded = false;

        for platform in &entry.platforms {
            if results.get(platform).is_some_and(|r| r.success) {
                continue;
            }

            let result = self.attempt(&entry, *platform).await;
            if result.success {
                newly_succeeded = true;
            }
            results.insert(*platform, result);
        }

        let succeeded = entry
            .platforms
            .iter()
            .filter(|p| results.get(*p).is_some_and(|r| r.success))
            .count();
        let status = if succeeded == entry.platforms.len() {
            EntryStatus::Published
        } else if succeeded > 0 {
            EntryStatus::Partial
        } else {
            EntryStatus::Failed
        };

        let last_error = match status {
            EntryStatus::Published => None,
            _ => {
                let failures: Vec<String> = entry
                    .platforms
                    .iter()
                    .filter_map(|p| {
                        let r = results.get(p)?;
                        if r.success {
                            return None;
                        }
                        Some(format!(
                            "{p}: {}",
                            r.error.as_deref().unwrap_or("unknown error")
                        ))
                    })
                    .collect();
                Some(failures.join("; "))
            }
        };
        let published_at = if newly_succeeded {
            Some(Utc::now())
        } else {
            None
        };

        match self.store.record_outcome(
            &entry.id,
            status,
            &results,
            published_at,
            last_error.as_deref(),
        ) {
            Ok(()) => {
                info!(entry_id = %entry.id, brand = %entry.brand, %status,
                      "publish attempt recorded");
                Ok(())
            }
            Err(ScheduleError::NotFound { .. }) => {
                warn!(entry_id = %entry.id, "entry deleted during dispatch; dropping outcome");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn attempt(
        &self,
        entry: &ScheduleEntry,
        platform: reelcast_core::Platform,
    ) -> PlatformResult {
        let Some(publisher) = self.publishers.iter().find(|p| p.platform() == platform) else {
            warn!(entry_id = %entry.id, %platform, "no adapter registered for platform");
            return PlatformResult::failed("no adapter registered for platform");
        };
        let account = match self.registry.resolve(&entry.brand) {
            Ok(account) => account,
            Err(e) => {
                warn!(entry_id = %entry.id, brand = %entry.brand, %platform, %e,
                      "cannot resolve brand account");
                return PlatformResult::failed(e.to_string());
            }
        };

        match publisher.publish(account, &entry.reel).await {
            Ok(post_id) => {
                info!(entry_id = %entry.id, brand = %entry.brand, %platform, %post_id,
                      "platform publish succeeded");
                PlatformResult::ok(post_id)
            }
            Err(e) => {
                error!(entry_id = %entry.id, brand = %entry.brand, %platform, %e,
                       "platform publish failed");
                PlatformResult::failed(e.to_string())
            }
        }
    }
}
