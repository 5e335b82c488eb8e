use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reelcast_core::config::WorkerConfig;
use reelcast_publish::PublishDispatcher;
use reelcast_scheduler::{EntryStatus, ScheduleError, ScheduleStore};
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Background loop that publishes due entries.
///
/// Each sweep claims entries by CAS-ing them `scheduled` → `publishing`, so
/// any number of overlapping sweeps (or a second process on the same
/// database) dispatch each entry at most once. A claim that loses the race
/// is skipped silently — the winner owns the entry.
pub struct PublishWorker {
    store: Arc<ScheduleStore>,
    dispatcher: Arc<PublishDispatcher>,
    poll_interval: Duration,
    max_concurrent: usize,
    stale_after: chrono::Duration,
}

impl PublishWorker {
    pub fn new(
        store: Arc<ScheduleStore>,
        dispatcher: Arc<PublishDispatcher>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            max_concurrent: config.max_concurrent_dispatches.max(1),
            stale_after: chrono::Duration::seconds(config.stale_publishing_secs as i64),
        }
    }

    /// Main loop. Sweeps at the configured interval until `shutdown`
    /// broadcasts `true`. In-flight dispatches finish before a sweep ends,
    /// so shutdown waits at most one sweep.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            max_concurrent = self.max_concurrent,
            "publish worker started"
        );

        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("publish sweep failed: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("publish worker shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One sweep: recover stale claims, then claim and dispatch every due
    /// entry with bounded concurrency.
    ///
    /// Per-entry failures never abort the sweep; each entry's outcome is its
    /// own status row.
    pub async fn tick(&self, now: DateTime<Utc>) -> reelcast_scheduler::Result<()> {
        let released = self.store.release_stale(now, self.stale_after)?;
        if released > 0 {
            warn!(count = released, "released stale publishing entries");
        }

        let due = self.store.due(now)?;
        if due.is_empty() {
            return Ok(());
        }
        debug!(count = due.len(), "due entries found");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        for entry in due {
            let claimed = match self.store.transition(
                &entry.id,
                &[EntryStatus::Scheduled],
                EntryStatus::Publishing,
            ) {
                Ok(claimed) => claimed,
                // Someone else got there first (or the entry was deleted).
                Err(ScheduleError::Conflict { .. }) | Err(ScheduleError::NotFound { .. }) => {
                    continue;
                }
                Err(e) => {
                    error!(entry_id = %entry.id, "claim failed: {e}");
                    continue;
                }
            };

            let dispatcher = Arc::clone(&self.dispatcher);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                // Semaphore is never closed while tasks run.
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                if let Err(e) = dispatcher.dispatch(claimed.clone()).await {
                    error!(entry_id = %claimed.id, "dispatch failed: {e}");
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("dispatch task panicked: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use reelcast_core::config::AccountConfig;
    use reelcast_core::{Brand, Platform, ReelRef, Variant};
    use reelcast_publish::{
        AccountRegistry, BrandAccount, PlatformPublisher, PublishError,
    };
    use reelcast_scheduler::NewEntry;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubPublisher {
        platform: Platform,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubPublisher {
        fn new(platform: Platform, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                platform,
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PlatformPublisher for StubPublisher {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn publish(
            &self,
            _account: &BrandAccount,
            _reel: &ReelRef,
        ) -> Result<String, PublishError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(PublishError::Api {
                    platform: self.platform,
                    message: "stub failure".into(),
                })
            } else {
                Ok(format!("{}-{}", self.platform, n))
            }
        }
    }

    fn store() -> Arc<ScheduleStore> {
        Arc::new(ScheduleStore::new(Connection::open_in_memory().unwrap()).unwrap())
    }

    fn registry() -> Arc<AccountRegistry> {
        Arc::new(AccountRegistry::from_config(&[AccountConfig {
            brand: "gymcollege".into(),
            instagram_account_id: Some("ig-acct".into()),
            instagram_access_token: None,
            facebook_page_id: Some("fb-page".into()),
            facebook_access_token: None,
            access_token: Some("shared".into()),
        }]))
    }

    fn worker(
        store: &Arc<ScheduleStore>,
        publishers: Vec<Arc<dyn PlatformPublisher>>,
    ) -> PublishWorker {
        let dispatcher = Arc::new(PublishDispatcher::new(
            Arc::clone(store),
            registry(),
            publishers,
        ));
        PublishWorker::new(
            Arc::clone(store),
            dispatcher,
            &reelcast_core::config::WorkerConfig::default(),
        )
    }

    fn entry_at(store: &ScheduleStore, hour: u32) -> reelcast_scheduler::ScheduleEntry {
        store
            .create(NewEntry {
                brand: Brand::new("gymcollege"),
                variant: Variant::Light,
                reel: ReelRef {
                    video_url: "https://cdn.example.com/videos/r1.mp4".into(),
                    thumbnail_url: "https://cdn.example.com/thumbnails/r1.png".into(),
                    caption: "Morning routine".into(),
                },
                scheduled_time: Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap(),
                platforms: vec![Platform::Instagram, Platform::Facebook],
            })
            .unwrap()
    }

    #[tokio::test]
    async fn due_entry_is_published_end_to_end() {
        let store = store();
        let entry = entry_at(&store, 8);
        let worker = worker(
            &store,
            vec![
                StubPublisher::new(Platform::Instagram, false),
                StubPublisher::new(Platform::Facebook, false),
            ],
        );

        worker
            .tick(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 30).unwrap())
            .await
            .unwrap();

        let after = store.get(&entry.id).unwrap();
        assert_eq!(after.status, EntryStatus::Published);
        assert!(after.published_at.is_some());
        assert!(after.publish_results[&Platform::Instagram].success);
        assert!(after.publish_results[&Platform::Facebook].success);
    }

    #[tokio::test]
    async fn future_entries_are_left_alone() {
        let store = store();
        let entry = entry_at(&store, 16);
        let worker = worker(
            &store,
            vec![StubPublisher::new(Platform::Instagram, false)],
        );

        worker
            .tick(Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(store.get(&entry.id).unwrap().status, EntryStatus::Scheduled);
    }

    #[tokio::test]
    async fn entry_is_dispatched_exactly_once_across_sweeps() {
        let store = store();
        let entry = entry_at(&store, 8);
        let instagram = StubPublisher::new(Platform::Instagram, false);
        let facebook = StubPublisher::new(Platform::Facebook, false);
        let worker = worker(
            &store,
            vec![
                Arc::clone(&instagram) as Arc<dyn PlatformPublisher>,
                Arc::clone(&facebook) as Arc<dyn PlatformPublisher>,
            ],
        );

        let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        worker.tick(now).await.unwrap();
        worker.tick(now + chrono::Duration::minutes(1)).await.unwrap();

        assert_eq!(instagram.calls.load(Ordering::SeqCst), 1);
        assert_eq!(facebook.calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(&entry.id).unwrap().status, EntryStatus::Published);
    }

    #[tokio::test]
    async fn failed_entry_is_not_swept_again() {
        let store = store();
        let entry = entry_at(&store, 8);
        let instagram = StubPublisher::new(Platform::Instagram, true);
        let facebook = StubPublisher::new(Platform::Facebook, true);
        let worker = worker(
            &store,
            vec![
                Arc::clone(&instagram) as Arc<dyn PlatformPublisher>,
                Arc::clone(&facebook) as Arc<dyn PlatformPublisher>,
            ],
        );

        let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        worker.tick(now).await.unwrap();
        assert_eq!(store.get(&entry.id).unwrap().status, EntryStatus::Failed);

        // Failed entries need an explicit retry; the sweep ignores them.
        worker.tick(now + chrono::Duration::minutes(1)).await.unwrap();
        assert_eq!(instagram.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_publishing_entry_is_recovered_and_republished() {
        let store = store();
        let entry = entry_at(&store, 8);
        store
            .transition(&entry.id, &[EntryStatus::Scheduled], EntryStatus::Publishing)
            .unwrap();

        let worker = worker(
            &store,
            vec![
                StubPublisher::new(Platform::Instagram, false),
                StubPublisher::new(Platform::Facebook, false),
            ],
        );

        // Within the stale window the claim is respected.
        worker.tick(Utc::now()).await.unwrap();
        assert_eq!(store.get(&entry.id).unwrap().status, EntryStatus::Publishing);

        // Past the stale window the entry is released and re-dispatched.
        worker
            .tick(Utc::now() + chrono::Duration::minutes(11))
            .await
            .unwrap();
        assert_eq!(store.get(&entry.id).unwrap().status, EntryStatus::Published);
    }

    #[tokio::test]
    async fn one_bad_entry_does_not_block_the_rest() {
        let store = store();
        // Unknown brand entry fails dispatch; known brand succeeds.
        let bad = store
            .create(NewEntry {
                brand: Brand::new("nobody"),
                variant: Variant::Dark,
                reel: ReelRef {
                    video_url: "https://cdn.example.com/videos/r2.mp4".into(),
                    thumbnail_url: String::new(),
                    caption: String::new(),
                },
                scheduled_time: Utc.with_ymd_and_hms(2026, 1, 1, 4, 0, 0).unwrap(),
                platforms: vec![Platform::Instagram],
            })
            .unwrap();
        let good = entry_at(&store, 8);

        let worker = worker(
            &store,
            vec![
                StubPublisher::new(Platform::Instagram, false),
                StubPublisher::new(Platform::Facebook, false),
            ],
        );
        worker
            .tick(Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(store.get(&bad.id).unwrap().status, EntryStatus::Failed);
        assert_eq!(store.get(&good.id).unwrap().status, EntryStatus::Published);
    }
}
