use std::sync::Arc;

use chrono::{DateTime, Utc};
use reelcast_core::{Brand, Platform, ReelRef, Variant};
use reelcast_publish::PublishDispatcher;
use reelcast_scheduler::{
    EntryFilter, EntryStatus, NewEntry, Result, ScheduleEntry, ScheduleStore, SlotCalendar,
};
use tracing::info;

/// What a caller wants published, minus the when.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub brand: Brand,
    pub variant: Variant,
    pub reel: ReelRef,
    pub platforms: Vec<Platform>,
}

impl ScheduleRequest {
    fn into_entry(self, scheduled_time: DateTime<Utc>) -> NewEntry {
        NewEntry {
            brand: self.brand,
            variant: self.variant,
            reel: self.reel,
            scheduled_time,
            platforms: self.platforms,
        }
    }
}

/// Coordination facade over the calendar, the store, and the dispatcher.
pub struct Orchestrator {
    store: Arc<ScheduleStore>,
    calendar: SlotCalendar,
    dispatcher: Arc<PublishDispatcher>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<ScheduleStore>,
        calendar: SlotCalendar,
        dispatcher: Arc<PublishDispatcher>,
    ) -> Self {
        Self {
            store,
            calendar,
            dispatcher,
        }
    }

    /// Schedule a reel at an explicit time the caller has chosen.
    ///
    /// The slot-collision guard in the store still applies: an exact
    /// brand+variant+time duplicate is rejected.
    pub fn schedule_at(
        &self,
        request: ScheduleRequest,
        scheduled_time: DateTime<Utc>,
    ) -> Result<ScheduleEntry> {
        self.store.create(request.into_entry(scheduled_time))
    }

    /// Schedule a reel into the next free calendar slot after `after`.
    ///
    /// Occupancy is read at the moment of the call; the store's collision
    /// guard catches the (rare) race where two callers compute the same
    /// slot simultaneously.
    pub fn schedule_auto(
        &self,
        request: ScheduleRequest,
        after: DateTime<Utc>,
    ) -> Result<ScheduleEntry> {
        let slot = self.next_slot(&request.brand, request.variant, after)?;
        let entry = self.store.create(request.into_entry(slot))?;
        info!(entry_id = %entry.id, brand = %entry.brand, slot = %slot,
              "auto-scheduled into next free slot");
        Ok(entry)
    }

    /// The next free slot for a brand+variant, without booking it.
    pub fn next_slot(
        &self,
        brand: &Brand,
        variant: Variant,
        after: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let booked = self.store.booked_times(brand, variant)?;
        self.calendar.next_slot(variant, after, &booked)
    }

    /// List entries, optionally filtered by brand, variant, or status.
    pub fn list(&self, filter: &EntryFilter) -> Result<Vec<ScheduleEntry>> {
        self.store.list(filter)
    }

    /// Fetch a single entry.
    pub fn get(&self, id: &str) -> Result<ScheduleEntry> {
        self.store.get(id)
    }

    /// Remove an entry outright, whatever its status.
    pub fn unschedule(&self, id: &str) -> Result<()> {
        self.store.delete(id)
    }

    /// Re-attempt a failed or partial entry immediately.
    ///
    /// Claims the entry with the same compare-and-set the worker uses, then
    /// dispatches in-line. Platforms that already succeeded are skipped by
    /// the dispatcher; only the failed ones are re-attempted. Returns the
    /// entry as recorded after the attempt.
    pub async fn retry(&self, id: &str) -> Result<ScheduleEntry> {
        let claimed = self.store.transition(
            id,
            &[EntryStatus::Failed, EntryStatus::Partial],
            EntryStatus::Publishing,
        )?;
        info!(entry_id = %id, "manual retry claimed entry");

        self.dispatcher.dispatch(claimed).await?;
        self.store.get(id)
    }
}
