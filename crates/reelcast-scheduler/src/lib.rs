//! `reelcast-scheduler` — slot calendar and durable schedule store.
//!
//! # Overview
//!
//! Schedule entries are persisted to a SQLite `entries` table. The
//! [`store::ScheduleStore`] is the single source of truth for entry state;
//! every status mutation goes through its compare-and-set primitive
//! ([`store::ScheduleStore::transition`]), which is what keeps overlapping
//! worker ticks and manual retries from double-publishing an entry.
//!
//! The [`calendar::SlotCalendar`] is a pure allocator: given a variant's
//! fixed daily time-of-day template and the already-booked times for a
//! brand+variant, it returns the next free absolute slot. It never mutates
//! anything.
//!
//! # Status lifecycle
//!
//! | Status       | Meaning                                             |
//! |--------------|-----------------------------------------------------|
//! | `scheduled`  | Waiting for its scheduled_time                      |
//! | `publishing` | Claimed by a dispatcher; attempt in flight          |
//! | `published`  | Every requested platform succeeded                  |
//! | `partial`    | At least one platform succeeded, at least one failed|
//! | `failed`     | Every requested platform failed                     |
//!
//! Transitions are monotonic except the explicit retry path
//! (`failed`/`partial` → `publishing`).

pub mod calendar;
pub mod db;
pub mod error;
pub mod store;
pub mod types;

pub use calendar::SlotCalendar;
pub use error::{Result, ScheduleError};
pub use store::ScheduleStore;
pub use types::{EntryFilter, EntryStatus, NewEntry, PlatformResult, PublishResults, ScheduleEntry};
