//! `reelcast-worker` — the auto-publish background loop.
//!
//! A single [`engine::PublishWorker`] polls the schedule store at a fixed
//! cadence, claims due entries with a compare-and-set status transition,
//! and hands each claimed entry to the publish dispatcher with bounded
//! concurrency. Stale `publishing` claims left behind by a crashed process
//! are released back to `scheduled` at the start of every sweep.

pub mod engine;

pub use engine::PublishWorker;
