//! `reelcast-orchestrator` — the thin coordination surface callers talk to.
//!
//! The [`Orchestrator`] wires the slot calendar, the schedule store, and the
//! publish dispatcher together behind a handful of operations: schedule at
//! an explicit time, schedule into the next free slot, list, inspect,
//! unschedule, and retry. It owns no policy of its own — slot choice
//! belongs to the calendar, state transitions to the store, publishing to
//! the dispatcher.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, ScheduleRequest};
