//! `reelcast-core` — shared domain types, configuration, and base errors.
//!
//! Everything here is passive data: brands, variants, platforms, the opaque
//! reel reference produced by the (external) renderer, and the process-wide
//! configuration structure. No I/O happens in this crate except config
//! loading.

pub mod config;
pub mod error;
pub mod types;

pub use config::ReelcastConfig;
pub use error::{CoreError, Result};
pub use types::{Brand, Platform, ReelRef, Variant};
