//! `reelcast-publish` — brand account registry, platform adapters, and the
//! multi-platform publish dispatcher.
//!
//! The two Meta surfaces differ in shape: Instagram is a three-step flow
//! (create media container, poll until processed, publish container) while
//! Facebook is a single video upload. Both are hidden behind the
//! [`platform::PlatformPublisher`] trait so the dispatcher and the worker
//! never see platform-specific wire detail — and so tests can substitute
//! stub adapters.
//!
//! Retry policy lives with the caller: the dispatcher records every
//! per-platform outcome and aggregates a status, nothing more.

pub mod dispatcher;
pub mod error;
pub mod facebook;
pub mod instagram;
pub mod platform;
pub mod registry;

pub use dispatcher::PublishDispatcher;
pub use error::PublishError;
pub use facebook::FacebookPublisher;
pub use instagram::InstagramPublisher;
pub use platform::PlatformPublisher;
pub use registry::{AccountRegistry, BrandAccount};
