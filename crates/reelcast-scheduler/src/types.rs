use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reelcast_core::{Brand, Platform, ReelRef, Variant};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting for its scheduled time.
    Scheduled,
    /// Claimed by a dispatcher; a publish attempt is in flight.
    Publishing,
    /// Every requested platform succeeded.
    Published,
    /// At least one platform succeeded and at least one failed.
    Partial,
    /// Every requested platform failed.
    Failed,
}

impl EntryStatus {
    /// Statuses a manual retry may start from.
    pub fn is_retryable(self) -> bool {
        matches!(self, EntryStatus::Failed | EntryStatus::Partial)
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryStatus::Scheduled => "scheduled",
            EntryStatus::Publishing => "publishing",
            EntryStatus::Published => "published",
            EntryStatus::Partial => "partial",
            EntryStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(EntryStatus::Scheduled),
            "publishing" => Ok(EntryStatus::Publishing),
            "published" => Ok(EntryStatus::Published),
            "partial" => Ok(EntryStatus::Partial),
            "failed" => Ok(EntryStatus::Failed),
            other => Err(format!("unknown entry status: {other}")),
        }
    }
}

/// Outcome of one platform attempt. Kept forever as an audit trail —
/// a successful result is never replaced by a later failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlatformResult {
    pub fn ok(post_id: impl Into<String>) -> Self {
        Self {
            success: true,
            post_id: Some(post_id.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            post_id: None,
            error: Some(error.into()),
        }
    }
}

/// Per-platform results, accumulated across attempts.
pub type PublishResults = BTreeMap<Platform, PlatformResult>;

/// A persisted schedule entry — one planned or completed publish action for
/// one reel across one or more platforms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// UUID v4 string — primary key, immutable.
    pub id: String,
    pub brand: Brand,
    pub variant: Variant,
    /// Renderer output this entry will publish. Stored by reference only.
    pub reel: ReelRef,
    /// Absolute UTC due time.
    pub scheduled_time: DateTime<Utc>,
    /// Target platforms, each attempted independently.
    pub platforms: Vec<Platform>,
    pub status: EntryStatus,
    pub publish_results: PublishResults,
    /// Summary of the most recent failed attempt, if any.
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when the entry first reaches `published` or `partial`.
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Spec for creating a new entry. Validated by the store before insert.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub brand: Brand,
    pub variant: Variant,
    pub reel: ReelRef,
    pub scheduled_time: DateTime<Utc>,
    pub platforms: Vec<Platform>,
}

/// Optional filters for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub brand: Option<Brand>,
    pub variant: Option<Variant>,
    pub status: Option<EntryStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in [
            EntryStatus::Scheduled,
            EntryStatus::Publishing,
            EntryStatus::Published,
            EntryStatus::Partial,
            EntryStatus::Failed,
        ] {
            let parsed: EntryStatus = s.to_string().parse().expect("parse failed");
            assert_eq!(parsed, s);
        }
        assert!("pending".parse::<EntryStatus>().is_err());
    }

    #[test]
    fn retryable_statuses() {
        assert!(EntryStatus::Failed.is_retryable());
        assert!(EntryStatus::Partial.is_retryable());
        assert!(!EntryStatus::Published.is_retryable());
        assert!(!EntryStatus::Scheduled.is_retryable());
        assert!(!EntryStatus::Publishing.is_retryable());
    }

    #[test]
    fn publish_results_serialize_with_platform_keys() {
        let mut results = PublishResults::new();
        results.insert(Platform::Instagram, PlatformResult::ok("ig-123"));
        results.insert(Platform::Facebook, PlatformResult::failed("timeout"));

        let json = serde_json::to_string(&results).expect("encode failed");
        assert!(json.contains("\"instagram\""));
        assert!(json.contains("\"facebook\""));

        let back: PublishResults = serde_json::from_str(&json).expect("decode failed");
        assert_eq!(back, results);
        assert_eq!(back[&Platform::Instagram].post_id.as_deref(), Some("ig-123"));
    }
}
