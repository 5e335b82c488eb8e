use async_trait::async_trait;
use reelcast_core::{Platform, ReelRef};
use serde::Deserialize;

use crate::{
    error::{PublishError, Result},
    registry::BrandAccount,
};

/// Common interface implemented by every platform adapter.
///
/// Implementations must be `Send + Sync` so the dispatcher can drive them
/// from concurrent Tokio tasks. An adapter pulls its own credentials out of
/// the [`BrandAccount`] and fails with `MissingCredentials` when the brand
/// has none for its platform.
#[async_trait]
pub trait PlatformPublisher: Send + Sync {
    /// Which platform this adapter publishes to.
    fn platform(&self) -> Platform;

    /// Publish one reel for one brand. Returns the platform post id.
    ///
    /// Any failure (transport, auth, API rejection) surfaces as a
    /// [`PublishError`]; the dispatcher records it per-platform and never
    /// lets it abort sibling platforms.
    async fn publish(&self, account: &BrandAccount, reel: &ReelRef) -> Result<String>;
}

/// Error object embedded in a Graph API error payload.
#[derive(Debug, Deserialize)]
pub struct GraphError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
}

/// Generic Graph API response: either an `id` or an `error` object.
///
/// Both the container-create, media-publish, and video-upload calls answer
/// in this shape.
#[derive(Debug, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub error: Option<GraphError>,
}

impl GraphResponse {
    /// Extract the id, converting an error payload (or a missing id) into a
    /// [`PublishError::Api`].
    pub fn into_id(self, platform: Platform) -> Result<String> {
        if let Some(error) = self.error {
            let message = error
                .message
                .unwrap_or_else(|| format!("unknown Graph API error (code {:?})", error.code));
            return Err(PublishError::Api { platform, message });
        }
        self.id.ok_or_else(|| PublishError::Api {
            platform,
            message: "response contained neither id nor error".into(),
        })
    }
}
