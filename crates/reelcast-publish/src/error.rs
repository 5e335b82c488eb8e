use reelcast_core::{Brand, Platform};
use thiserror::Error;

/// Errors that can occur while publishing to an external platform.
///
/// Transient failures (timeouts, 5xx) and permanent ones (bad token, API
/// rejection) are deliberately not distinguished here — both end up as a
/// failed platform result, and the retry decision belongs to the caller.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Transport-level failure (connect, timeout, non-JSON body).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The Graph API returned an error payload or an unusable response.
    #[error("{platform} API error: {message}")]
    Api { platform: Platform, message: String },

    /// The brand exists but has no usable credentials for this platform.
    #[error("Missing {platform} credentials for brand '{brand}'")]
    MissingCredentials { brand: Brand, platform: Platform },

    /// The brand has no account record at all.
    #[error("No account configured for brand '{0}'")]
    UnknownBrand(Brand),
}

pub type Result<T> = std::result::Result<T, PublishError>;
