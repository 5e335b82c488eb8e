use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One tenant identity with its own publishing credentials and slot calendar.
///
/// Brands are configuration data, not code: the set of valid brands is
/// whatever the account table in [`ReelcastConfig`](crate::config::ReelcastConfig)
/// declares. Keys are normalised to trimmed lowercase so `"GymCollege"` and
/// `"gymcollege"` address the same account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Brand(String);

impl Brand {
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(key.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Brand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Visual/content mode of a reel. Selects which daily slot template applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Light,
    Dark,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Variant::Light => "light",
            Variant::Dark => "dark",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Variant {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Variant::Light),
            "dark" => Ok(Variant::Dark),
            other => Err(CoreError::UnknownVariant(other.to_string())),
        }
    }
}

/// A publish target. Each platform is attempted independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    Facebook,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Platform {
    type Err = CoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Reference to an externally-rendered media artifact.
///
/// Owned by the generation subsystem; the scheduler stores these URIs
/// verbatim and never fetches or regenerates media. `video_url` must be
/// publicly reachable — Meta's servers download the video themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelRef {
    pub video_url: String,
    pub thumbnail_url: String,
    pub caption: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_is_normalised() {
        assert_eq!(Brand::new("  GymCollege ").as_str(), "gymcollege");
        assert_eq!(Brand::new("gymcollege"), Brand::new("GYMCOLLEGE"));
    }

    #[test]
    fn variant_roundtrip() {
        for v in [Variant::Light, Variant::Dark] {
            let parsed: Variant = v.to_string().parse().expect("parse failed");
            assert_eq!(parsed, v);
        }
        assert!("lighter".parse::<Variant>().is_err());
    }

    #[test]
    fn platform_roundtrip() {
        for p in [Platform::Instagram, Platform::Facebook] {
            let parsed: Platform = p.to_string().parse().expect("parse failed");
            assert_eq!(parsed, p);
        }
        assert!("tiktok".parse::<Platform>().is_err());
    }
}
