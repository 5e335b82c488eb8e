use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::Variant;

/// Top-level config (reelcast.toml + REELCAST_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReelcastConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub graph: GraphApiConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    /// One record per brand account. Adding a brand is appending a record
    /// here — never a code change.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Auto-publish sweep settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between due-entry scans.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Upper bound on entries dispatched concurrently within one tick.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_dispatches: usize,
    /// An entry stuck in `publishing` longer than this is released back to
    /// `scheduled` (crash recovery).
    #[serde(default = "default_stale_publishing")]
    pub stale_publishing_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_concurrent_dispatches: default_max_concurrent(),
            stale_publishing_secs: default_stale_publishing(),
        }
    }
}

/// Meta Graph API client settings, shared by both platform adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphApiConfig {
    #[serde(default = "default_graph_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// How many times to poll an Instagram media container for FINISHED.
    #[serde(default = "default_container_poll_attempts")]
    pub container_poll_attempts: u32,
    #[serde(default = "default_container_poll_interval")]
    pub container_poll_interval_secs: u64,
}

impl Default for GraphApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_graph_base_url(),
            request_timeout_secs: default_request_timeout(),
            container_poll_attempts: default_container_poll_attempts(),
            container_poll_interval_secs: default_container_poll_interval(),
        }
    }
}

/// Daily publish windows per variant, as "HH:MM" UTC strings.
///
/// The defaults interleave the two variants at an 8-hour cadence so the two
/// feeds never compete for the same window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_light_slots")]
    pub light_slots: Vec<String>,
    #[serde(default = "default_dark_slots")]
    pub dark_slots: Vec<String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            light_slots: default_light_slots(),
            dark_slots: default_dark_slots(),
        }
    }
}

impl CalendarConfig {
    pub fn slots_for(&self, variant: Variant) -> &[String] {
        match variant {
            Variant::Light => &self.light_slots,
            Variant::Dark => &self.dark_slots,
        }
    }
}

/// Credentials for one brand account.
///
/// `access_token` is the shared Meta token used for any platform whose
/// dedicated token is absent. A platform with no usable id+token pair is
/// simply unavailable for that brand — it never blocks the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub brand: String,
    pub instagram_account_id: Option<String>,
    pub instagram_access_token: Option<String>,
    pub facebook_page_id: Option<String>,
    pub facebook_access_token: Option<String>,
    pub access_token: Option<String>,
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.reelcast/reelcast.db", home)
}
fn default_poll_interval() -> u64 {
    60
}
fn default_max_concurrent() -> usize {
    4
}
fn default_stale_publishing() -> u64 {
    600
}
fn default_graph_base_url() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_container_poll_attempts() -> u32 {
    10
}
fn default_container_poll_interval() -> u64 {
    3
}
fn default_light_slots() -> Vec<String> {
    vec!["00:00".into(), "08:00".into(), "16:00".into()]
}
fn default_dark_slots() -> Vec<String> {
    vec!["04:00".into(), "12:00".into(), "20:00".into()]
}

impl ReelcastConfig {
    /// Load config from a TOML file with REELCAST_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.reelcast/reelcast.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: ReelcastConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("REELCAST_").split("_"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.reelcast/reelcast.toml", home)
}
