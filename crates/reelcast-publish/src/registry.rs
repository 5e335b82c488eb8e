use std::collections::HashMap;

use reelcast_core::{config::AccountConfig, Brand, Platform};
use tracing::{info, warn};

use crate::error::{PublishError, Result};

/// Instagram Business account credentials for one brand.
#[derive(Debug, Clone)]
pub struct InstagramCredentials {
    pub account_id: String,
    pub access_token: String,
}

/// Facebook Page credentials for one brand.
#[derive(Debug, Clone)]
pub struct FacebookCredentials {
    pub page_id: String,
    pub access_token: String,
}

/// Resolved credentials for one brand. A platform slot is `None` when the
/// config record lacked a usable id+token pair for it — the brand stays
/// schedulable, and dispatch records a missing-credentials failure for that
/// platform only.
#[derive(Debug, Clone)]
pub struct BrandAccount {
    pub brand: Brand,
    pub instagram: Option<InstagramCredentials>,
    pub facebook: Option<FacebookCredentials>,
}

impl BrandAccount {
    pub fn instagram(&self) -> Result<&InstagramCredentials> {
        self.instagram
            .as_ref()
            .ok_or_else(|| PublishError::MissingCredentials {
                brand: self.brand.clone(),
                platform: Platform::Instagram,
            })
    }

    pub fn facebook(&self) -> Result<&FacebookCredentials> {
        self.facebook
            .as_ref()
            .ok_or_else(|| PublishError::MissingCredentials {
                brand: self.brand.clone(),
                platform: Platform::Facebook,
            })
    }
}

/// Maps brand keys to platform credentials.
///
/// Built once at startup from the config's account table and read-only
/// afterwards. Adding a brand is appending a config record; there is no
/// per-brand code anywhere.
pub struct AccountRegistry {
    accounts: HashMap<Brand, BrandAccount>,
}

impl AccountRegistry {
    /// Build the registry, logging per-brand credential status.
    ///
    /// A platform token falls back to the record's shared `access_token`
    /// when the dedicated one is absent. Incomplete platforms are warned
    /// about but never fail startup — other brands and platforms stay
    /// usable.
    pub fn from_config(accounts: &[AccountConfig]) -> Self {
        let mut map = HashMap::new();
        for record in accounts {
            let brand = Brand::new(&record.brand);
            if brand.is_empty() {
                warn!("skipping account record with empty brand key");
                continue;
            }

            let instagram = match (
                &record.instagram_account_id,
                record
                    .instagram_access_token
                    .as_ref()
                    .or(record.access_token.as_ref()),
            ) {
                (Some(account_id), Some(token)) => Some(InstagramCredentials {
                    account_id: account_id.clone(),
                    access_token: token.clone(),
                }),
                _ => None,
            };
            let facebook = match (
                &record.facebook_page_id,
                record
                    .facebook_access_token
                    .as_ref()
                    .or(record.access_token.as_ref()),
            ) {
                (Some(page_id), Some(token)) => Some(FacebookCredentials {
                    page_id: page_id.clone(),
                    access_token: token.clone(),
                }),
                _ => None,
            };

            if instagram.is_none() {
                warn!(brand = %brand, "instagram credentials incomplete for brand");
            }
            if facebook.is_none() {
                warn!(brand = %brand, "facebook credentials incomplete for brand");
            }
            info!(
                brand = %brand,
                instagram = instagram.is_some(),
                facebook = facebook.is_some(),
                "loaded brand account"
            );

            map.insert(
                brand.clone(),
                BrandAccount {
                    brand,
                    instagram,
                    facebook,
                },
            );
        }

        if map.is_empty() {
            warn!("no brand accounts configured; all dispatches will fail");
        }
        Self { accounts: map }
    }

    /// Look up a brand's account record.
    pub fn resolve(&self, brand: &Brand) -> Result<&BrandAccount> {
        self.accounts
            .get(brand)
            .ok_or_else(|| PublishError::UnknownBrand(brand.clone()))
    }

    /// All configured brand keys, sorted for deterministic output.
    pub fn brands(&self) -> Vec<Brand> {
        let mut brands: Vec<Brand> = self.accounts.keys().cloned().collect();
        brands.sort();
        brands
    }
}
