use async_trait::async_trait;
use reelcast_core::{config::GraphApiConfig, Platform, ReelRef};
use reqwest::Client;
use tracing::info;

use crate::{
    error::Result,
    platform::{GraphResponse, PlatformPublisher},
    registry::BrandAccount,
};

/// Publishes reels to a Facebook Page via the Graph API video upload.
///
/// Unlike Instagram there is no container step: one POST with the hosted
/// video URL and the Page ingests it server-side.
pub struct FacebookPublisher {
    client: Client,
    base_url: String,
}

impl FacebookPublisher {
    pub fn new(client: Client, graph: &GraphApiConfig) -> Self {
        Self {
            client,
            base_url: graph.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PlatformPublisher for FacebookPublisher {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    async fn publish(&self, account: &BrandAccount, reel: &ReelRef) -> Result<String> {
        let creds = account.facebook()?;

        let url = format!("{}/{}/videos", self.base_url, creds.page_id);
        let mut form = vec![
            ("file_url", reel.video_url.clone()),
            ("description", reel.caption.clone()),
            ("access_token", creds.access_token.clone()),
        ];
        if !reel.thumbnail_url.is_empty() {
            form.push(("thumb", reel.thumbnail_url.clone()));
        }

        let response: GraphResponse = self.client.post(&url).form(&form).send().await?.json().await?;
        let video_id = response.into_id(Platform::Facebook)?;
        info!(brand = %account.brand, video_id, "published reel to facebook");
        Ok(video_id)
    }
}
