use std::time::Duration;

use async_trait::async_trait;
use reelcast_core::{config::GraphApiConfig, Platform, ReelRef};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    error::{PublishError, Result},
    platform::{GraphResponse, PlatformPublisher},
    registry::BrandAccount,
};

/// Publishes reels to an Instagram Business account via the Graph API.
///
/// Instagram ingests video asynchronously: a media container is created
/// first, then polled until Meta reports `FINISHED`, and only then can it
/// be published. A container that reports `ERROR`/`EXPIRED` or never
/// finishes within the poll budget fails the attempt.
pub struct InstagramPublisher {
    client: Client,
    base_url: String,
    poll_attempts: u32,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct ContainerStatus {
    #[serde(default)]
    status_code: Option<String>,
}

impl InstagramPublisher {
    pub fn new(client: Client, graph: &GraphApiConfig) -> Self {
        Self {
            client,
            base_url: graph.base_url.trim_end_matches('/').to_string(),
            poll_attempts: graph.container_poll_attempts,
            poll_interval: Duration::from_secs(graph.container_poll_interval_secs),
        }
    }

    async fn create_container(
        &self,
        account_id: &str,
        access_token: &str,
        reel: &ReelRef,
    ) -> Result<String> {
        let url = format!("{}/{}/media", self.base_url, account_id);
        let form = [
            ("media_type", "REELS".to_string()),
            ("video_url", reel.video_url.clone()),
            ("caption", reel.caption.clone()),
            ("access_token", access_token.to_string()),
        ];

        let response: GraphResponse = self.client.post(&url).form(&form).send().await?.json().await?;
        response.into_id(Platform::Instagram)
    }

    async fn wait_for_container(&self, container_id: &str, access_token: &str) -> Result<()> {
        let url = format!("{}/{}", self.base_url, container_id);
        for attempt in 1..=self.poll_attempts {
            let status: ContainerStatus = self
                .client
                .get(&url)
                .query(&[("fields", "status_code"), ("access_token", access_token)])
                .send()
                .await?
                .json()
                .await?;

            match status.status_code.as_deref() {
                Some("FINISHED") => {
                    debug!(container_id, attempt, "media container ready");
                    return Ok(());
                }
                Some("ERROR") | Some("EXPIRED") => {
                    return Err(PublishError::Api {
                        platform: Platform::Instagram,
                        message: format!(
                            "media container {} entered state {}",
                            container_id,
                            status.status_code.as_deref().unwrap_or("?")
                        ),
                    });
                }
                other => {
                    debug!(container_id, attempt, status = ?other, "media container not ready");
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(PublishError::Api {
            platform: Platform::Instagram,
            message: format!(
                "media container {} not ready after {} polls",
                container_id, self.poll_attempts
            ),
        })
    }

    async fn publish_container(
        &self,
        account_id: &str,
        access_token: &str,
        container_id: &str,
    ) -> Result<String> {
        let url = format!("{}/{}/media_publish", self.base_url, account_id);
        let response: GraphResponse = self
            .client
            .post(&url)
            .form(&[("creation_id", container_id), ("access_token", access_token)])
            .send()
            .await?
            .json()
            .await?;
        response.into_id(Platform::Instagram)
    }
}

#[async_trait]
impl PlatformPublisher for InstagramPublisher {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn publish(&self, account: &BrandAccount, reel: &ReelRef) -> Result<String> {
        let creds = account.instagram()?;

        let container_id = self
            .create_container(&creds.account_id, &creds.access_token, reel)
            .await?;
        debug!(brand = %account.brand, container_id, "created media container");

        self.wait_for_container(&container_id, &creds.access_token)
            .await?;

        let media_id = self
            .publish_container(&creds.account_id, &creds.access_token, &container_id)
            .await?;
        info!(brand = %account.brand, media_id, "published reel to instagram");
        Ok(media_id)
    }
}
