//! A client for posting rendered messages to Discord webhooks.

use crate::core::OutputMessage;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, info, instrument};

/// A trait for clients that can deliver a rendered message.
#[async_trait]
pub trait DiscordClientTrait: Send + Sync {
    /// Posts `message` to `webhook_url`. Delivery is attempted once.
    async fn send(&self, webhook_url: &str, message: &OutputMessage) -> anyhow::Result<()>;
}

/// A client for sending messages to a Discord webhook.
pub struct DiscordClient {
    client: reqwest::Client,
}

impl DiscordClient {
    /// Creates a new `DiscordClient` whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DiscordClientTrait for DiscordClient {
    #[instrument(skip(self, webhook_url, message), fields(username = %message.username))]
    async fn send(&self, webhook_url: &str, message: &OutputMessage) -> anyhow::Result<()> {
        let response = self.client.post(webhook_url).json(message).send().await;

        match response {
            Ok(res) => {
                let status = res.status();
                if status.is_success() {
                    info!(status = %status, "Successfully sent notification to Discord.");
                    Ok(())
                } else {
                    let text = res.text().await.unwrap_or_default();
                    error!(
                        status = %status,
                        body = %text,
                        "Failed to send Discord notification"
                    );
                    anyhow::bail!(
                        "Failed to send Discord notification: status {}, body: {}",
                        status,
                        text
                    );
                }
            }
            Err(e) => {
                error!(error = %e, "HTTP request to Discord failed");
                Err(e.into())
            }
        }
    }
}
