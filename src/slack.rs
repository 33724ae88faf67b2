//! Slack incoming-webhook channel.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::{attachments::Attachment, config::Config, error::ChannelError};

/// A chat destination that accepts a message with attachments.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn post(&self, text: &str, attachments: &[Attachment]) -> Result<(), ChannelError>;
}

/// Webhook payload accepted by Slack incoming webhooks.
#[derive(Debug, Serialize)]
pub struct SlackMessage<'a> {
    pub text: &'a str,
    pub channel: &'a str,
    pub username: &'a str,
    pub attachments: &'a [Attachment],
}

/// Posts messages to one channel through an incoming webhook.
pub struct SlackChannel {
    webhook_url: Url,
    channel: String,
    username: String,
    client: reqwest::Client,
}

impl SlackChannel {
    pub fn new(webhook_url: Url, channel: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            webhook_url,
            channel: channel.into(),
            username: username.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.slack_webhook.clone(),
            config.target_channel.clone(),
            config.slack_username.clone(),
        )
    }
}

#[async_trait]
impl ChatChannel for SlackChannel {
    async fn post(&self, text: &str, attachments: &[Attachment]) -> Result<(), ChannelError> {
        let payload = SlackMessage {
            text,
            channel: &self.channel,
            username: &self.username,
            attachments,
        };

        debug!(
            channel = %self.channel,
            attachments = attachments.len(),
            "Sending Slack message"
        );

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(channel = %self.channel, "Slack message sent");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        warn!(
            channel = %self.channel,
            status = %status,
            body = %body,
            "Slack webhook request failed"
        );

        Err(ChannelError::Rejected { status, body })
    }
}
