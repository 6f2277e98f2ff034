//! Discord notification service
//!
//! Posts messages to channels through the Discord bot REST API.

use super::{DeliveryError, Notifier};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::DiscordConfig;

/// Discord bot notifier
pub struct DiscordNotifier {
    /// REST API base URL
    api_base_url: String,
    /// Bot token
    bot_token: SecretString,
    /// HTTP client
    client: reqwest::Client,
}

impl DiscordNotifier {
    /// Create a new Discord notifier
    pub fn new(
        api_base_url: impl Into<String>,
        bot_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token,
            client,
        })
    }

    /// Create from the Discord section of the app config
    pub fn from_config(config: &DiscordConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.api_base_url.clone(),
            SecretString::new(config.bot_token.expose_secret().clone()),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn messages_url(&self, channel_id: u64) -> String {
        format!("{}/channels/{}/messages", self.api_base_url, channel_id)
    }
}

/// Rate limit body returned with HTTP 429
#[derive(Debug, serde::Deserialize)]
struct RateLimitBody {
    retry_after: Option<f64>,
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel_id: u64, text: &str) -> Result<(), DeliveryError> {
        let payload = serde_json::json!({ "content": text });

        let response = self
            .client
            .post(self.messages_url(channel_id))
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bot {}", self.bot_token.expose_secret()),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .json::<RateLimitBody>()
                .await
                .ok()
                .and_then(|body| body.retry_after);
            return Err(DeliveryError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(channel_id, "Sent Discord message");
        Ok(())
    }
}
