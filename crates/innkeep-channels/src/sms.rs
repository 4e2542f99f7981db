// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS gateway sender (generic JSON-over-HTTP provider).

use std::time::Duration;

use async_trait::async_trait;
use innkeep_config::model::SmsConfig;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// Sends text messages through an HTTP SMS gateway.
#[derive(Debug)]
pub struct SmsSender {
    client: reqwest::Client,
    api_base_url: String,
    api_token: String,
    sender_id: Option<String>,
}

impl SmsSender {
    /// Build from config; `None` when the section has no credentials.
    pub fn from_config(config: &SmsConfig) -> Option<Self> {
        let api_base_url = config.api_base_url.clone()?;
        let api_token = config.api_token.clone()?;
        Some(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(crate::SEND_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
            sender_id: config.sender_id.clone(),
        })
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> Channel {
        Channel::Sms
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        let url = format!("{}/messages", self.api_base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({
                "to": msg.recipient,
                "from": self.sender_id,
                "body": msg.body,
            }))
            .send()
            .await
            .map_err(|e| InnkeepError::Channel {
                message: "sms request failed".to_string(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InnkeepError::channel(format!(
                "sms gateway error {status}: {body}"
            )));
        }

        let parsed: SendResponse = response.json().await.unwrap_or(SendResponse { id: None });
        debug!(provider_id = ?parsed.id, to = %msg.recipient, "sms accepted");
        Ok(parsed.id)
    }
}
