// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OTA platform messaging API sender.
//!
//! Relays messages to the booking platform's guest-messaging endpoint; the
//! recipient is the platform's opaque guest id, not a phone or email.

use std::time::Duration;

use async_trait::async_trait;
use innkeep_config::model::OtaConfig;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SendResponse {
    message_id: Option<String>,
}

/// Sends messages through the OTA platform's messaging API.
#[derive(Debug)]
pub struct OtaSender {
    client: reqwest::Client,
    api_base_url: String,
    api_token: String,
}

impl OtaSender {
    /// Build from config; `None` when the section has no credentials.
    pub fn from_config(config: &OtaConfig) -> Option<Self> {
        let api_base_url = config.api_base_url.clone()?;
        let api_token = config.api_token.clone()?;
        Some(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(crate::SEND_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

#[async_trait]
impl ChannelSender for OtaSender {
    fn channel(&self) -> Channel {
        Channel::Ota
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        let url = format!("{}/guests/{}/messages", self.api_base_url, msg.recipient);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&serde_json::json!({ "body": msg.body }))
            .send()
            .await
            .map_err(|e| InnkeepError::Channel {
                message: "ota request failed".to_string(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InnkeepError::channel(format!(
                "ota platform error {status}: {body}"
            )));
        }

        let parsed: SendResponse = response
            .json()
            .await
            .unwrap_or(SendResponse { message_id: None });
        debug!(provider_id = ?parsed.message_id, guest = %msg.recipient, "ota message accepted");
        Ok(parsed.message_id)
    }
}
