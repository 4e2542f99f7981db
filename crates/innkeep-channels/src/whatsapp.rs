// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Business Cloud API sender.

use std::time::Duration;

use async_trait::async_trait;
use innkeep_config::model::WhatsappConfig;
use innkeep_core::{Channel, ChannelSender, InnkeepError, OutboundMessage};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SendResponse {
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

/// Sends text messages through the WhatsApp Business Cloud API.
#[derive(Debug)]
pub struct WhatsappSender {
    client: reqwest::Client,
    api_base_url: String,
    access_token: String,
    phone_number_id: String,
}

impl WhatsappSender {
    /// Build from config; `None` when the section has no credentials.
    pub fn from_config(config: &WhatsappConfig) -> Option<Self> {
        let access_token = config.access_token.clone()?;
        let phone_number_id = config.phone_number_id.clone()?;
        Some(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(crate::SEND_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token,
            phone_number_id,
        })
    }
}

#[async_trait]
impl ChannelSender for WhatsappSender {
    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    async fn send(&self, msg: &OutboundMessage) -> Result<Option<String>, InnkeepError> {
        let url = format!("{}/{}/messages", self.api_base_url, self.phone_number_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({
                "messaging_product": "whatsapp",
                "to": msg.recipient,
                "type": "text",
                "text": { "body": msg.body },
            }))
            .send()
            .await
            .map_err(|e| InnkeepError::Channel {
                message: "whatsapp request failed".to_string(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InnkeepError::channel(format!(
                "whatsapp API error {status}: {body}"
            )));
        }

        let parsed: SendResponse = response.json().await.map_err(|e| InnkeepError::Channel {
            message: "whatsapp response was not the expected shape".to_string(),
            source: Some(Box::new(e)),
        })?;
        let provider_id = parsed.messages.into_iter().next().map(|m| m.id);
        debug!(?provider_id, to = %msg.recipient, "whatsapp message accepted");
        Ok(provider_id)
    }
}
