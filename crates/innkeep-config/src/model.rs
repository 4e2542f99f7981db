// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Innkeep messaging engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Innkeep configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InnkeepConfig {
    /// Property identity and local-time settings.
    #[serde(default)]
    pub property: PropertyConfig,

    /// Engine behavior: logging, sweep cadence.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// WhatsApp Business API settings.
    #[serde(default)]
    pub whatsapp: WhatsappConfig,

    /// Outbound SMTP email settings.
    #[serde(default)]
    pub email: EmailConfig,

    /// SMS gateway settings.
    #[serde(default)]
    pub sms: SmsConfig,

    /// OTA platform messaging API settings.
    #[serde(default)]
    pub ota: OtaConfig,
}

/// Property identity and local-time configuration.
///
/// All rule fire times are computed in `timezone`; check-in/check-out times
/// anchor the arrival- and departure-relative triggers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyConfig {
    /// Display name of the property, available to message templates.
    #[serde(default = "default_property_name")]
    pub name: String,

    /// IANA timezone the property operates in (e.g. "Europe/Lisbon").
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Daily check-in time, `HH:MM`, property-local.
    #[serde(default = "default_check_in_time")]
    pub check_in_time: String,

    /// Daily check-out time, `HH:MM`, property-local.
    #[serde(default = "default_check_out_time")]
    pub check_out_time: String,
}

impl Default for PropertyConfig {
    fn default() -> Self {
        Self {
            name: default_property_name(),
            timezone: default_timezone(),
            check_in_time: default_check_in_time(),
            check_out_time: default_check_out_time(),
        }
    }
}

fn default_property_name() -> String {
    "innkeep".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_check_in_time() -> String {
    "15:00".to_string()
}

fn default_check_out_time() -> String {
    "11:00".to_string()
}

/// Engine behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Seconds between dispatch sweep ticks.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum scheduled rows claimed per sweep tick.
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_batch_size: default_sweep_batch_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_sweep_batch_size() -> usize {
    32
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Directory for attachment blobs.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            blob_dir: default_blob_dir(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("innkeep").join("innkeep.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("innkeep.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_blob_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("innkeep").join("blobs"))
        .unwrap_or_else(|| std::path::PathBuf::from("blobs"))
        .to_string_lossy()
        .into_owned()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the HTTP gateway (webhooks + control surface).
    #[serde(default = "default_gateway_enabled")]
    pub enabled: bool,

    /// Address to bind the gateway to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port to bind the gateway to.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on every `/v1/*` request.
    /// `None` with the gateway enabled fails closed at startup.
    #[serde(default)]
    pub auth_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: default_gateway_enabled(),
            bind_address: default_bind_address(),
            port: default_gateway_port(),
            auth_token: None,
        }
    }
}

fn default_gateway_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8085
}

/// WhatsApp Business Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsappConfig {
    /// API base URL. Overridable for self-hosted gateways and tests.
    #[serde(default = "default_whatsapp_api_base")]
    pub api_base_url: String,

    /// Access token. `None` disables the WhatsApp sender.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Sending phone number id.
    #[serde(default)]
    pub phone_number_id: Option<String>,
}

impl Default for WhatsappConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_whatsapp_api_base(),
            access_token: None,
            phone_number_id: None,
        }
    }
}

fn default_whatsapp_api_base() -> String {
    "https://graph.facebook.com/v21.0".to_string()
}

/// Outbound SMTP email configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmailConfig {
    /// SMTP relay host. `None` disables the email sender.
    #[serde(default)]
    pub smtp_host: Option<String>,

    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,

    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,

    /// From address on outbound mail.
    #[serde(default)]
    pub from_address: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

/// SMS gateway configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmsConfig {
    /// SMS provider API base URL. `None` disables the SMS sender.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Provider API token.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Sender id shown to the guest.
    #[serde(default)]
    pub sender_id: Option<String>,
}

/// OTA platform messaging API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OtaConfig {
    /// Platform messaging API base URL. `None` disables the OTA sender.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Platform API token.
    #[serde(default)]
    pub api_token: Option<String>,
}
