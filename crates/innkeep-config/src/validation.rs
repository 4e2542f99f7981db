// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: parseable timezones and times of day, sane sweep cadence,
//! and a fail-closed gateway token.

use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;

use crate::diagnostic::ConfigError;
use crate::model::InnkeepConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &InnkeepConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if Tz::from_str(config.property.timezone.trim()).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "property.timezone `{}` is not a valid IANA timezone",
                config.property.timezone
            ),
        });
    }

    for (key, value) in [
        ("property.check_in_time", &config.property.check_in_time),
        ("property.check_out_time", &config.property.check_out_time),
    ] {
        if NaiveTime::parse_from_str(value.trim(), "%H:%M").is_err() {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{value}` must be HH:MM"),
            });
        }
    }

    if config.service.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "service.sweep_interval_secs must be at least 1".to_string(),
        });
    }

    if config.service.sweep_batch_size == 0 {
        errors.push(ConfigError::Validation {
            message: "service.sweep_batch_size must be at least 1".to_string(),
        });
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.storage.blob_dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.blob_dir must not be empty".to_string(),
        });
    }

    if config.gateway.enabled {
        let addr = config.gateway.bind_address.trim();
        if addr.is_empty() {
            errors.push(ConfigError::Validation {
                message: "gateway.bind_address must not be empty".to_string(),
            });
        } else {
            let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
            let is_valid_hostname = addr
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
            if !is_valid_ip && !is_valid_hostname {
                errors.push(ConfigError::Validation {
                    message: format!(
                        "gateway.bind_address `{addr}` is not a valid IP address or hostname"
                    ),
                });
            }
        }

        // fail closed: an enabled gateway without a token would expose the
        // control surface unauthenticated
        match &config.gateway.auth_token {
            None => errors.push(ConfigError::Validation {
                message: "gateway.auth_token is required when the gateway is enabled".to_string(),
            }),
            Some(token) if token.trim().len() < 16 => errors.push(ConfigError::Validation {
                message: "gateway.auth_token must be at least 16 characters".to_string(),
            }),
            Some(_) => {}
        }
    }

    if config.email.smtp_host.is_some() {
        match &config.email.from_address {
            Some(from) if from.contains('@') => {}
            Some(from) => errors.push(ConfigError::Validation {
                message: format!("email.from_address `{from}` is not a valid address"),
            }),
            None => errors.push(ConfigError::Validation {
                message: "email.from_address is required when email.smtp_host is set".to_string(),
            }),
        }
    }

    if config.whatsapp.access_token.is_some() && config.whatsapp.phone_number_id.is_none() {
        errors.push(ConfigError::Validation {
            message: "whatsapp.phone_number_id is required when whatsapp.access_token is set"
                .to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_token() -> InnkeepConfig {
        let mut config = InnkeepConfig::default();
        config.gateway.auth_token = Some("0123456789abcdef0123".to_string());
        config
    }

    #[test]
    fn default_config_with_token_validates() {
        assert!(validate_config(&config_with_token()).is_ok());
    }

    #[test]
    fn enabled_gateway_without_token_fails_closed() {
        let config = InnkeepConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("auth_token"))));
    }

    #[test]
    fn disabled_gateway_needs_no_token() {
        let mut config = InnkeepConfig::default();
        config.gateway.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_timezone_fails_validation() {
        let mut config = config_with_token();
        config.property.timezone = "Atlantis/Lost".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("timezone"))));
    }

    #[test]
    fn bad_check_in_time_fails_validation() {
        let mut config = config_with_token();
        config.property.check_in_time = "3pm".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("check_in_time"))));
    }

    #[test]
    fn zero_sweep_interval_fails_validation() {
        let mut config = config_with_token();
        config.service.sweep_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("sweep_interval_secs"))));
    }

    #[test]
    fn smtp_without_from_address_fails_validation() {
        let mut config = config_with_token();
        config.email.smtp_host = Some("smtp.example.com".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("from_address"))));
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = InnkeepConfig::default();
        config.property.timezone = "nope".to_string();
        config.property.check_in_time = "nope".to_string();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 4); // tz + time + db path + missing token
    }
}
