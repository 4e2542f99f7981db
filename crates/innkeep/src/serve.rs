// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `innkeep serve` command implementation.
//!
//! Wires the engine together: database, event bus, channel senders,
//! dispatch sweep, unread aggregator, and the HTTP gateway. Supports
//! graceful shutdown via SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use innkeep_automation::{run_sweep, run_unread_aggregator, PropertyClock, SenderRegistry};
use innkeep_bus::EventBus;
use innkeep_config::model::{InnkeepConfig, PropertyConfig};
use innkeep_core::InnkeepError;
use innkeep_gateway::{GatewayState, ServerConfig};
use innkeep_storage::database::Database;
use innkeep_storage::FsBlobStore;

/// Run the `innkeep serve` command until a shutdown signal arrives.
pub async fn run_serve(config: InnkeepConfig) -> Result<(), InnkeepError> {
    init_tracing(&config.service.log_level);
    info!(
        property = %config.property.name,
        timezone = %config.property.timezone,
        "innkeep starting"
    );

    let db = Arc::new(
        Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?,
    );
    let bus = EventBus::new();
    let clock = Arc::new(property_clock(&config.property)?);

    let mut registry = SenderRegistry::new();
    for sender in innkeep_channels::build_senders(&config) {
        registry.register(sender);
    }
    let registry = Arc::new(registry);
    info!(channels = ?registry.channels(), "channel senders ready");

    let cancel = install_signal_handler();

    let unread_handle = tokio::spawn(run_unread_aggregator(
        Arc::clone(&db),
        bus.clone(),
        cancel.clone(),
    ));

    let sweep_handle = tokio::spawn(run_sweep(
        Arc::clone(&db),
        bus.clone(),
        Arc::clone(&registry),
        config.property.name.clone(),
        Duration::from_secs(config.service.sweep_interval_secs),
        config.service.sweep_batch_size,
        cancel.clone(),
    ));
    info!(
        interval_secs = config.service.sweep_interval_secs,
        batch_size = config.service.sweep_batch_size,
        "dispatch sweep started"
    );

    if config.gateway.enabled {
        let server_config = ServerConfig {
            bind_address: config.gateway.bind_address.clone(),
            port: config.gateway.port,
            bearer_token: config.gateway.auth_token.clone(),
        };
        let blobs = Arc::new(FsBlobStore::new(config.storage.blob_dir.clone()).await?);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InnkeepError::Internal(format!("http client build failed: {e}")))?;
        let state = GatewayState {
            db: Arc::clone(&db),
            bus: bus.clone(),
            clock,
            blobs,
            http,
        };
        // Serves until the cancel token fires, then drains.
        innkeep_gateway::start_server(&server_config, state, cancel.clone()).await?;
    } else {
        info!("gateway disabled");
        cancel.cancelled().await;
    }

    let _ = sweep_handle.await;
    let _ = unread_handle.await;

    info!("innkeep serve shutdown complete");
    Ok(())
}

/// Build the property-local clock from validated config.
fn property_clock(property: &PropertyConfig) -> Result<PropertyClock, InnkeepError> {
    let timezone: Tz = property
        .timezone
        .parse()
        .map_err(|e| InnkeepError::Config(format!("unknown timezone {:?}: {e}", property.timezone)))?;
    let check_in_time = NaiveTime::parse_from_str(&property.check_in_time, "%H:%M")
        .map_err(|e| InnkeepError::Config(format!("bad check_in_time: {e}")))?;
    let check_out_time = NaiveTime::parse_from_str(&property.check_out_time, "%H:%M")
        .map_err(|e| InnkeepError::Config(format!("bad check_out_time: {e}")))?;
    Ok(PropertyClock::new(timezone, check_in_time, check_out_time))
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal
/// is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("innkeep={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
