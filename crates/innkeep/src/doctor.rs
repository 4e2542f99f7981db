// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `innkeep doctor` command implementation.
//!
//! Runs diagnostic checks against the Innkeep environment to identify
//! configuration issues, connectivity problems, and scheduling backlog.

use std::io::IsTerminal;
use std::time::{Duration, Instant};

use innkeep_config::model::InnkeepConfig;
use innkeep_core::{Channel, InnkeepError};

/// Status of a diagnostic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn render(&self, use_color: bool) -> String {
        let ms = self.duration.as_millis();
        if use_color {
            use colored::Colorize;
            let (symbol, message) = match self.status {
                CheckStatus::Pass => ("✓".green().to_string(), self.message.clone()),
                CheckStatus::Warn => ("!".yellow().to_string(), self.message.yellow().to_string()),
                CheckStatus::Fail => ("✗".red().to_string(), self.message.red().to_string()),
            };
            format!("    {symbol} {:<16} {message} ({ms}ms)", self.name)
        } else {
            let tag = match self.status {
                CheckStatus::Pass => "[OK]  ",
                CheckStatus::Warn => "[WARN]",
                CheckStatus::Fail => "[FAIL]",
            };
            format!("    {tag} {:<16} {} ({ms}ms)", self.name, self.message)
        }
    }
}

/// Run the `innkeep doctor` command.
///
/// Runs quick diagnostic checks. With `--deep`, runs additional intensive
/// checks. With `--plain`, disables colored output.
pub async fn run_doctor(
    config: &InnkeepConfig,
    deep: bool,
    plain: bool,
) -> Result<(), InnkeepError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let mut results = Vec::new();

    results.push(check_database(&config.storage.database_path).await);
    results.push(check_blob_dir(&config.storage.blob_dir));
    results.push(check_channels(config));
    results.push(check_gateway(config).await);

    if deep {
        results.push(check_db_integrity(&config.storage.database_path).await);
        results.push(check_dispatch_backlog(&config.storage.database_path).await);
    }

    println!();
    println!("  innkeep doctor");
    println!("  {}", "-".repeat(50));

    let issues = results
        .iter()
        .filter(|r| r.status != CheckStatus::Pass)
        .count();

    for result in &results {
        println!("{}", result.render(use_color));
    }

    println!();
    if issues > 0 {
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
        if !deep {
            println!("  Run with --deep for detailed diagnostics.");
        }
    } else {
        println!("  All checks passed.");
    }
    println!();

    Ok(())
}

/// Check the database file exists and answers a query.
async fn check_database(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let name = "Database".to_string();

    if !std::path::Path::new(db_path).exists() {
        return CheckResult {
            name,
            status: CheckStatus::Warn,
            message: format!("not found: {db_path} (will be created on first run)"),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let query_result: Result<(), tokio_rusqlite::Error> = conn
                .call(|conn| {
                    conn.execute_batch("SELECT 1")?;
                    Ok(())
                })
                .await;
            match query_result {
                Ok(()) => CheckResult {
                    name,
                    status: CheckStatus::Pass,
                    message: "connected".to_string(),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name,
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Check the attachment blob directory is usable.
fn check_blob_dir(blob_dir: &str) -> CheckResult {
    let start = Instant::now();
    let name = "Blob store".to_string();
    let path = std::path::Path::new(blob_dir);

    if !path.exists() {
        return CheckResult {
            name,
            status: CheckStatus::Warn,
            message: format!("not found: {blob_dir} (will be created on first upload)"),
            duration: start.elapsed(),
        };
    }

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => CheckResult {
            name,
            status: CheckStatus::Pass,
            message: "accessible".to_string(),
            duration: start.elapsed(),
        },
        Ok(_) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("{blob_dir} is not a directory"),
            duration: start.elapsed(),
        },
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("cannot access: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Report which channel senders the config produces.
fn check_channels(config: &InnkeepConfig) -> CheckResult {
    let start = Instant::now();
    let senders = innkeep_channels::build_senders(config);
    let channels: Vec<String> = senders.iter().map(|s| s.channel().to_string()).collect();

    let transport_count = senders
        .iter()
        .filter(|s| s.channel() != Channel::InApp)
        .count();

    CheckResult {
        name: "Channels".to_string(),
        status: if transport_count == 0 {
            CheckStatus::Warn
        } else {
            CheckStatus::Pass
        },
        message: if transport_count == 0 {
            "only in_app configured (no provider credentials found)".to_string()
        } else {
            format!("configured: {}", channels.join(", "))
        },
        duration: start.elapsed(),
    }
}

/// Check the gateway health endpoint of a running instance.
async fn check_gateway(config: &InnkeepConfig) -> CheckResult {
    let start = Instant::now();
    let name = "Gateway".to_string();

    if !config.gateway.enabled {
        return CheckResult {
            name,
            status: CheckStatus::Pass,
            message: "disabled".to_string(),
            duration: start.elapsed(),
        };
    }

    let url = format!(
        "http://{}:{}/health",
        config.gateway.bind_address, config.gateway.port
    );
    let client = match reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            return CheckResult {
                name,
                status: CheckStatus::Fail,
                message: format!("HTTP client error: {e}"),
                duration: start.elapsed(),
            };
        }
    };

    match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => CheckResult {
            name,
            status: CheckStatus::Pass,
            message: "reachable".to_string(),
            duration: start.elapsed(),
        },
        Ok(resp) => CheckResult {
            name,
            status: CheckStatus::Warn,
            message: format!("status {}", resp.status()),
            duration: start.elapsed(),
        },
        Err(_) => CheckResult {
            name,
            status: CheckStatus::Warn,
            message: format!("not reachable at {url} (engine may not be running)"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: SQLite integrity check.
async fn check_db_integrity(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let name = "DB integrity".to_string();

    if !std::path::Path::new(db_path).exists() {
        return CheckResult {
            name,
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<Vec<String>, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let mut stmt = conn.prepare("PRAGMA integrity_check")?;
                    let rows: Vec<String> = stmt
                        .query_map([], |row| row.get(0))?
                        .filter_map(|r| r.ok())
                        .collect();
                    Ok(rows)
                })
                .await;

            match result {
                Ok(rows) if rows.len() == 1 && rows[0] == "ok" => CheckResult {
                    name,
                    status: CheckStatus::Pass,
                    message: "ok".to_string(),
                    duration: start.elapsed(),
                },
                Ok(rows) => CheckResult {
                    name,
                    status: CheckStatus::Fail,
                    message: format!("{} issue(s) found", rows.len()),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name,
                    status: CheckStatus::Fail,
                    message: format!("check failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}

/// Deep check: pending scheduled rows whose fire time has already passed.
///
/// A growing overdue count means the sweep is not running or a provider
/// is stalling the batch.
async fn check_dispatch_backlog(db_path: &str) -> CheckResult {
    let start = Instant::now();
    let name = "Dispatch backlog".to_string();

    if !std::path::Path::new(db_path).exists() {
        return CheckResult {
            name,
            status: CheckStatus::Warn,
            message: "database not found (skipped)".to_string(),
            duration: start.elapsed(),
        };
    }

    match tokio_rusqlite::Connection::open(db_path).await {
        Ok(conn) => {
            let result: Result<u64, tokio_rusqlite::Error> = conn
                .call(|conn| {
                    let count = conn.query_row(
                        "SELECT COUNT(*) FROM scheduled_messages
                         WHERE status = 'pending'
                           AND fire_at < strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                        [],
                        |row| row.get(0),
                    )?;
                    Ok(count)
                })
                .await;

            match result {
                Ok(0) => CheckResult {
                    name,
                    status: CheckStatus::Pass,
                    message: "no overdue rows".to_string(),
                    duration: start.elapsed(),
                },
                Ok(n) => CheckResult {
                    name,
                    status: CheckStatus::Warn,
                    message: format!("{n} overdue pending row(s)"),
                    duration: start.elapsed(),
                },
                Err(e) => CheckResult {
                    name,
                    status: CheckStatus::Fail,
                    message: format!("query failed: {e}"),
                    duration: start.elapsed(),
                },
            }
        }
        Err(e) => CheckResult {
            name,
            status: CheckStatus::Fail,
            message: format!("open failed: {e}"),
            duration: start.elapsed(),
        },
    }
}
