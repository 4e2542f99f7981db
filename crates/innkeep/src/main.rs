// SPDX-FileCopyrightText: 2026 Innkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Innkeep - guest messaging automation for short-stay properties.
//!
//! Binary entry point: loads and validates configuration, then hands off
//! to the selected subcommand.

use clap::{Parser, Subcommand};

mod doctor;
mod serve;

/// Innkeep - guest messaging automation for short-stay properties.
#[derive(Parser, Debug)]
#[command(name = "innkeep", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the automation engine: dispatch sweep, unread aggregator, and gateway.
    Serve,
    /// Run diagnostic checks against the Innkeep environment.
    Doctor {
        /// Run additional intensive checks (DB integrity, backlog scan).
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match innkeep_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            innkeep_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Doctor { deep, plain }) => doctor::run_doctor(&config, deep, plain).await,
        None => {
            println!("innkeep: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("innkeep: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn minimal_config_is_accepted() {
        let config = innkeep_config::load_and_validate_str(
            r#"
[gateway]
auth_token = "0123456789abcdef0123"
"#,
        )
        .expect("minimal config should be valid");
        assert_eq!(config.property.name, "innkeep");
        assert!(config.gateway.enabled);
    }

    #[test]
    fn gateway_without_token_is_rejected() {
        // the default profile enables the gateway, so a bare config must
        // fail validation instead of starting unauthenticated
        assert!(innkeep_config::load_and_validate_str("").is_err());
    }
}
