// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Threadly - automated brand replies to Threads mentions.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod app;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use threadly_config::{ConfigError, ThreadlyConfig};

/// Threadly - automated brand replies to Threads mentions.
#[derive(Parser, Debug)]
#[command(name = "threadly", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the webhook gateway and operator API.
    Serve,
    /// Run one reconciliation pull for an account and print its counters.
    Pull {
        /// Internal account id.
        account_id: String,
    },
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load_config(path: Option<&std::path::Path>) -> Result<ThreadlyConfig, Vec<ConfigError>> {
    match path {
        Some(path) => threadly_config::load_and_validate_path(path),
        None => threadly_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            threadly_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => {
            if let Err(errors) = threadly_config::validate_for_serve(&config) {
                threadly_config::render_errors(&errors);
                std::process::exit(1);
            }
            serve::run_serve(config).await
        }
        Commands::Pull { account_id } => serve::run_pull(config, &account_id).await,
        Commands::CheckConfig => match threadly_config::validate_for_serve(&config) {
            Ok(()) => {
                println!("threadly: configuration OK");
                Ok(())
            }
            Err(errors) => {
                threadly_config::render_errors(&errors);
                std::process::exit(1);
            }
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pull_with_account() {
        let cli = Cli::try_parse_from(["threadly", "pull", "acct-1"]).unwrap();
        match cli.command {
            Commands::Pull { account_id } => assert_eq!(account_id, "acct-1"),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["threadly", "serve", "--config", "/tmp/threadly.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/threadly.toml")));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["threadly"]).is_err());
    }

    #[test]
    fn check_config_uses_kebab_case() {
        let cli = Cli::try_parse_from(["threadly", "check-config"]).unwrap();
        assert!(matches!(cli.command, Commands::CheckConfig));
    }
}
