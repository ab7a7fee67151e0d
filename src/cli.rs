//! Command-line interface definition for Toolgate
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolgate - session authentication gate for MCP tool servers
///
/// Serves an MCP endpoint whose tool calls are only answered for
/// identities that completed the web login within the auth window.
#[derive(Parser, Debug, Clone)]
#[command(name = "toolgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "TOOLGATE_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Toolgate
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the MCP endpoint and the login web flow
    Serve {
        /// Address to bind the listener to
        #[arg(long)]
        bind_address: Option<String>,

        /// Port for the listener and for generated login URLs
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of canned responses (`<identity>/<tool>.json`)
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Emit JSON-formatted logs
        #[arg(long)]
        json_logs: bool,
    },

    /// Print the login URL a client on the given session would be sent to
    LoginUrl {
        /// Session identifier
        #[arg(short, long)]
        session: String,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "toolgate",
            "serve",
            "--port",
            "9000",
            "--data-dir",
            "/srv/data",
            "--json-logs",
        ])
        .expect("parse");
        match cli.command {
            Commands::Serve {
                port,
                data_dir,
                json_logs,
                bind_address,
            } => {
                assert_eq!(port, Some(9000));
                assert_eq!(data_dir, Some(PathBuf::from("/srv/data")));
                assert!(json_logs);
                assert!(bind_address.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_login_url() {
        let cli = Cli::try_parse_from(["toolgate", "-v", "login-url", "--session", "abc"])
            .expect("parse");
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::LoginUrl { ref session } if session == "abc"));
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["toolgate"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
