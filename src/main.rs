//! Toolgate - session authentication gate for MCP tool servers
//!
#![doc = "Main entry point for the Toolgate server."]

use anyhow::Result;

use toolgate::cli::{Cli, Commands};
use toolgate::config::Config;
use toolgate::logging::init_logging;
use toolgate::login::LoginUrlBuilder;
use toolgate::{server, telemetry, SessionId};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    init_logging(&config.logging)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting toolgate server");
            telemetry::init_metrics_exporter();
            server::serve(&config).await?;
            Ok(())
        }
        Commands::LoginUrl { session } => {
            let urls = LoginUrlBuilder::new(&config.server.public_host, config.server.port);
            println!("{}", urls.login_url(&SessionId::from(session)));
            Ok(())
        }
    }
}
