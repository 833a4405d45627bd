//! oauth-consent - OAuth 2.0 PKCE consent service
//!
#![doc = "Main entry point for the oauth-consent application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use oauth_consent::cli::{Cli, Commands};
use oauth_consent::commands;
use oauth_consent::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting consent service");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Check { url } => {
            tracing::debug!("Checking authorization request");
            commands::check::run_check(&url)?;
            Ok(())
        }
        Commands::Probe {
            client_id,
            scope,
            json,
        } => {
            commands::probe::run_probe(&config, &client_id, &scope, json).await?;
            Ok(())
        }
        Commands::Authorize { url } => {
            tracing::info!("Starting terminal consent");
            commands::authorize::run_authorize(&config, &url).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over `--verbose`. Logs go to stderr so command output on
/// stdout stays machine readable.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_filter = if verbose {
        "oauth_consent=debug"
    } else {
        "oauth_consent=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
