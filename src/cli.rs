//! Command-line interface definition for oauth-consent
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to serve the consent flow, check authorization
//! URLs, probe the authorization server, and run a consent in the terminal.

use clap::{Parser, Subcommand};

/// oauth-consent - OAuth 2.0 PKCE consent service
///
/// Validates incoming authorization requests, shows the user which
/// application is asking for which permissions, and redirects back to the
/// application with an authorization code or an error.
#[derive(Parser, Debug, Clone)]
#[command(name = "oauth-consent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for oauth-consent
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the consent HTTP service
    Serve {
        /// Override the listen address from config (e.g. 0.0.0.0:3000)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Validate an authorization URL without contacting the authorization server
    Check {
        /// Full authorization URL or bare query string
        url: String,
    },

    /// Resolve an application's consent metadata from the authorization server
    Probe {
        /// Client identifier to look up
        #[arg(long)]
        client_id: String,

        /// Requested scope identifier
        #[arg(long)]
        scope: String,

        /// Print the metadata as JSON
        #[arg(long)]
        json: bool,
    },

    /// Walk through a consent decision in the terminal
    Authorize {
        /// Full authorization URL or bare query string
        url: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            json_logs: false,
            command: Commands::Serve { bind: None },
        }
    }
}
