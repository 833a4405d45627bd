//! `probe` command: resolve an application's consent metadata
//!
//! Useful for checking the configured credential and base URL against a
//! live authorization server before putting the consent service in front
//! of users.

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::config::Config;
use crate::error::Result;
use crate::oauth::api::{AuthorizationServer, HttpAuthorizationServer};
use crate::oauth::metadata::ClientMetadata;

/// Call the scopes endpoint for `client_id`/`scope` and print the result.
///
/// # Errors
///
/// Returns error if no credential is configured or the authorization server
/// rejects or fails the lookup.
pub async fn run_probe(config: &Config, client_id: &str, scope: &str, json: bool) -> Result<()> {
    config.require_credential()?;

    tracing::info!(
        client_id = %client_id,
        base_url = %config.authorization_server.base_url,
        "Probing authorization server"
    );

    let server = HttpAuthorizationServer::new(&config.authorization_server)?;
    let metadata = server.client_metadata(client_id, scope).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    } else {
        print_metadata(&metadata);
    }

    Ok(())
}

fn print_metadata(metadata: &ClientMetadata) {
    println!();
    println!("{} {}", "Application:".bold(), metadata.name.cyan());
    println!("{} {}", "Client ID:".bold(), metadata.id);
    println!("{} {}", "Description:".bold(), metadata.description);
    println!(
        "{} {}",
        "Logo:".bold(),
        metadata.logo.as_deref().unwrap_or("-")
    );
    if metadata.previously_consented {
        println!("{}", "Previously authorized by this user".green());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Scope".bold(), "Description".bold()]);
    for scope in &metadata.scopes {
        table.add_row(row![scope.name.cyan(), scope.description]);
    }

    println!();
    table.printstd();
    println!();
}
