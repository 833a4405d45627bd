//! `check` command: validate an authorization URL offline

use colored::Colorize;
use prettytable::{format, row, Table};

use crate::error::{ConsentError, Result};
use crate::oauth::params::{validate, AuthorizationRequest, RawParams};

/// Validate `url` and print the parsed request or every violation.
///
/// The authorization server is never contacted.
///
/// # Errors
///
/// Returns [`ConsentError::Validation`] when the request is invalid, so the
/// process exits non-zero.
pub fn run_check(url: &str) -> Result<()> {
    let raw = RawParams::from_url_or_query(url);

    match validate(&raw) {
        Ok(request) => {
            println!("{}", "Authorization request is valid".green());
            print_request(&request);
            Ok(())
        }
        Err(violations) => {
            println!("{}", "Authorization request is invalid:".red().bold());
            for message in violations.messages() {
                println!("  {} {}", "-".red(), message);
            }
            Err(ConsentError::from(violations).into())
        }
    }
}

fn print_request(request: &AuthorizationRequest) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(row!["Parameter".bold(), "Value".bold()]);

    for (name, value) in request.query_pairs() {
        table.add_row(row![name.cyan(), value]);
    }

    println!();
    table.printstd();
    println!();
}
