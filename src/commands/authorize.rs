//! `authorize` command: run one consent decision in the terminal
//!
//! Drives the same [`ConsentFlow`] the HTTP service uses, but shows the
//! consent screen as text and reads the decision from a prompt. The final
//! redirect URL is printed instead of followed.

use std::sync::Arc;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::config::Config;
use crate::consent::controller::{Consent, ConsentState, Outcome};
use crate::consent::flow::ConsentFlow;
use crate::error::Result;
use crate::oauth::api::HttpAuthorizationServer;
use crate::oauth::params::RawParams;

/// The user's answer to the consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// Parses a prompt answer; `None` for anything unrecognized.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "a" | "approve" | "y" | "yes" => Some(Self::Approve),
            "d" | "deny" | "n" | "no" | "cancel" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// Load the authorization request in `url`, prompt for a decision and print
/// where the application would be sent.
///
/// # Errors
///
/// Returns error if no credential is configured, the request is invalid,
/// the application cannot be resolved, or the prompt is aborted.
pub async fn run_authorize(config: &Config, url: &str) -> Result<()> {
    config.require_credential()?;

    let server = HttpAuthorizationServer::new(&config.authorization_server)?;
    let flow = ConsentFlow::new(Arc::new(server));

    let consent = match flow.load(&RawParams::from_url_or_query(url)).await {
        ConsentState::Ready(consent) => consent,
        ConsentState::Error(failure) => {
            println!("{}", "Authorization Error".red().bold());
            for message in &failure.messages {
                println!("  {}", message);
            }
            return Err(anyhow::anyhow!(failure.messages.join("; ")));
        }
        other => {
            return Err(anyhow::anyhow!(
                "consent session ended in unexpected state: {}",
                other.name()
            ))
        }
    };

    print_consent(&consent);

    let decision = prompt_decision()?;
    let settled = match decision {
        Decision::Approve => flow.approve().await,
        Decision::Deny => flow.deny().await,
    };

    match settled {
        Some(ConsentState::Redirected(redirect)) => {
            let label = match redirect.outcome {
                Outcome::Approved => "Approved".green(),
                Outcome::Denied => "Denied".yellow(),
                Outcome::Failed => "Authorization failed".red(),
            };
            println!("{}", label);
            println!("Redirect: {}", redirect.location.as_str().cyan());
            Ok(())
        }
        Some(other) => Err(anyhow::anyhow!(
            "consent session ended in unexpected state: {}",
            other.name()
        )),
        None => Err(anyhow::anyhow!(
            "consent session was not awaiting a decision"
        )),
    }
}

fn print_consent(consent: &Consent) {
    let client = &consent.client;

    println!();
    println!("{}", "Authorize Application".bold());
    println!();
    println!("  {}", client.name.cyan().bold());
    println!("  {}", client.description);
    if client.previously_consented {
        println!("  {}", "You have authorized this application before.".green());
    }
    println!();
    println!("{}", "Permissions Requested".bold());
    for scope in &client.scopes {
        println!("  - {}", scope.description);
    }
    println!();
    println!("You'll be redirected to: {}", consent.request.redirect_uri());
    println!();
}

fn prompt_decision() -> Result<Decision> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline("[a]pprove / [d]eny > ") {
            Ok(line) => match Decision::parse(&line) {
                Some(decision) => return Ok(decision),
                None => println!("Please answer 'approve' or 'deny'."),
            },
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                tracing::debug!("Prompt closed without a decision");
                return Err(anyhow::anyhow!("no decision was made"));
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                return Err(err.into());
            }
        }
    }
}
