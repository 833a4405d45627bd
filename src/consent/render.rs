//! HTML pages of the consent flow
//!
//! Pages are plain server-rendered HTML with no scripts; Approve and Deny
//! are ordinary form posts. Every interpolated value goes through
//! [`html_escape`].

use uuid::Uuid;

use crate::consent::controller::{Consent, Failure};

/// Page for the consent decision.
pub fn render_consent_page(consent: &Consent, session_id: Uuid) -> String {
    let client = &consent.client;

    let logo_html = match &client.logo {
        Some(logo) => format!(
            r#"<img class="logo" src="{src}" alt="{alt} logo" width="48" height="48">"#,
            src = html_escape(logo),
            alt = html_escape(&client.name)
        ),
        None => format!(
            r#"<div class="logo" aria-label="{alt} logo">{initial}</div>"#,
            alt = html_escape(&client.name),
            initial = html_escape(&client.initial().to_string())
        ),
    };

    let scopes_html: String = client
        .scopes
        .iter()
        .map(|scope| {
            format!(
                r#"<li><strong>{name}</strong><br><small>{description}</small></li>"#,
                name = html_escape(&scope.name),
                description = html_escape(&scope.description)
            )
        })
        .collect();

    let consented_html = if client.previously_consented {
        "<p class=\"note\">You have authorized this application before.</p>"
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Authorize {name}</title>
</head>
<body>
<main data-testid="consent-screen">
<h1>Authorize Application</h1>
<section data-testid="app-info">
{logo_html}
<h2>{name}</h2>
<p>{description}</p>
{consented_html}
</section>
<section data-testid="permissions-section">
<h3>Permissions Requested</h3>
<ul>{scopes_html}</ul>
</section>
<section data-testid="redirect-info">
<p>You'll be redirected to:</p>
<p title="{redirect}">{redirect}</p>
</section>
<section data-testid="action-buttons">
<form method="post" action="/oauth/authorize/{session_id}/approve">
<button type="submit" data-testid="authorize-button">Authorize</button>
</form>
<form method="post" action="/oauth/authorize/{session_id}/deny">
<button type="submit" data-testid="cancel-button">Cancel</button>
</form>
</section>
</main>
</body>
</html>"#,
        name = html_escape(&client.name),
        description = html_escape(&client.description),
        redirect = html_escape(consent.request.redirect_uri()),
    )
}

/// Inline error screen listing every message.
pub fn render_error_page(failure: &Failure) -> String {
    let messages_html: String = failure
        .messages
        .iter()
        .map(|m| format!("<p>{}</p>", html_escape(m)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Authorization Error</title>
</head>
<body>
<main data-testid="error-screen">
<h2>Authorization Error</h2>
<div role="alert" aria-live="polite">{messages_html}</div>
</main>
</body>
</html>"#
    )
}

/// Minimal page with a title and a pre-rendered HTML body.
pub fn render_message_page(title: &str, body_html: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<main>
<h2>{title}</h2>
<p>{body_html}</p>
</main>
</body>
</html>"#,
        title = html_escape(title),
    )
}

/// Simple HTML escaping.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
