//! Resource prober: is a URL fetchable and not a disguised "not found" page?

use crate::scan::PoliteClient;
use reqwest::StatusCode;

/// Marker in the final URL of a redirect that lands on the site's human-facing 404 page.
pub const SOFT_404_MARKER: &str = "404.html";

/// Why a probe did or did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found,
    /// Non-success HTTP status.
    HttpStatus(u16),
    /// 2xx, but redirected to the soft-404 landing page.
    SoftNotFound { final_url: String },
    /// Connection, timeout, TLS or redirect-loop error.
    Transport(String),
}

impl ProbeOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, ProbeOutcome::Found)
    }
}

/// True iff `url` answers with a success status and did not redirect to a soft-404 page.
/// Never fails; every failure mode collapses to `false` after a diagnostic line.
pub fn probe(client: &mut PoliteClient, url: &str) -> bool {
    let outcome = probe_outcome(client, url);
    match &outcome {
        ProbeOutcome::Found => {}
        ProbeOutcome::HttpStatus(status) => tracing::debug!("HTTP Error: {} {}", status, url),
        ProbeOutcome::SoftNotFound { final_url } => {
            tracing::debug!("Not found: {} redirected to {}", url, final_url)
        }
        ProbeOutcome::Transport(reason) => tracing::warn!("URL Error: {} {}", reason, url),
    }
    outcome.is_found()
}

/// Issues HEAD, falling back to GET when the server rejects HEAD. The body is never read.
pub fn probe_outcome(client: &mut PoliteClient, url: &str) -> ProbeOutcome {
    let response = match client.head(url) {
        Ok(r)
            if r.status() == StatusCode::METHOD_NOT_ALLOWED
                || r.status() == StatusCode::NOT_IMPLEMENTED =>
        {
            client.get(url)
        }
        other => other,
    };
    match response {
        Ok(r) => classify(r.status(), r.url().as_str()),
        Err(e) => match e.status() {
            Some(status) => ProbeOutcome::HttpStatus(status.as_u16()),
            None => ProbeOutcome::Transport(e.to_string()),
        },
    }
}

/// Classify a completed response by status and final URL.
pub fn classify(status: StatusCode, final_url: &str) -> ProbeOutcome {
    if !status.is_success() {
        return ProbeOutcome::HttpStatus(status.as_u16());
    }
    if final_url.contains(SOFT_404_MARKER) {
        return ProbeOutcome::SoftNotFound {
            final_url: final_url.to_string(),
        };
    }
    ProbeOutcome::Found
}
