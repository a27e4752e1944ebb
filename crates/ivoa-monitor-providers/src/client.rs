// crates/ivoa-monitor-providers/src/client.rs
// ============================================================================
// Module: Shared HTTP Client Helpers
// Description: Client construction and bounded body reads.
// Purpose: Keep timeout and size handling identical across providers.
// Dependencies: reqwest, thiserror
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Redirect hops followed before giving up.
const MAX_REDIRECTS: usize = 5;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The HTTP client could not be built.
    #[error("http client build failed: {0}")]
    ClientBuild(String),
    /// A configured endpoint is not a usable URL.
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
}

/// Failure while reading a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyError {
    /// The read exceeded the request timeout.
    TimedOut(String),
    /// The body exceeded the size limit.
    TooLarge(usize),
    /// Any other read failure.
    Failed(String),
}

impl BodyError {
    /// Returns a log-friendly description.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::TimedOut(message) | Self::Failed(message) => message.clone(),
            Self::TooLarge(limit) => format!("response exceeds {limit} bytes"),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a blocking client with an optional overall timeout.
pub(crate) fn build_client(timeout: Option<Duration>, user_agent: &str) -> Result<Client, ProviderError> {
    let mut builder = Client::builder().user_agent(user_agent.to_string()).redirect(Policy::limited(MAX_REDIRECTS));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|err| ProviderError::ClientBuild(err.to_string()))
}

/// Reads the response body while enforcing a byte limit.
pub(crate) fn read_body_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, BodyError> {
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let mut buf = Vec::new();
    response.take(limit).read_to_end(&mut buf).map_err(|err| {
        if is_timeout(&err) {
            BodyError::TimedOut(err.to_string())
        } else {
            BodyError::Failed(err.to_string())
        }
    })?;
    if buf.len() > max_bytes {
        return Err(BodyError::TooLarge(max_bytes));
    }
    Ok(buf)
}

/// Returns true when an I/O error wraps an expired timeout.
fn is_timeout(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::TimedOut
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout)
}
