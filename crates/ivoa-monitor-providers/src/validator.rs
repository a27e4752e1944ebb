// crates/ivoa-monitor-providers/src/validator.rs
// ============================================================================
// Module: HTTP Validator Client
// Description: Blocking validator client over reqwest.
// Purpose: Fetch validator reports and classify every transport outcome.
// Dependencies: ivoa-monitor-core, reqwest, serde, tracing
// ============================================================================

//! ## Overview
//! [`HttpValidatorClient`] performs one GET per validation. The request
//! timeout comes from each [`ValidatorRequest`], so the client itself carries
//! no global timeout. Outcomes map onto [`ValidatorResponse`]:
//!
//! | exchange                         | response        |
//! |----------------------------------|-----------------|
//! | connect or send timed out        | `TimedOut`      |
//! | connect or send failed otherwise | `RequestFailed` |
//! | status other than 200            | `HttpStatus`    |
//! | body read failed or timed out    | `ReadFailed`    |
//! | body larger than the limit       | `ReadFailed`    |
//! | body read                        | `Body`          |

// ============================================================================
// SECTION: Imports
// ============================================================================

use ivoa_monitor_core::ValidatorClient;
use ivoa_monitor_core::ValidatorRequest;
use ivoa_monitor_core::ValidatorResponse;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::client::ProviderError;
use crate::client::build_client;
use crate::client::read_body_limited;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP validator client.
///
/// # Invariants
/// - `max_response_bytes` is a hard upper bound on report bodies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpValidatorConfig {
    /// User agent string for validator requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum report size accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for HttpValidatorConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// Returns the default validator user agent.
fn default_user_agent() -> String {
    concat!("ivoa-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Returns the default report size limit.
const fn default_max_response_bytes() -> usize {
    16 * 1024 * 1024
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Validator client backed by a blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpValidatorClient {
    /// Client configuration.
    config: HttpValidatorConfig,
    /// HTTP client reused across requests.
    client: Client,
}

impl HttpValidatorClient {
    /// Creates a validator client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::ClientBuild`] when the HTTP client cannot be created.
    pub fn new(config: HttpValidatorConfig) -> Result<Self, ProviderError> {
        let client = build_client(None, &config.user_agent)?;
        Ok(Self {
            config,
            client,
        })
    }
}

impl ValidatorClient for HttpValidatorClient {
    fn fetch(&self, request: &ValidatorRequest) -> ValidatorResponse {
        debug!(url = %request.url, timeout_secs = request.timeout.as_secs(), "calling validator");
        let mut response = match self.client.get(&request.url).timeout(request.timeout).send() {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                warn!(url = %request.url, error = %err, "validator request timed out");
                return ValidatorResponse::TimedOut(err.to_string());
            }
            Err(err) => {
                warn!(url = %request.url, error = %err, "validator request failed");
                return ValidatorResponse::RequestFailed(err.to_string());
            }
        };
        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %request.url, status = status.as_u16(), "validator returned non-200 status");
            return ValidatorResponse::HttpStatus(status.as_u16());
        }
        match read_body_limited(&mut response, self.config.max_response_bytes) {
            Ok(body) => ValidatorResponse::Body(body),
            Err(err) => {
                let message = err.describe();
                warn!(url = %request.url, error = %message, "validator response unreadable");
                ValidatorResponse::ReadFailed(message)
            }
        }
    }
}
