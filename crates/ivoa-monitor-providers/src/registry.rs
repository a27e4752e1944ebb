// crates/ivoa-monitor-providers/src/registry.rs
// ============================================================================
// Module: TAP Registry Client
// Description: RegistrySource over a TAP service's synchronous endpoint.
// Purpose: Find every parametric-HTTP service of a given type.
// Dependencies: ivoa-monitor-core, reqwest, serde, tracing, url
// ============================================================================

//! ## Overview
//! The client sends `GET {url}/sync?REQUEST=doQuery&LANG=ADQL&QUERY=...&MAXREC=...`
//! and decodes the VOTable answer. `MAXREC` defaults to
//! [`DEFAULT_MAX_RECORDS`], above the registry's own default row limit; an
//! answer cut at the limit comes back flagged as truncated. The
//! ADQL joins the capability, interface, resource, and role tables of the
//! relational registry, keeping contact roles and `vs:paramhttp`
//! interfaces. The `LIKE` filters from [`ServiceType::adql_predicates`] are
//! coarse; callers apply [`ServiceType::matches`] to each record.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use ivoa_monitor_core::RegistryError;
use ivoa_monitor_core::RegistryAnswer;
use ivoa_monitor_core::RegistrySource;
use ivoa_monitor_core::ServiceType;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use tracing::info;
use tracing::warn;
use url::Url;

use crate::client::BodyError;
use crate::client::ProviderError;
use crate::client::build_client;
use crate::client::read_body_limited;
use crate::votable::parse_registry_records;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default relational registry TAP endpoint.
pub const DEFAULT_REGISTRY_URL: &str = "http://voparis-rr.obspm.fr/tap";

/// Default `MAXREC` sent with every registry query.
pub const DEFAULT_MAX_RECORDS: u32 = 1_000_000;

/// Selected columns, in response order.
const SELECT_COLUMNS: &str = "ivoid, access_url, res_title, short_name, standard_id, intf_type, \
                              std_version, created, updated, harvested_from, role_name, email";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the TAP registry client.
///
/// # Invariants
/// - `url` is the TAP base URL; `/sync` is appended.
/// - `timeout_ms` bounds the whole exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TapRegistryConfig {
    /// TAP base URL.
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// `MAXREC` sent with the query.
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    /// User agent string for registry requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Maximum response size accepted, in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for TapRegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            timeout_ms: default_timeout_ms(),
            max_records: DEFAULT_MAX_RECORDS,
            user_agent: default_user_agent(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// Returns the default registry endpoint.
fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

/// Returns the default registry timeout.
const fn default_timeout_ms() -> u64 {
    120_000
}

/// Returns the default `MAXREC`.
const fn default_max_records() -> u32 {
    DEFAULT_MAX_RECORDS
}

/// Returns the default registry user agent.
fn default_user_agent() -> String {
    concat!("ivoa-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Returns the default registry response size limit.
const fn default_max_response_bytes() -> usize {
    64 * 1024 * 1024
}

// ============================================================================
// SECTION: Query
// ============================================================================

/// Builds the ADQL query listing services of `service_type`.
#[must_use]
pub fn adql_query(service_type: ServiceType) -> String {
    let mut predicates = service_type.adql_predicates();
    predicates.push("base_role = 'contact'".to_string());
    predicates.push("intf_type = 'vs:paramhttp'".to_string());
    format!(
        "SELECT DISTINCT {SELECT_COLUMNS} FROM rr.capability NATURAL JOIN rr.interface NATURAL \
         JOIN rr.resource NATURAL JOIN rr.res_role WHERE {}",
        predicates.join(" AND ")
    )
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Registry source backed by a TAP service.
#[derive(Debug, Clone)]
pub struct TapRegistryClient {
    /// Client configuration.
    config: TapRegistryConfig,
    /// Parsed `{url}/sync` endpoint.
    endpoint: Url,
    /// HTTP client with the registry timeout applied.
    client: Client,
}

impl TapRegistryClient {
    /// Creates a registry client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the URL is unusable or the HTTP client
    /// cannot be created.
    pub fn new(config: TapRegistryConfig) -> Result<Self, ProviderError> {
        let endpoint = sync_endpoint(&config.url)?;
        let client = build_client(Some(Duration::from_millis(config.timeout_ms)), &config.user_agent)?;
        Ok(Self {
            config,
            endpoint,
            client,
        })
    }

    /// Returns the full query URL for `service_type`.
    #[must_use]
    pub fn query_url(&self, service_type: ServiceType) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("REQUEST", "doQuery");
            pairs.append_pair("LANG", "ADQL");
            pairs.append_pair("QUERY", &adql_query(service_type));
            pairs.append_pair("MAXREC", &self.config.max_records.to_string());
        }
        url
    }
}

impl RegistrySource for TapRegistryClient {
    fn search(&self, service_type: ServiceType) -> Result<RegistryAnswer, RegistryError> {
        let url = self.query_url(service_type);
        info!(service_type = %service_type, registry = %self.config.url, "querying registry");
        debug!(url = %url, "registry request");
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| RegistryError::Transport(err.to_string()))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(RegistryError::Status(status.as_u16()));
        }
        let body = read_body_limited(&mut response, self.config.max_response_bytes).map_err(|err| match err {
            BodyError::TooLarge(_) => RegistryError::Invalid(err.describe()),
            BodyError::TimedOut(_) | BodyError::Failed(_) => RegistryError::Transport(err.describe()),
        })?;
        let answer = parse_registry_records(&body)?;
        info!(service_type = %service_type, records = answer.records.len(), "registry answered");
        if answer.truncated {
            warn!(
                service_type = %service_type,
                records = answer.records.len(),
                max_records = self.config.max_records,
                "registry reported overflow; answer truncated"
            );
        }
        Ok(answer)
    }
}

/// Parses `base` and appends the `/sync` path segment.
fn sync_endpoint(base: &str) -> Result<Url, ProviderError> {
    let trimmed = base.trim().trim_end_matches('/');
    let url = Url::parse(&format!("{trimmed}/sync")).map_err(|err| ProviderError::InvalidUrl(format!("{base}: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProviderError::InvalidUrl(format!("{base}: scheme must be http or https")));
    }
    Ok(url)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    #[test]
    fn adql_restricts_type_role_and_interface() {
        let query = adql_query(ServiceType::Sia);
        assert!(query.starts_with("SELECT DISTINCT ivoid, access_url, res_title"));
        assert!(query.contains("standard_id LIKE 'ivo://ivoa.net/std/sia%'"));
        assert!(query.contains("NOT (standard_id LIKE 'ivo://ivoa.net/std/sia#query-%2.%')"));
        assert!(query.ends_with("AND base_role = 'contact' AND intf_type = 'vs:paramhttp'"));
    }

    #[test]
    fn sync_endpoint_appends_path_once() {
        assert_eq!(sync_endpoint("http://rr.example.org/tap/").unwrap().as_str(), "http://rr.example.org/tap/sync");
        assert!(matches!(sync_endpoint("ftp://rr.example.org/tap"), Err(ProviderError::InvalidUrl(_))));
        assert!(matches!(sync_endpoint("not a url"), Err(ProviderError::InvalidUrl(_))));
    }

    #[test]
    fn query_url_carries_configured_maxrec() {
        let client = TapRegistryClient::new(TapRegistryConfig {
            max_records: 50,
            ..TapRegistryConfig::default()
        })
        .unwrap();
        let url = client.query_url(ServiceType::Tap);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("REQUEST".to_string(), "doQuery".to_string()));
        assert_eq!(pairs[1], ("LANG".to_string(), "ADQL".to_string()));
        assert_eq!(pairs[2].1, adql_query(ServiceType::Tap));
        assert_eq!(pairs[3], ("MAXREC".to_string(), "50".to_string()));
    }

    #[test]
    fn query_url_sends_large_maxrec_by_default() {
        let client = TapRegistryClient::new(TapRegistryConfig::default()).unwrap();
        let url = client.query_url(ServiceType::ConeSearch);
        let maxrec = url.query_pairs().find(|(name, _)| name == "MAXREC").map(|(_, value)| value.into_owned());
        assert_eq!(maxrec.as_deref(), Some("1000000"));
    }
}
