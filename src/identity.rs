//! Caller identity lookup
//!
//! Asks a public "what is my IP" endpoint for the caller's address once over
//! IPv4 and once over IPv6, then reverse-resolves each address. Nothing here
//! is fatal: each family reports its own success or failure and the rest of
//! the run carries on regardless.

use crate::{
    error::{AppError, Result},
    models::Config,
};
use futures::future::join;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use trust_dns_resolver::{system_conf, TokioAsyncResolver};

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// IP family used for one lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Wildcard local address that forces the connection onto this family
    pub fn unspecified(&self) -> IpAddr {
        match self {
            Self::V4 => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Self::V6 => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        }
    }

    pub fn of(address: &IpAddr) -> Self {
        match address {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    pub fn matches(&self, address: &IpAddr) -> bool {
        Self::of(address) == *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V4 => "IPv4",
            Self::V6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of the identity endpoint; only `ip_addr` is used
#[derive(Debug, Deserialize)]
struct IfconfigResponse {
    ip_addr: String,
}

/// Caller's public address for one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub family: AddressFamily,
    pub address: IpAddr,
    /// Reverse DNS names, empty when none were found
    pub hostnames: Vec<String>,
    pub reverse_lookup_error: Option<String>,
}

/// Outcome of the lookup for one family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityOutcome {
    pub family: AddressFamily,
    pub result: std::result::Result<Identity, String>,
}

/// Looks up the caller's public addresses
#[derive(Debug, Clone)]
pub struct IdentityLookup {
    url: String,
    timeout: Duration,
    reverse_lookup: bool,
}

impl IdentityLookup {
    pub fn new<S: Into<String>>(url: S) -> Self {
        Self {
            url: url.into(),
            timeout: IDENTITY_TIMEOUT,
            reverse_lookup: true,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.identity_url.clone())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Skip the reverse DNS step
    pub fn without_reverse_lookup(mut self) -> Self {
        self.reverse_lookup = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn client(&self, family: AddressFamily) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .local_address(family.unspecified())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))
    }

    /// Public address as seen by the identity endpoint over `family`
    pub async fn public_address(&self, family: AddressFamily) -> Result<IpAddr> {
        let response = self
            .client(family)?
            .get(&self.url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::timeout(format!(
                        "{} identity request got no answer within {}s",
                        family,
                        self.timeout.as_secs_f64()
                    ))
                } else {
                    AppError::network(format!("{} identity request failed: {}", family, e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::network(format!(
                "{} identity request returned HTTP {}",
                family,
                response.status()
            )));
        }

        let body: IfconfigResponse = response
            .json()
            .await
            .map_err(|e| AppError::parse(format!("Invalid identity response: {}", e)))?;

        let address: IpAddr = body.ip_addr
            .trim()
            .parse()
            .map_err(|e| AppError::parse(format!("Invalid address '{}' in identity response: {}", body.ip_addr, e)))?;

        // The wildcard bind is skipped when the endpoint only resolves to the other family
        if !family.matches(&address) {
            return Err(AppError::network(format!(
                "No {} connectivity to the identity endpoint (answered over {})",
                family,
                AddressFamily::of(&address)
            )));
        }

        Ok(address)
    }

    /// Reverse DNS names for `address` via the system resolver
    pub async fn reverse_names(&self, address: IpAddr) -> Result<Vec<String>> {
        let (config, opts) = system_conf::read_system_conf()
            .map_err(|e| AppError::dns_resolution(format!("Failed to read system DNS config: {}", e)))?;
        let resolver = TokioAsyncResolver::tokio(config, opts);

        let lookup = resolver
            .reverse_lookup(address)
            .await
            .map_err(|e| AppError::dns_resolution(format!("Reverse lookup of {} failed: {}", address, e)))?;

        Ok(lookup
            .iter()
            .map(|name| name.to_string().trim_end_matches('.').to_string())
            .collect())
    }

    /// Address and reverse names for one family
    pub async fn lookup(&self, family: AddressFamily) -> Result<Identity> {
        let address = self.public_address(family).await?;

        let (hostnames, reverse_lookup_error) = if self.reverse_lookup {
            match self.reverse_names(address).await {
                Ok(names) => (names, None),
                Err(e) => (Vec::new(), Some(e.to_string())),
            }
        } else {
            (Vec::new(), None)
        };

        Ok(Identity {
            family,
            address,
            hostnames,
            reverse_lookup_error,
        })
    }

    /// IPv4 and IPv6 lookups, run concurrently
    pub async fn lookup_all(&self) -> Vec<IdentityOutcome> {
        let (v4, v6) = join(self.lookup(AddressFamily::V4), self.lookup(AddressFamily::V6)).await;
        vec![
            IdentityOutcome {
                family: AddressFamily::V4,
                result: v4.map_err(|e| e.to_string()),
            },
            IdentityOutcome {
                family: AddressFamily::V6,
                result: v6.map_err(|e| e.to_string()),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn lookup_against(server: &MockServer) -> IdentityLookup {
        IdentityLookup::new(format!("{}/all.json", server.uri()))
            .with_timeout(Duration::from_secs(2))
            .without_reverse_lookup()
    }

    #[tokio::test]
    async fn test_public_address_from_ip_addr_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/all.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip_addr": "203.0.113.7",
                "remote_host": "unavailable",
                "user_agent": "test"
            })))
            .mount(&server)
            .await;

        let lookup = lookup_against(&server);
        let identity = lookup.lookup(AddressFamily::V4).await.unwrap();

        assert_eq!(identity.family, AddressFamily::V4);
        assert_eq!(identity.address, "203.0.113.7".parse::<IpAddr>().unwrap());
        assert!(identity.hostnames.is_empty());
        assert!(identity.reverse_lookup_error.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = lookup_against(&server)
            .public_address(AddressFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip_addr": "not-an-address"
            })))
            .mount(&server)
            .await;

        let err = lookup_against(&server)
            .public_address(AddressFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }

    #[tokio::test]
    async fn test_lookup_all_never_fails() {
        // Nothing listens here
        let lookup = IdentityLookup::new("http://127.0.0.1:9/all.json")
            .with_timeout(Duration::from_millis(500))
            .without_reverse_lookup();

        let outcomes = lookup.lookup_all().await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].family, AddressFamily::V4);
        assert_eq!(outcomes[1].family, AddressFamily::V6);
        assert!(outcomes.iter().all(|o| o.result.is_err()));
    }

    #[tokio::test]
    async fn test_family_mismatch_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ip_addr": "203.0.113.7"
            })))
            .mount(&server)
            .await;

        let err = lookup_against(&server)
            .public_address(AddressFamily::V6)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(err.to_string().contains("No IPv6 connectivity"));
    }

    #[tokio::test]
    async fn test_slow_endpoint_is_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/all.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "ip_addr": "203.0.113.7" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = lookup_against(&server)
            .with_timeout(Duration::from_millis(200))
            .public_address(AddressFamily::V4)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("IPv4 identity request got no answer within 0.2s"));
    }

    #[test]
    fn test_family_binding() {
        assert!(AddressFamily::V4.matches(&"192.0.2.1".parse().unwrap()));
        assert!(!AddressFamily::V4.matches(&"2001:db8::1".parse().unwrap()));
        assert!(AddressFamily::V4.unspecified().is_ipv4());
        assert!(AddressFamily::V6.unspecified().is_ipv6());
        assert_eq!(AddressFamily::V6.to_string(), "IPv6");
    }
}
