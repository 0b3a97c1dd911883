//! Process-wide handoff configuration.
//!
//! Loaded once at startup, immutable afterwards, and passed explicitly
//! into the issuer and verifier rather than looked up ad hoc.

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Default signed-URL lifetime in seconds.
pub const DEFAULT_TTL_SECS: u64 = 300;

/// Mapping from local route patterns to relative paths on the remote app.
///
/// Keys are unique; values need not be (several local routes may land on
/// the same remote path). Lookup is exact-match only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMap {
    routes: HashMap<String, String>,
}

impl RouteMap {
    /// Create an empty route map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a local route pattern to a remote path, replacing any
    /// existing mapping.
    pub fn insert(&mut self, route: impl Into<String>, target: impl Into<String>) {
        self.routes.insert(route.into(), target.into());
    }

    /// Resolve a local route pattern to its remote path.
    #[must_use]
    pub fn resolve(&self, route: &str) -> Option<&str> {
        self.routes.get(route).map(String::as_str)
    }

    /// Check whether a local route pattern has a mapping.
    #[must_use]
    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// Number of mapped routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<(String, String)> for RouteMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            routes: iter.into_iter().collect(),
        }
    }
}

/// Immutable handoff configuration shared by the issuer and verifier.
#[derive(Clone)]
pub struct HandoffConfig {
    /// Signed-URL lifetime.
    pub ttl: Duration,

    /// Base origin of the remote application (scheme + host only).
    pub target_host: Url,

    /// Local route pattern → remote relative path mapping.
    pub routes: RouteMap,

    /// Registry name of the user repository queried on the verifying side.
    pub user_model: String,

    /// Shared signing secret. Known to both applications.
    pub secret: Vec<u8>,
}

impl std::fmt::Debug for HandoffConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandoffConfig")
            .field("ttl", &self.ttl)
            .field("target_host", &self.target_host.as_str())
            .field("routes", &self.routes.len())
            .field("user_model", &self.user_model)
            .field("secret", &"[redacted]")
            .finish()
    }
}

impl HandoffConfig {
    /// Build a configuration, validating the target host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTargetHost`] if `target_host` is not
    /// a bare http(s) origin (no path, query, or fragment).
    pub fn new(
        ttl: Duration,
        target_host: &str,
        routes: RouteMap,
        user_model: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let target_host = parse_target_host(target_host)?;
        Ok(Self {
            ttl,
            target_host,
            routes,
            user_model: user_model.into(),
            secret: secret.into(),
        })
    }

    /// Build a configuration with the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTargetHost`] for a malformed target host.
    pub fn with_default_ttl(
        target_host: &str,
        routes: RouteMap,
        user_model: impl Into<String>,
        secret: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            Duration::from_secs(DEFAULT_TTL_SECS),
            target_host,
            routes,
            user_model,
            secret,
        )
    }
}

/// Parse and validate the remote application's base origin.
///
/// The origin must be bare scheme + host (+ optional port). A path,
/// query, or fragment would be silently overwritten when the signed
/// URL is assembled, so those are rejected outright.
fn parse_target_host(raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|_| ConfigError::InvalidTargetHost(raw.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::InvalidTargetHost(raw.to_string()));
    }

    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidTargetHost(raw.to_string()));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> RouteMap {
        [
            ("/dashboard".to_string(), "/home".to_string()),
            ("/settings/profile".to_string(), "/account/info".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn route_map_resolves_exact_match() {
        let map = routes();
        assert_eq!(map.resolve("/dashboard"), Some("/home"));
        assert_eq!(map.resolve("/settings/profile"), Some("/account/info"));
    }

    #[test]
    fn route_map_is_exact_match_only() {
        let map = routes();
        assert_eq!(map.resolve("/dashboard/"), None);
        assert_eq!(map.resolve("/dash"), None);
        assert_eq!(map.resolve("dashboard"), None);
    }

    #[test]
    fn route_map_allows_repeated_values() {
        let map: RouteMap = [
            ("/a".to_string(), "/home".to_string()),
            ("/b".to_string(), "/home".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.resolve("/a"), Some("/home"));
        assert_eq!(map.resolve("/b"), Some("/home"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn config_accepts_valid_target_host() {
        let config =
            HandoffConfig::with_default_ttl("https://remote.app", routes(), "users", b"secret".to_vec())
                .unwrap();
        assert_eq!(config.target_host.scheme(), "https");
        assert_eq!(config.target_host.host_str(), Some("remote.app"));
        assert_eq!(config.ttl, Duration::from_secs(DEFAULT_TTL_SECS));
    }

    #[test]
    fn config_rejects_target_host_without_scheme() {
        let result =
            HandoffConfig::with_default_ttl("remote.app", RouteMap::new(), "users", b"s".to_vec());
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidTargetHost("remote.app".to_string())
        );
    }

    #[test]
    fn config_rejects_non_http_scheme() {
        let result = HandoffConfig::with_default_ttl(
            "mailto:ops@remote.app",
            RouteMap::new(),
            "users",
            b"s".to_vec(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidTargetHost(_))));
    }

    #[test]
    fn config_rejects_target_host_with_path() {
        let result = HandoffConfig::with_default_ttl(
            "https://remote.app/base",
            RouteMap::new(),
            "users",
            b"s".to_vec(),
        );
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidTargetHost("https://remote.app/base".to_string())
        );
    }

    #[test]
    fn config_rejects_target_host_with_query() {
        let result = HandoffConfig::with_default_ttl(
            "https://remote.app/?tenant=a",
            RouteMap::new(),
            "users",
            b"s".to_vec(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidTargetHost(_))));
    }

    #[test]
    fn config_accepts_target_host_with_port() {
        let config = HandoffConfig::with_default_ttl(
            "http://localhost:4000",
            RouteMap::new(),
            "users",
            b"s".to_vec(),
        )
        .unwrap();
        assert_eq!(config.target_host.port(), Some(4000));
    }

    #[test]
    fn config_debug_redacts_secret() {
        let config = HandoffConfig::with_default_ttl(
            "https://remote.app",
            RouteMap::new(),
            "users",
            b"very-secret".to_vec(),
        )
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[redacted]"));
        assert!(!rendered.contains("very-secret"));
    }
}
