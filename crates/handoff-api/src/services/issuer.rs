//! Signed handoff URL issuance.
//!
//! Builds the signed, expiring URL that re-authenticates a user on the
//! remote application. The signature covers the verification path and
//! query only, so rebasing the URL onto the remote origin after signing
//! cannot invalidate it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use handoff_core::{user_key, Authenticatable, ConfigError, HandoffConfig};
use handoff_sign::{UrlSigner, EXPIRES_PARAM, SIGNATURE_PARAM};

/// Path of the verification endpoint on the remote application.
pub const VERIFY_PATH: &str = "/handoff";

/// Query parameter carrying the user identifier.
pub const USER_PARAM: &str = "user";

/// Query parameter carrying the post-handoff target path.
pub const TARGET_PARAM: &str = "target";

/// Issues signed handoff URLs for authenticated users.
///
/// Pure function of configuration and input; issuance has no side
/// effects and nothing about an issued URL is stored.
#[derive(Debug, Clone)]
pub struct HandoffUrlIssuer {
    config: Arc<HandoffConfig>,
    signer: UrlSigner,
}

impl HandoffUrlIssuer {
    /// Create an issuer from the shared configuration.
    #[must_use]
    pub fn new(config: Arc<HandoffConfig>) -> Self {
        let signer = UrlSigner::new(config.secret.clone());
        Self { config, signer }
    }

    /// The signer keyed by the shared application secret.
    #[must_use]
    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Issue a signed handoff URL for `user`.
    ///
    /// Exactly one of `to_path` / `from_route` must resolve to a target
    /// path; `to_path` wins when both are given. The user identifier is
    /// the custom handoff identifier when the user type provides one,
    /// otherwise the standard auth identifier.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingTarget`] if neither argument is given.
    /// - [`ConfigError::UnmappedRoute`] if `from_route` has no mapping.
    pub fn issue(
        &self,
        user: &dyn Authenticatable,
        to_path: Option<&str>,
        from_route: Option<&str>,
        ttl: Option<Duration>,
    ) -> Result<String, ConfigError> {
        let target = self.resolve_target(to_path, from_route)?;

        let ttl = ttl.unwrap_or(self.config.ttl);
        let expires = Utc::now().timestamp() + ttl.as_secs() as i64;

        let mut params = vec![
            (USER_PARAM.to_string(), user_key(user)),
            (TARGET_PARAM.to_string(), target),
            (EXPIRES_PARAM.to_string(), expires.to_string()),
        ];
        let signature = self.signer.sign(VERIFY_PATH, &params);
        params.push((SIGNATURE_PARAM.to_string(), signature));

        Ok(self.assemble(&params))
    }

    /// Resolve the target path from an explicit path or a mapped route.
    fn resolve_target(
        &self,
        to_path: Option<&str>,
        from_route: Option<&str>,
    ) -> Result<String, ConfigError> {
        match (to_path, from_route) {
            (Some(path), _) => Ok(path.to_string()),
            (None, Some(route)) => self
                .config
                .routes
                .resolve(route)
                .map(str::to_string)
                .ok_or_else(|| ConfigError::UnmappedRoute(route.to_string())),
            (None, None) => Err(ConfigError::MissingTarget),
        }
    }

    /// Assemble the absolute URL on the remote application's origin.
    ///
    /// Path, query, and signature are exactly what was signed; only the
    /// scheme and host come from `target_host`.
    fn assemble(&self, params: &[(String, String)]) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            serializer.append_pair(key, value);
        }
        let query = serializer.finish();

        let mut url = self.config.target_host.clone();
        url.set_path(VERIFY_PATH);
        url.set_query(Some(&query));
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use handoff_core::RouteMap;

    struct TestUser {
        id: u64,
    }

    impl Authenticatable for TestUser {
        fn auth_identifier(&self) -> String {
            self.id.to_string()
        }
    }

    fn issuer() -> HandoffUrlIssuer {
        let routes: RouteMap = [("/dashboard".to_string(), "/home".to_string())]
            .into_iter()
            .collect();
        let config = HandoffConfig::with_default_ttl(
            "https://remote.app",
            routes,
            "users",
            b"test-shared-secret".to_vec(),
        )
        .unwrap();
        HandoffUrlIssuer::new(Arc::new(config))
    }

    fn received_params(url: &str) -> (String, Vec<(String, String)>) {
        let url = url::Url::parse(url).unwrap();
        let params = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        (url.path().to_string(), params)
    }

    #[test]
    fn issued_url_starts_with_target_host_and_verify_path() {
        let url = issuer()
            .issue(&TestUser { id: 42 }, Some("/dash"), None, None)
            .unwrap();
        assert!(url.starts_with("https://remote.app/handoff?"));
    }

    #[test]
    fn issued_url_carries_user_target_expiry_signature() {
        let url = issuer()
            .issue(&TestUser { id: 42 }, Some("/dash"), None, None)
            .unwrap();
        assert!(url.contains("user=42"));
        assert!(url.contains("target=%2Fdash"));
        assert!(url.contains("expires="));
        assert!(url.contains("signature="));
    }

    #[test]
    fn issued_url_verifies_despite_host_swap() {
        let issuer = issuer();
        let url = issuer
            .issue(&TestUser { id: 42 }, Some("/dash"), None, None)
            .unwrap();
        let (path, params) = received_params(&url);
        assert_eq!(path, VERIFY_PATH);
        assert!(issuer.signer().verify(&path, &params, Utc::now()).is_ok());
    }

    #[test]
    fn explicit_path_wins_over_route() {
        let url = issuer()
            .issue(&TestUser { id: 42 }, Some("/dash"), Some("/dashboard"), None)
            .unwrap();
        assert!(url.contains("target=%2Fdash"));
    }

    #[test]
    fn mapped_route_resolves_to_remote_path() {
        let url = issuer()
            .issue(&TestUser { id: 42 }, None, Some("/dashboard"), None)
            .unwrap();
        assert!(url.contains("target=%2Fhome"));
    }

    #[test]
    fn unmapped_route_is_a_configuration_error() {
        let result = issuer().issue(&TestUser { id: 42 }, None, Some("/billing"), None);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::UnmappedRoute("/billing".to_string())
        );
    }

    #[test]
    fn missing_target_is_a_configuration_error() {
        let result = issuer().issue(&TestUser { id: 42 }, None, None, None);
        assert_eq!(result.unwrap_err(), ConfigError::MissingTarget);
    }

    #[test]
    fn ttl_override_shortens_expiry() {
        let url = issuer()
            .issue(
                &TestUser { id: 42 },
                Some("/dash"),
                None,
                Some(Duration::from_secs(60)),
            )
            .unwrap();
        let (_, params) = received_params(&url);
        let expires: i64 = params
            .iter()
            .find(|(k, _)| k == EXPIRES_PARAM)
            .map(|(_, v)| v.parse().unwrap())
            .unwrap();

        let now = Utc::now().timestamp();
        assert!(expires > now);
        assert!(expires <= now + 60);
    }

    #[test]
    fn default_ttl_is_applied() {
        let url = issuer()
            .issue(&TestUser { id: 42 }, Some("/dash"), None, None)
            .unwrap();
        let (_, params) = received_params(&url);
        let expires: i64 = params
            .iter()
            .find(|(k, _)| k == EXPIRES_PARAM)
            .map(|(_, v)| v.parse().unwrap())
            .unwrap();

        let now = Utc::now().timestamp();
        assert!(expires > now + 290);
        assert!(expires <= now + 300);
    }

    #[test]
    fn custom_identifier_is_embedded() {
        struct BadgeUser;
        impl Authenticatable for BadgeUser {
            fn auth_identifier(&self) -> String {
                "7".to_string()
            }
            fn handoff_identifier_name(&self) -> Option<&str> {
                Some("external_ref")
            }
            fn handoff_identifier(&self) -> Option<String> {
                Some("legacy-77".to_string())
            }
        }

        let url = issuer().issue(&BadgeUser, Some("/dash"), None, None).unwrap();
        assert!(url.contains("user=legacy-77"));
    }

    #[test]
    fn expired_issue_rejected_by_signer() {
        let issuer = issuer();
        let url = issuer
            .issue(
                &TestUser { id: 42 },
                Some("/dash"),
                None,
                Some(Duration::ZERO),
            )
            .unwrap();
        let (path, params) = received_params(&url);
        let later: DateTime<Utc> = Utc.timestamp_opt(Utc::now().timestamp() + 1, 0).unwrap();
        assert!(issuer
            .signer()
            .verify(&path, &params, later)
            .unwrap_err()
            .is_expired());
    }
}
