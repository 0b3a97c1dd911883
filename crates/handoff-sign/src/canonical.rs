//! Canonical serialization of a URL's path and query parameters.
//!
//! Both the issuing and verifying application must MAC the exact same
//! byte string, regardless of the order parameters appeared on the wire
//! or which host served the request.

/// Query parameter carrying the MAC. Always excluded from the canonical form.
pub const SIGNATURE_PARAM: &str = "signature";

/// Query parameter carrying the expiry instant (epoch seconds).
pub const EXPIRES_PARAM: &str = "expires";

/// Build the canonical string for `path` and `params`.
///
/// Parameters are percent-encoded with `application/x-www-form-urlencoded`
/// rules, sorted bytewise by key (then value), and joined with `&`. The
/// `signature` parameter is excluded so verification can canonicalize the
/// received parameter set as-is. Scheme and host never participate.
#[must_use]
pub fn canonical_string(path: &str, params: &[(String, String)]) -> String {
    let mut pairs: Vec<(&str, &str)> = params
        .iter()
        .filter(|(key, _)| key != SIGNATURE_PARAM)
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable();

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }

    format!("{path}?{}", serializer.finish())
}
