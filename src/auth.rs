//! Single-secret bearer authentication.
//!
//! The comparison is a plain string equality, not constant-time. There is one
//! secret and one identity per process; no expiry or per-user scoping.

use crate::error::ConfigError;

/// Scheme prefix stripped from `Authorization` header values.
const BEARER_PREFIX: &str = "Bearer ";

/// Extracts the token from an `Authorization` header value.
///
/// A value without the `Bearer ` prefix is taken as the token itself.
pub(crate) fn bearer_token(header_value: &str) -> &str {
    header_value
        .strip_prefix(BEARER_PREFIX)
        .unwrap_or(header_value)
}

/// Compares caller tokens with the configured secret.
#[derive(Clone)]
pub(crate) struct AuthGate {
    /// Expected bearer token; never empty.
    secret: String,
    /// Identity returned on a match, `{country_code}{number}`.
    identity: String,
}

impl core::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthGate")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl AuthGate {
    /// Creates a gate for `secret`, answering with `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySecret`] if `secret` is empty.
    pub(crate) fn new(secret: String, identity: String) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self { secret, identity })
    }

    /// Returns the configured identity if `token` matches the secret.
    pub(crate) fn validate(&self, token: Option<&str>) -> Option<&str> {
        token
            .filter(|candidate| *candidate == self.secret)
            .map(|_matched| self.identity.as_str())
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use super::{AuthGate, bearer_token};
    use crate::error::ConfigError;

    fn gate() -> AuthGate {
        AuthGate::new("s3cret".to_owned(), "+491234567890".to_owned()).expect("valid gate")
    }

    #[test]
    fn correct_secret_yields_identity() {
        assert_eq!(gate().validate(Some("s3cret")), Some("+491234567890"));
    }

    #[test]
    fn wrong_empty_or_missing_token_is_rejected() {
        let gate = gate();
        assert_eq!(gate.validate(Some("wrong")), None);
        assert_eq!(gate.validate(Some("")), None);
        assert_eq!(gate.validate(Some("s3cret ")), None);
        assert_eq!(gate.validate(None), None);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            AuthGate::new(String::new(), "+1".to_owned()),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn bearer_prefix_is_stripped() {
        assert_eq!(bearer_token("Bearer abc"), "abc");
        assert_eq!(bearer_token("abc"), "abc");
        assert_eq!(bearer_token(""), "");
    }

    #[test]
    fn debug_output_hides_secret() {
        let rendered = format!("{:?}", gate());
        assert!(!rendered.contains("s3cret"));
    }
}
