//! Caller identity propagated from the inbound request to downstream calls.

use std::fmt;

/// The authenticated caller, as far as these services are concerned: the raw
/// bearer credential presented on the inbound request.
///
/// Token validation happens upstream. The services only carry the credential
/// so the Inventory service can apply its own authorization.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    bearer_token: String,
}

impl CallerIdentity {
    /// Wraps a bearer token.
    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: token.into(),
        }
    }

    /// Parses an `Authorization` header value of the form `Bearer <token>`.
    ///
    /// The scheme is matched case-insensitively. Returns `None` for any other
    /// scheme or an empty token.
    #[must_use]
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        Some(Self::bearer(token))
    }

    /// Returns the raw bearer token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.bearer_token
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerIdentity")
            .field("bearer_token", &"<redacted>")
            .finish()
    }
}
