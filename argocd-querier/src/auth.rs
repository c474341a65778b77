use crate::errors::GatewayError;
use http::HeaderMap;
use http::header::AUTHORIZATION;
use std::fmt;

/// Caller-supplied bearer token, forwarded verbatim to ArgoCD.
///
/// Always non-empty. `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Result<Self, GatewayError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GatewayError::AuthMissing);
        }
        Ok(AuthToken(token))
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid ASCII, or uses another scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}
