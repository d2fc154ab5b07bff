//! HTTP Basic authentication against a single static credential pair.

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine};
use subtle::ConstantTimeEq;

/// Realm sent in the `WWW-Authenticate` challenge.
pub const AUTH_REALM: &str = "Login Required";

/// The one account allowed to use the service.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Compares both fields in constant time.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = username.as_bytes().ct_eq(self.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.password.as_bytes());
        bool::from(user_ok & pass_ok)
    }

    /// Checks an `Authorization` header value.
    ///
    /// Returns `false` for a missing header, a scheme other than Basic, or a
    /// payload that is not base64 of `user:pass`.
    pub fn verify_header(&self, header: Option<&str>) -> bool {
        header
            .and_then(decode_basic)
            .is_some_and(|(user, pass)| self.matches(&user, &pass))
    }
}

/// Value of the `WWW-Authenticate` header for a 401 response.
pub fn challenge() -> String {
    format!("Basic realm=\"{AUTH_REALM}\"")
}

/// Decodes `Basic <base64(user:pass)>` into its two parts.
pub fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, payload) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64_STANDARD.decode(payload.trim()).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (user, pass) = text.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

/// Builds an `Authorization` header value; used by clients and tests.
pub fn encode_basic(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{username}:{password}"))
    )
}
