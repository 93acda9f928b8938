//! Session state: cookies, token, user agent.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque, ordered cookie store.
///
/// Cookies are server-assigned and treated as key/value blobs: persisted and
/// restored verbatim, never interpreted. Attributes (domain, expiry, flags)
/// are deliberately dropped when recording `Set-Cookie` headers, matching
/// what the site actually needs back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieJar(BTreeMap<String, String>);

impl CookieJar {
    /// Create an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cookie value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a cookie value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of cookies in the jar.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the jar is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the jar as a `Cookie` request-header value.
    pub fn header_value(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.0 {
            if !out.is_empty() {
                out.push_str("; ");
            }
            out.push_str(name);
            out.push('=');
            out.push_str(value);
        }
        out
    }

    /// Record a `Set-Cookie` response-header value, keeping only the leading
    /// name=value pair.
    pub fn apply_set_cookie(&mut self, header: &str) {
        let pair = header.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.0.insert(name.to_string(), value.trim().to_string());
            }
        }
    }
}

/// The authenticated HTTP context: cookies plus the login token.
///
/// Created empty at client construction, populated by login (or cache
/// restore), and invalidated only server-side; expiry is detected from
/// responses, never from local timers.
pub struct Session {
    cookies: CookieJar,
    token: Option<SecretString>,
    user_agent: String,
}

/// Browser-like user agent sent with every request. The site serves error
/// pages to clients it does not recognize.
pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9) AppleWebKit/537.71 \
     (KHTML, like Gecko) Version/7.0 Safari/537.71";

impl Session {
    /// Create an unauthenticated session.
    pub fn new() -> Self {
        Self {
            cookies: CookieJar::new(),
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Create a session from previously captured state (a login outcome or a
    /// cache hit).
    pub fn from_parts(cookies: CookieJar, token: impl Into<String>) -> Self {
        Self {
            cookies,
            token: Some(SecretString::from(token.into())),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Replace the session state wholesale (fresh login).
    pub fn replace(&mut self, cookies: CookieJar, token: impl Into<String>) {
        self.cookies = cookies;
        self.token = Some(SecretString::from(token.into()));
    }

    /// Drop all authentication state.
    pub fn clear(&mut self) {
        self.cookies = CookieJar::new();
        self.token = None;
    }

    /// Cheap local check: do we hold a token at all?
    ///
    /// Says nothing about whether the server still honors it; use the
    /// client's probe for an authoritative answer.
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// The login token, exposed for request building.
    pub(crate) fn token_value(&self) -> Option<String> {
        self.token.as_ref().map(|t| t.expose_secret().to_string())
    }

    /// The cookie jar.
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Mutable access to the cookie jar, for recording response cookies and
    /// for the snapshot/restore guard around PFM calls.
    pub(crate) fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// The user agent sent with every request.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Override the user agent.
    pub fn set_user_agent(&mut self, user_agent: impl Into<String>) {
        self.user_agent = user_agent.into();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.cookies.len())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header_round_trip() {
        let mut jar = CookieJar::new();
        jar.apply_set_cookie("ius_session=abc123; Path=/; Secure; HttpOnly");
        jar.apply_set_cookie("mint=tok=99; Domain=.example.com");
        assert_eq!(jar.get("ius_session"), Some("abc123"));
        // Only the first '=' splits the pair
        assert_eq!(jar.get("mint"), Some("tok=99"));
        assert_eq!(jar.header_value(), "ius_session=abc123; mint=tok=99");
    }

    #[test]
    fn test_malformed_set_cookie_is_ignored(){
        let mut jar = CookieJar::new();
        jar.apply_set_cookie("no-equals-sign-here");
        jar.apply_set_cookie("=value-without-name");
        assert!(jar.is_empty());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::from_parts(CookieJar::new(), "super-secret-token");
        let debug_str = format!("{:?}", session);
        assert!(!debug_str.contains("super-secret-token"));
        assert!(debug_str.contains("REDACTED"));
    }

    #[test]
    fn test_clear_drops_state() {
        let mut jar = CookieJar::new();
        jar.set("a", "1");
        let mut session = Session::from_parts(jar, "tok");
        assert!(session.has_token());
        session.clear();
        assert!(!session.has_token());
        assert!(session.cookies().is_empty());
    }
}
