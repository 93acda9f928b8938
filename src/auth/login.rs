//! The seam between this crate and the interactive login flow.
//!
//! Logging in to the site requires driving a real browser through its
//! credential and multi-factor pages. That machinery lives outside this
//! crate; the client only consumes the end state, a [`LoginOutcome`] of
//! cookies plus a token, through the [`LoginDriver`] trait.

use secrecy::{ExposeSecret, SecretString};

use crate::auth::CookieJar;
use crate::error::Result;

/// Login credentials for the aggregation site.
pub struct Credentials {
    /// Account email address
    pub email: String,
    password: SecretString,
}

impl Credentials {
    /// Create credentials from an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// The password, exposed for the login driver.
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Supplies a two-factor code on demand during interactive login.
///
/// Implementations typically block on user input (a terminal prompt) or on
/// the [`wait_for_code`](crate::callback::wait_for_code) callback listener.
/// Any `Fn() -> Result<String>` closure qualifies.
pub trait TwoFactorProvider: Send + Sync {
    /// Produce the code the site is currently asking for.
    fn code(&self) -> Result<String>;
}

impl<F> TwoFactorProvider for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn code(&self) -> Result<String> {
        self()
    }
}

/// End state of a successful interactive login.
#[derive(Debug)]
pub struct LoginOutcome {
    /// Cookies captured from the authenticated browser session
    pub cookies: CookieJar,
    /// The page-embedded login token
    pub token: String,
}

/// An external collaborator that performs the interactive browser login.
///
/// The driver owns navigation, credential entry, and multi-factor handling;
/// on success it hands back cookies and the token, and the client takes over
/// from there. Drivers should return
/// [`Error::Authentication`](crate::Error::Authentication) when the flow
/// cannot produce a token.
pub trait LoginDriver {
    /// Run the interactive flow to completion.
    fn login(
        &self,
        credentials: &Credentials,
        two_factor: Option<&dyn TwoFactorProvider>,
    ) -> impl std::future::Future<Output = Result<LoginOutcome>> + Send;
}
