//! Authentication and session management.
//!
//! The session itself is a cookie jar plus a page-embedded token. Obtaining
//! one requires an interactive browser flow, which lives behind the
//! [`LoginDriver`] trait; restoring one uses the versioned disk cache in
//! [`SessionCache`], validated with a live probe before it is trusted.
//!
//! ```no_run
//! use mint_rs::{Credentials, MintClient, SessionCache};
//!
//! # async fn example(driver: impl mint_rs::LoginDriver) -> mint_rs::Result<()> {
//! let client = MintClient::new(Default::default())?;
//! let creds = Credentials::new("user@example.com", "password");
//!
//! // Reuse the last login when possible, falling back to the driver.
//! client
//!     .login_cached(&driver, &creds, None, &SessionCache::default_location()?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod cache;
mod login;
mod session;

pub use cache::{CachedSession, SessionCache};
pub use login::{Credentials, LoginDriver, LoginOutcome, TwoFactorProvider};
pub use session::{CookieJar, Session};
