//! # mint-rs
//!
//! A Rust client for the private web API of the Mint financial-aggregation
//! site.
//!
//! The site has no public API; this crate speaks the same endpoints its own
//! frontend uses, across both generations of that surface (the legacy
//! bundled-service endpoints and the newer resource-oriented "PFM" ones).
//! Logging in requires a real browser flow, which stays outside the crate
//! behind the [`LoginDriver`] trait; everything after login is plain HTTP.
//!
//! ## Features
//!
//! - **Session management**: cookie + token session with disk caching and
//!   probe-validated restore
//! - **Accounts**: listing, visibility, manual account values
//! - **Transactions**: filtered listing with lazy pagination, edits, splits,
//!   manual cash entry, CSV export
//! - **Categories and tags**: listing, name resolution, creation, with
//!   local guards on the immutable system entries
//! - **Refresh**: trigger institution refreshes and wait for completion
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mint_rs::{Credentials, MintClient, SessionCache, TransactionFilter};
//!
//! # async fn example(driver: impl mint_rs::LoginDriver) -> mint_rs::Result<()> {
//! let client = MintClient::new(Default::default())?;
//! let creds = Credentials::new("user@example.com", "password");
//!
//! client
//!     .login_cached(&driver, &creds, None, &SessionCache::default_location()?)
//!     .await?;
//!
//! let filter = TransactionFilter {
//!     limit: Some(100),
//!     ..Default::default()
//! };
//! for txn in client.transactions().list(&filter).await? {
//!     println!("{} {} {:?}", txn.date, txn.merchant, txn.amount.as_decimal());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod callback;
pub mod client;
pub mod error;
pub mod models;

// Re-export primary types at crate root for convenience
pub use api::{TransactionEdit, TransactionFilter};
pub use auth::{Credentials, LoginDriver, Session, SessionCache, TwoFactorProvider};
pub use client::{ApiStyle, ClientConfig, MintClient};
pub use error::{Error, Result};

/// Prelude module for convenient imports.
///
/// ```rust
/// use mint_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{
        CategorySelector, NewCashTransaction, SortField, SplitPart, TransactionEdit,
        TransactionFilter,
    };
    pub use crate::auth::{
        CookieJar, Credentials, LoginDriver, LoginOutcome, Session, SessionCache,
        TwoFactorProvider,
    };
    pub use crate::client::{ApiStyle, ClientConfig, MintClient, PageStream};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        Account, AccountId, AccountKind, Amount, Category, CategoryId, Tag, TagId, Transaction,
        TransactionId, TransactionKind,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_points_at_the_site() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://mint.intuit.com");
    }

    #[test]
    fn test_transaction_id_shapes() {
        use crate::models::{TransactionId, TransactionKind};
        let legacy = TransactionId::legacy(99, TransactionKind::CashAndCredit);
        assert_eq!(legacy.to_string(), "99:0");
        let pfm = TransactionId::pfm("99_123_0");
        assert_eq!(pfm.to_string(), "99_123_0");
    }
}
