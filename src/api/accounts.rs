//! Accounts service.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use crate::client::ClientInner;
use crate::models::{Account, AccountId, AccountKind};
use crate::Result;

/// Service for account listing and the two client-mutable account fields.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: mint_rs::MintClient) -> mint_rs::Result<()> {
/// let accounts = client.accounts().list().await?;
/// for account in accounts.iter().filter(|a| a.is_visible) {
///     println!("{}: {:?}", account.name, account.current_balance);
/// }
/// # Ok(())
/// # }
/// ```
pub struct AccountsService {
    inner: Arc<ClientInner>,
}

impl AccountsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all accounts, of every kind.
    ///
    /// The listing is memoized for the session; mutations through this
    /// service invalidate it.
    pub async fn list(&self) -> Result<Arc<Vec<Account>>> {
        let inner = self.inner.clone();
        self.inner
            .listings
            .accounts
            .get_or_load(|| async move {
                let args = json!({ "types": AccountKind::ALL });
                let response = inner
                    .service_call("MintAccountService", "getAccountsSorted", args)
                    .await?;
                Ok(serde_json::from_value(response)?)
            })
            .await
    }

    /// Show or hide an account in planning and trends.
    pub async fn set_visibility(&self, id: AccountId, visible: bool) -> Result<()> {
        let args = json!({ "accountId": id, "isVisible": visible });
        self.inner
            .service_call("MintAccountService", "updateAccount", args)
            .await?;
        self.inner.listings.accounts.invalidate().await;
        Ok(())
    }

    /// Set the caller-assigned value of a manual (unlinked) account.
    pub async fn set_manual_value(&self, id: AccountId, value: Decimal) -> Result<()> {
        let args = json!({ "accountId": id, "value": value });
        self.inner
            .service_call("MintAccountService", "updateAccount", args)
            .await?;
        self.inner.listings.accounts.invalidate().await;
        Ok(())
    }
}
