//! User-preferences service.

use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Value};

use crate::client::ClientInner;
use crate::{Error, Result};

/// Transaction page sizes the preference endpoint accepts.
const PAGE_SIZES: [u32; 3] = [25, 50, 100];

/// Service for account-wide user preferences.
pub struct PreferencesService {
    inner: Arc<ClientInner>,
}

impl PreferencesService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Set a named user property.
    pub async fn set_property(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let args = json!({ "propertyName": name, "propertyValue": value.into() });
        self.inner
            .service_call("MintUserService", "setUserProperty", args)
            .await?;
        Ok(())
    }

    /// Set how many transactions the site returns per page.
    ///
    /// Only 25, 50 and 100 are honored by the server; anything else is
    /// refused locally.
    pub async fn set_transaction_page_size(&self, page_size: u32) -> Result<()> {
        if !PAGE_SIZES.contains(&page_size) {
            return Err(Error::InvalidInput(format!(
                "page size must be one of {PAGE_SIZES:?}, got {page_size}"
            )));
        }

        let token = self.inner.token().await?;
        let form = vec![
            ("task".to_string(), "transactionResults".to_string()),
            ("data".to_string(), page_size.to_string()),
            ("token".to_string(), token),
        ];
        self.inner
            .json_request(Method::POST, "updatePreference.xevent", &[], Some(&form), false)
            .await?;
        Ok(())
    }
}
