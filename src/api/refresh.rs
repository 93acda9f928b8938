//! Account-refresh service: trigger a remote refresh and optionally wait.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::client::ClientInner;
use crate::{Error, Result};

/// Service for triggering and waiting on financial-institution refreshes.
///
/// Refreshing is a server-side job; the client can only kick it off and poll
/// a status flag. Timing out while waiting is an expected outcome and is
/// reported as `Ok(None)`, not as an error.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// # async fn example(client: mint_rs::MintClient) -> mint_rs::Result<()> {
/// match client
///     .refresh()
///     .wait(Duration::from_secs(120), Duration::from_secs(10))
///     .await?
/// {
///     Some(status) => println!("refresh finished: {status}"),
///     None => println!("still refreshing after two minutes"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct RefreshService {
    inner: Arc<ClientInner>,
}

impl RefreshService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// Kick off a refresh of all linked institutions, without waiting.
    pub async fn initiate(&self) -> Result<()> {
        let token = self.inner.token().await?;
        let form = vec![("token".to_string(), token)];
        // The endpoint answers with an HTML fragment, not JSON.
        self.inner
            .json_request(Method::POST, "refreshFILogins.xevent", &[], Some(&form), false)
            .await?;
        tracing::info!("account refresh initiated");
        Ok(())
    }

    /// Initiate a refresh and poll until the refreshing flag clears.
    ///
    /// Polls every `poll_every` up to a total budget of `max_wait`. Returns
    /// the final status document, or `None` if the budget ran out while the
    /// server was still refreshing.
    pub async fn wait(&self, max_wait: Duration, poll_every: Duration) -> Result<Option<Value>> {
        if poll_every.is_zero() {
            return Err(Error::InvalidInput("poll interval must be non-zero".into()));
        }

        self.initiate().await?;

        let deadline = tokio::time::Instant::now() + max_wait;
        loop {
            let status = self.inner.user_status().await?;
            if status.get("isRefreshing").and_then(Value::as_bool) == Some(false) {
                tracing::info!("account refresh finished");
                return Ok(Some(status));
            }
            if tokio::time::Instant::now() + poll_every > deadline {
                tracing::warn!("account refresh still running after {:?}", max_wait);
                return Ok(None);
            }
            tokio::time::sleep(poll_every).await;
        }
    }
}
