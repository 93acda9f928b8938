//! Per-session memoization of the rarely changing listings.
//!
//! Accounts, categories and tags are fetched once per session and reused.
//! The cache is invalidated explicitly, never merged: after a fresh login
//! and after any mutation the slot is simply cleared and the next read
//! refetches.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{Account, Category, Tag};
use crate::Result;

/// One memoized listing.
pub(crate) struct Listing<T> {
    slot: RwLock<Option<Arc<Vec<T>>>>,
}

impl<T> Listing<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Return the cached listing, loading it with `load` on a miss.
    ///
    /// The client issues requests sequentially, so no effort is made to
    /// deduplicate concurrent loads.
    pub(crate) async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        if let Some(cached) = self.slot.read().await.as_ref() {
            return Ok(cached.clone());
        }
        let loaded = Arc::new(load().await?);
        *self.slot.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drop the cached listing.
    pub(crate) async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

/// The three per-session listing caches.
pub(crate) struct Listings {
    pub(crate) accounts: Listing<Account>,
    pub(crate) categories: Listing<Category>,
    pub(crate) tags: Listing<Tag>,
}

impl Listings {
    pub(crate) fn new() -> Self {
        Self {
            accounts: Listing::new(),
            categories: Listing::new(),
            tags: Listing::new(),
        }
    }

    /// Clear everything; called after login and logout.
    pub(crate) async fn invalidate_all(&self) {
        self.accounts.invalidate().await;
        self.categories.invalidate().await;
        self.tags.invalidate().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_loads_once_until_invalidated() {
        let listing: Listing<i32> = Listing::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let got = listing
                .get_or_load(|| async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(*got, vec![1, 2, 3]);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        listing.invalidate().await;
        listing
            .get_or_load(|| async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(vec![4])
            })
            .await
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let listing: Listing<i32> = Listing::new();

        let err = listing
            .get_or_load(|| async { Err(crate::Error::SessionExpired) })
            .await;
        assert!(err.is_err());

        let got = listing.get_or_load(|| async { Ok(vec![7]) }).await.unwrap();
        assert_eq!(*got, vec![7]);
    }
}
