//! Lazy stream over the legacy offset-paged transaction feed.
//!
//! The legacy endpoint has no cursor and no total count: the client asks for
//! rows at an offset, advances the offset by however many rows came back,
//! and stops at the first empty page. Each request also carries a random
//! nonce, purely to defeat intermediary caches.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use serde_json::Value;

use crate::Result;

/// Type alias for a boxed future used internally.
type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Type of the page-fetching callback: offset in, raw rows out.
pub type FetchPage = dyn Fn(u64) -> BoxFuture<'static, Result<Vec<Value>>> + Send + Sync;

/// A finite, lazy stream of raw transaction rows.
///
/// Yields rows one at a time, fetching the next page only when the current
/// one is exhausted, and terminates permanently after the first empty page
/// or the first error. There is no resumption; re-invoke the listing to
/// start over.
///
/// # Example
///
/// ```no_run
/// use futures_util::StreamExt;
/// use mint_rs::TransactionFilter;
///
/// # async fn example(client: mint_rs::MintClient) -> mint_rs::Result<()> {
/// let mut stream = client.transactions().stream(&TransactionFilter::default())?;
/// while let Some(row) = stream.next().await {
///     println!("{}", row?);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PageStream {
    fetch_page: Box<FetchPage>,
    /// Offset of the next page to request
    offset: u64,
    buffered: VecDeque<Value>,
    pending: Option<BoxFuture<'static, Result<Vec<Value>>>>,
    done: bool,
}

impl PageStream {
    /// Create a stream starting at `initial_offset`.
    pub fn new<F>(initial_offset: u64, fetch_page: F) -> Self
    where
        F: Fn(u64) -> BoxFuture<'static, Result<Vec<Value>>> + Send + Sync + 'static,
    {
        Self {
            fetch_page: Box::new(fetch_page),
            offset: initial_offset,
            buffered: VecDeque::new(),
            pending: None,
            done: false,
        }
    }
}

impl Stream for PageStream {
    type Item = Result<Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(row) = this.buffered.pop_front() {
                return Poll::Ready(Some(Ok(row)));
            }

            if this.done {
                return Poll::Ready(None);
            }

            if let Some(fut) = this.pending.as_mut() {
                match fut.as_mut().poll(cx) {
                    Poll::Ready(Ok(rows)) => {
                        this.pending = None;
                        if rows.is_empty() {
                            // Empty page terminates the feed; no further
                            // requests are issued.
                            this.done = true;
                            return Poll::Ready(None);
                        }
                        this.offset += rows.len() as u64;
                        this.buffered.extend(rows);
                        continue;
                    }
                    Poll::Ready(Err(e)) => {
                        this.pending = None;
                        this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                    Poll::Pending => return Poll::Pending,
                }
            }

            this.pending = Some((this.fetch_page)(this.offset));
        }
    }
}

impl Unpin for PageStream {}

impl std::fmt::Debug for PageStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageStream")
            .field("offset", &self.offset)
            .field("buffered", &self.buffered.len())
            .field("pending", &self.pending.is_some())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Build a stream over fixed page sizes, counting requests.
    fn sized_pages(sizes: &'static [usize], calls: Arc<AtomicUsize>) -> PageStream {
        PageStream::new(0, move |offset| {
            let calls = calls.clone();
            Box::pin(async move {
                let page = calls.fetch_add(1, Ordering::SeqCst);
                let size = sizes.get(page).copied().unwrap_or_else(|| {
                    panic!("request beyond terminating page at offset {offset}")
                });
                Ok((0..size).map(|i| Value::from(offset + i as u64)).collect())
            })
        })
    }

    #[tokio::test]
    async fn test_yields_all_rows_and_stops_at_empty_page() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut stream = sized_pages(&[100, 100, 37, 0], calls.clone());

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await {
            rows.push(row.unwrap());
        }

        assert_eq!(rows.len(), 237);
        // Rows carry the offsets they were fetched at, in order.
        assert_eq!(rows[0], Value::from(0u64));
        assert_eq!(rows[236], Value::from(236u64));
        // One request per page including the terminating empty one, no more.
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // Drained stream stays drained without further requests.
        assert!(stream.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_initial_offset_is_respected() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        let mut stream = PageStream::new(50, move |offset| {
            let seen = seen2.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(offset);
                Ok(if offset < 56 {
                    vec![Value::Null; 3]
                } else {
                    vec![]
                })
            })
        });

        let mut count = 0;
        while let Some(row) = stream.next().await {
            row.unwrap();
            count += 1;
        }
        assert_eq!(count, 6);
        assert_eq!(*seen.lock().unwrap(), vec![50, 53, 56]);
    }

    #[tokio::test]
    async fn test_error_terminates_the_stream() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = calls.clone();
        let mut stream = PageStream::new(0, move |_| {
            let calls = calls2.clone();
            Box::pin(async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok(vec![Value::Null])
                } else {
                    Err(crate::Error::SessionExpired)
                }
            })
        });

        assert!(stream.next().await.unwrap().is_ok());
        assert!(matches!(
            stream.next().await,
            Some(Err(crate::Error::SessionExpired))
        ));
        assert!(stream.next().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
