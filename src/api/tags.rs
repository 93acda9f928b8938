//! Tags service.

use std::sync::Arc;

use regex::Regex;
use reqwest::Method;
use serde_json::Value;

use crate::client::ClientInner;
use crate::models::{Tag, TagId};
use crate::{Error, Result};

/// Service for user-defined tags.
///
/// Tags exist only as a name-to-id mapping; transactions reference them by
/// id. Creation is the one write, and it answers with an XML-ish fragment
/// rather than JSON.
pub struct TagsService {
    inner: Arc<ClientInner>,
}

impl TagsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List all tags, memoized for the session.
    pub async fn list(&self) -> Result<Arc<Vec<Tag>>> {
        let inner = self.inner.clone();
        self.inner
            .listings
            .tags
            .get_or_load(|| async move {
                let response = inner
                    .service_call("MintTransactionService", "getTagsByFrequency", Value::Object(Default::default()))
                    .await?;
                Ok(serde_json::from_value(response)?)
            })
            .await
    }

    /// Resolve a tag name to its id.
    pub async fn resolve(&self, name: &str) -> Result<TagId> {
        let tags = self.list().await?;
        tags.iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| Error::UnknownTag(name.to_string()))
    }

    /// Create a tag and return its id.
    ///
    /// Creating a tag that already exists is refused locally.
    pub async fn create(&self, name: &str) -> Result<TagId> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("tag name must be non-empty".into()));
        }
        match self.resolve(name).await {
            Ok(_) => {
                return Err(Error::InvalidInput(format!("{name:?} is already a tag")));
            }
            Err(Error::UnknownTag(_)) => {}
            Err(err) => return Err(err),
        }

        let token = self.inner.token().await?;
        let form = vec![
            ("nameOfTag".to_string(), name.to_string()),
            ("task".to_string(), "C".to_string()),
            ("token".to_string(), token),
        ];
        let response = self
            .inner
            .json_request(Method::POST, "updateTag.xevent", &[], Some(&form), false)
            .await?;
        let body = response.as_str().unwrap_or_default();
        let id = parse_tag_id(body).ok_or_else(|| {
            Error::Protocol(format!("unexpected tag-creation response: {body}"))
        })?;

        self.inner.listings.tags.invalidate().await;
        tracing::info!("created tag {name:?} with id {id}");
        Ok(TagId::new(id))
    }
}

/// Pull the id out of the endpoint's `<tagId>123</tagId>` fragment.
fn parse_tag_id(body: &str) -> Option<i64> {
    let pattern = Regex::new(r"<tagId>([0-9]+)</tagId>").ok()?;
    pattern
        .captures(body)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}
