//! Categories service.

use std::sync::Arc;

use serde_json::json;

use crate::client::ClientInner;
use crate::models::{resolve_category, Category, CategoryId};
use crate::{Error, Result};

/// Service for the category tree.
///
/// The tree mixes immutable system categories with user-created ones; the
/// mutating methods check locally that the target is user-created before any
/// request goes out.
///
/// # Example
///
/// ```no_run
/// # async fn example(client: mint_rs::MintClient) -> mint_rs::Result<()> {
/// let id = client.categories().resolve("Groceries", None).await?;
/// println!("Groceries is category {id}");
/// # Ok(())
/// # }
/// ```
pub struct CategoriesService {
    inner: Arc<ClientInner>,
}

impl CategoriesService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// List the full category tree, memoized for the session.
    pub async fn list(&self) -> Result<Arc<Vec<Category>>> {
        let inner = self.inner.clone();
        self.inner
            .listings
            .categories
            .get_or_load(|| async move {
                let args = json!({
                    "excludedCategories": [],
                    "sortByPrecedence": false,
                    "categoryTypeFilter": "FREE",
                });
                let response = inner
                    .service_call("MintCategoryService", "getCategoryTreeDto2", args)
                    .await?;
                let categories = response.get("allCategories").cloned().ok_or_else(|| {
                    Error::Protocol("category tree missing 'allCategories'".into())
                })?;
                Ok(serde_json::from_value(categories)?)
            })
            .await
    }

    /// Resolve a category name to its id.
    ///
    /// When several categories share the name, `parent_name` selects among
    /// them; without it the ambiguity is an error listing the candidates.
    pub async fn resolve(&self, name: &str, parent_name: Option<&str>) -> Result<CategoryId> {
        let categories = self.list().await?;
        resolve_category(&categories, name, parent_name)
    }

    /// Create a category under an existing parent.
    ///
    /// Returns nothing; the fresh id shows up in the next listing.
    pub async fn create(&self, name: &str, parent: CategoryId) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("category name must be non-empty".into()));
        }
        self.require_known(parent).await?;

        let args = json!({ "name": name, "parentId": parent });
        self.inner
            .service_call("MintCategoryService", "createCategory", args)
            .await?;
        self.inner.listings.categories.invalidate().await;
        tracing::info!("created category {name:?}");
        Ok(())
    }

    /// Rename a user-created category.
    pub async fn rename(&self, id: CategoryId, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("category name must be non-empty".into()));
        }
        self.require_user_defined(id).await?;

        let args = json!({ "categoryId": id, "name": name });
        self.inner
            .service_call("MintCategoryService", "updateCategory", args)
            .await?;
        self.inner.listings.categories.invalidate().await;
        Ok(())
    }

    /// Delete a user-created category.
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        self.require_user_defined(id).await?;

        let args = json!({ "categoryId": id });
        self.inner
            .service_call("MintCategoryService", "deleteCategory", args)
            .await?;
        self.inner.listings.categories.invalidate().await;
        Ok(())
    }

    async fn require_known(&self, id: CategoryId) -> Result<Category> {
        let categories = self.list().await?;
        categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| Error::UnknownCategory(id.to_string()))
    }

    /// Local mutability guard; system and top-level categories are refused
    /// before any request is sent.
    async fn require_user_defined(&self, id: CategoryId) -> Result<()> {
        let category = self.require_known(id).await?;
        if !category.is_user_defined() {
            return Err(Error::NotEditable(format!(
                "category {} ({:?}) is system-provided",
                id, category.name
            )));
        }
        Ok(())
    }
}
