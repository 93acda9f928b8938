//! Transactions service: listing, streaming, and every edit operation.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use reqwest::Method;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::api::{CategoriesService, TagsService};
use crate::client::{ApiStyle, ClientInner, PageStream};
use crate::models::{AccountId, CategoryId, Transaction, TransactionId};
use crate::{Error, Result};

/// Date format the legacy form endpoints expect.
const FORM_DATE: &str = "%m/%d/%Y";

/// Sortable fields of the transaction listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Transaction date
    #[default]
    Date,
    /// Signed amount
    Amount,
    /// Merchant / description
    Merchant,
    /// Category name
    Category,
}

impl SortField {
    fn name(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Amount => "amount",
            SortField::Merchant => "merchant",
            SortField::Category => "category",
        }
    }
}

/// Map a sort field and direction to the server's opaque sort code.
///
/// The table is fixed server-side; combinations without a code fail here,
/// before any request is built. Category has an ascending code only.
pub fn sort_code(field: SortField, ascending: bool) -> Result<u8> {
    match (field, ascending) {
        (SortField::Date, true) => Ok(4),
        (SortField::Date, false) => Ok(8),
        (SortField::Amount, true) => Ok(7),
        (SortField::Amount, false) => Ok(3),
        (SortField::Merchant, true) => Ok(1),
        (SortField::Merchant, false) => Ok(5),
        (SortField::Category, true) => Ok(6),
        (SortField::Category, false) => Err(Error::UnsupportedSort {
            field: field.name(),
            direction: "descending",
        }),
    }
}

/// Filter and presentation options for transaction listings.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    /// Restrict to one account; `None` lists across accounts
    pub account: Option<AccountId>,
    /// Include the investment transaction table
    pub include_investment: bool,
    /// Earliest date, inclusive
    pub start_date: Option<NaiveDate>,
    /// Latest date, inclusive
    pub end_date: Option<NaiveDate>,
    /// Free-text search query
    pub query: Option<String>,
    /// Sort field
    pub sort_field: SortField,
    /// Sort direction
    pub sort_ascending: bool,
    /// Maximum number of records to return
    pub limit: Option<usize>,
    /// Row offset to start at
    pub offset: u64,
    /// Normalize raw display fields after fetching
    pub clean: bool,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            account: None,
            include_investment: true,
            start_date: None,
            end_date: None,
            query: None,
            sort_field: SortField::Date,
            sort_ascending: false,
            limit: None,
            offset: 0,
            clean: true,
        }
    }
}

/// A category given either by id or by (possibly parent-qualified) name.
#[derive(Debug, Clone)]
pub enum CategorySelector {
    /// Known id
    Id(CategoryId),
    /// Name, with an optional parent name for disambiguation
    Name {
        /// Category name
        name: String,
        /// Parent category name, when the name alone is ambiguous
        parent: Option<String>,
    },
}

impl CategorySelector {
    /// Select a category by name.
    pub fn name(name: impl Into<String>) -> Self {
        CategorySelector::Name {
            name: name.into(),
            parent: None,
        }
    }

    /// Select a category by name under a specific parent.
    pub fn name_under(name: impl Into<String>, parent: impl Into<String>) -> Self {
        CategorySelector::Name {
            name: name.into(),
            parent: Some(parent.into()),
        }
    }
}

impl From<CategoryId> for CategorySelector {
    fn from(id: CategoryId) -> Self {
        CategorySelector::Id(id)
    }
}

/// Field edits to apply to one or more transactions.
///
/// Absent fields are left untouched. Tag edits map tag names to desired
/// membership; tags not mentioned keep their current state.
#[derive(Debug, Clone, Default)]
pub struct TransactionEdit {
    /// New merchant / description
    pub description: Option<String>,
    /// New category
    pub category: Option<CategorySelector>,
    /// New note
    pub note: Option<String>,
    /// New date
    pub date: Option<NaiveDate>,
    /// Tag name to desired membership
    pub tags: BTreeMap<String, bool>,
}

/// A manually entered cash transaction.
///
/// A negative amount creates an expense, a positive one an income.
#[derive(Debug, Clone)]
pub struct NewCashTransaction {
    /// Merchant / description
    pub description: String,
    /// Signed amount
    pub amount: Decimal,
    /// Category
    pub category: Option<CategorySelector>,
    /// Free-form note
    pub note: Option<String>,
    /// Transaction date; today when absent
    pub date: Option<NaiveDate>,
    /// Tags to attach
    pub tags: Vec<String>,
}

/// One child of a split transaction.
#[derive(Debug, Clone)]
pub struct SplitPart {
    /// Child description
    pub description: String,
    /// Child amount
    pub amount: Decimal,
    /// Child category
    pub category: CategorySelector,
}

/// Service for transaction retrieval and mutation.
///
/// # Example
///
/// ```no_run
/// use mint_rs::api::{TransactionFilter, TransactionEdit, CategorySelector};
///
/// # async fn example(client: mint_rs::MintClient) -> mint_rs::Result<()> {
/// let filter = TransactionFilter {
///     limit: Some(100),
///     ..Default::default()
/// };
/// let transactions = client.transactions().list(&filter).await?;
///
/// let edit = TransactionEdit {
///     category: Some(CategorySelector::name("Groceries")),
///     ..Default::default()
/// };
/// let ids = vec![transactions[0].transaction_id()];
/// client.transactions().update(&ids, &edit).await?;
/// # Ok(())
/// # }
/// ```
pub struct TransactionsService {
    inner: Arc<ClientInner>,
}

impl TransactionsService {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    fn categories(&self) -> CategoriesService {
        CategoriesService::new(self.inner.clone())
    }

    fn tags(&self) -> TagsService {
        TagsService::new(self.inner.clone())
    }

    /// The raw lazy page stream behind [`list`](Self::list).
    ///
    /// Yields untruncated, uncleaned row values; the filter's `limit` and
    /// `clean` fields are ignored here.
    pub fn stream(&self, filter: &TransactionFilter) -> Result<PageStream> {
        let code = sort_code(filter.sort_field, filter.sort_ascending)?;

        let mut params = vec![("comparableType".to_string(), code.to_string())];
        if let Some(account) = filter.account {
            params.push(("task".to_string(), "transactions".to_string()));
            params.push(("accountId".to_string(), account.to_string()));
        } else if filter.include_investment {
            params.push(("task".to_string(), "transactions".to_string()));
            params.push(("accountId".to_string(), "0".to_string()));
        } else {
            params.push(("task".to_string(), "transactions,txnfilter".to_string()));
            params.push(("filterType".to_string(), "cash".to_string()));
        }
        if let Some(start) = filter.start_date {
            params.push(("startDate".to_string(), start.format(FORM_DATE).to_string()));
        }
        if let Some(end) = filter.end_date {
            params.push(("endDate".to_string(), end.format(FORM_DATE).to_string()));
        }
        if let Some(query) = &filter.query {
            params.push(("query".to_string(), query.clone()));
        }

        Ok(self.inner.clone().page_stream(params, filter.offset))
    }

    /// List transactions matching `filter`.
    ///
    /// Fetching everything is slow; prefer setting `filter.limit`.
    pub async fn list(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        use futures_util::StreamExt;

        let mut stream = self.stream(filter)?;
        let limit = filter.limit.unwrap_or(usize::MAX);
        let mut transactions = Vec::new();

        while transactions.len() < limit {
            let Some(row) = stream.next().await else { break };
            let mut transaction: Transaction = serde_json::from_value(row?)?;
            if filter.clean {
                transaction.clean()?;
            }
            transactions.push(transaction);
        }

        tracing::debug!("listed {} transactions", transactions.len());
        Ok(transactions)
    }

    /// Apply the same edit to one or more transactions.
    pub async fn update(&self, ids: &[TransactionId], edit: &TransactionEdit) -> Result<()> {
        if ids.is_empty() {
            return Err(Error::InvalidInput("no transaction ids given".into()));
        }

        let category = match &edit.category {
            Some(selector) => Some(self.resolve_selector(selector).await?),
            None => None,
        };

        match self.inner.config.api_style {
            ApiStyle::Legacy => {
                for id in ids {
                    self.legacy_update(id, edit, category.as_ref()).await?;
                }
            }
            ApiStyle::Pfm => {
                for id in ids {
                    self.pfm_update(id, edit, category.as_ref()).await?;
                }
            }
        }
        Ok(())
    }

    /// Replace a transaction's split children with `parts`.
    ///
    /// An empty `parts` un-splits. If the parts do not sum to the original
    /// amount the server creates a remainder child on its own; no client-side
    /// correction is attempted.
    pub async fn split(&self, id: &TransactionId, parts: &[SplitPart]) -> Result<()> {
        let token = self.inner.token().await?;
        let mut form = vec![
            ("task".to_string(), "split".to_string()),
            ("data".to_string(), String::new()),
            ("txnId".to_string(), id.to_string()),
            ("token".to_string(), token),
        ];

        for (i, part) in parts.iter().enumerate() {
            let (category_id, category_name) = self.resolve_selector(&part.category).await?;
            form.push((format!("amount{i}"), part.amount.abs().to_string()));
            form.push((format!("merchant{i}"), part.description.clone()));
            form.push((format!("category{i}"), category_name));
            form.push((format!("categoryId{i}"), category_id.to_string()));
            form.push((format!("txnId{i}"), "0".to_string()));
        }

        self.inner
            .json_request(Method::POST, "updateTransaction.xevent", &[], Some(&form), true)
            .await?;
        Ok(())
    }

    /// Delete a transaction.
    ///
    /// Only pending transactions and manually entered cash transactions can
    /// be deleted; anything else is refused before a request is sent, which
    /// is why this takes the full record rather than an id.
    pub async fn delete(&self, transaction: &Transaction) -> Result<()> {
        if !transaction.is_deletable() {
            return Err(Error::NotEditable(format!(
                "transaction {} is neither pending nor manually entered cash",
                transaction.id
            )));
        }

        let token = self.inner.token().await?;
        let form = vec![
            ("task".to_string(), "delete".to_string()),
            ("txnId".to_string(), transaction.transaction_id().to_string()),
            ("token".to_string(), token),
        ];
        self.inner
            .json_request(Method::POST, "updateTransaction.xevent", &[], Some(&form), true)
            .await?;
        Ok(())
    }

    /// Create a manually entered cash transaction.
    pub async fn add_cash(&self, new: &NewCashTransaction) -> Result<()> {
        let token = self.inner.token().await?;
        let date = new
            .date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let mut form = vec![
            ("txnId".to_string(), ":0".to_string()),
            ("task".to_string(), "txnadd".to_string()),
            ("token".to_string(), token),
            ("mtType".to_string(), "cash".to_string()),
            ("mtCashSplitPref".to_string(), "2".to_string()),
            ("merchant".to_string(), new.description.clone()),
            ("amount".to_string(), new.amount.abs().to_string()),
            (
                "mtIsExpense".to_string(),
                new.amount.is_sign_negative().to_string(),
            ),
            ("date".to_string(), date.format(FORM_DATE).to_string()),
        ];
        if let Some(note) = &new.note {
            form.push(("note".to_string(), note.clone()));
        }
        if let Some(selector) = &new.category {
            let (category_id, _) = self.resolve_selector(selector).await?;
            form.push(("catId".to_string(), category_id.to_string()));
        }
        for tag in &new.tags {
            let tag_id = self.tags().resolve(tag).await?;
            form.push((format!("tag{tag_id}"), "2".to_string()));
        }

        self.inner
            .json_request(Method::POST, "updateTransaction.xevent", &[], Some(&form), true)
            .await?;
        Ok(())
    }

    /// Download the bulk CSV export.
    ///
    /// Far less detail than [`list`](Self::list), but a single request. The
    /// bytes are passed through untouched.
    pub async fn export_csv(&self, include_investment: bool) -> Result<Vec<u8>> {
        let query = if include_investment {
            vec![("accountId".to_string(), "0".to_string())]
        } else {
            vec![]
        };
        self.inner.get_bytes("transactionDownload.event", &query).await
    }

    /// Resolve a selector to an id and the matching canonical name.
    async fn resolve_selector(&self, selector: &CategorySelector) -> Result<(CategoryId, String)> {
        let categories = self.categories().list().await?;
        let id = match selector {
            CategorySelector::Id(id) => *id,
            CategorySelector::Name { name, parent } => {
                crate::models::resolve_category(&categories, name, parent.as_deref())?
            }
        };
        let name = categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
            .ok_or_else(|| Error::UnknownCategory(id.to_string()))?;
        Ok((id, name))
    }

    /// One form-post edit against the legacy endpoint. Tags are addressed
    /// individually by numeric flag, so no read of current state is needed.
    async fn legacy_update(
        &self,
        id: &TransactionId,
        edit: &TransactionEdit,
        category: Option<&(CategoryId, String)>,
    ) -> Result<()> {
        let token = self.inner.token().await?;
        let mut form = vec![
            ("task".to_string(), "txnedit".to_string()),
            ("token".to_string(), token),
            ("txnId".to_string(), id.to_string()),
        ];
        if let Some(description) = &edit.description {
            form.push(("merchant".to_string(), description.clone()));
        }
        if let Some((category_id, category_name)) = category {
            form.push(("catId".to_string(), category_id.to_string()));
            form.push(("category".to_string(), category_name.clone()));
        }
        if let Some(note) = &edit.note {
            form.push(("note".to_string(), note.clone()));
        }
        if let Some(date) = edit.date {
            form.push(("date".to_string(), date.format(FORM_DATE).to_string()));
        }
        for (tag, on) in &edit.tags {
            let tag_id = self.tags().resolve(tag).await?;
            form.push((format!("tag{tag_id}"), if *on { "2" } else { "0" }.to_string()));
        }

        let response = self
            .inner
            .json_request(Method::POST, "updateTransaction.xevent", &[], Some(&form), true)
            .await?;
        if response.get("task").and_then(Value::as_str) != Some("txnedit") {
            return Err(Error::Protocol(format!(
                "edit of transaction {id} was not acknowledged: {response}"
            )));
        }
        Ok(())
    }

    /// One resource-style edit. Tags here are a whole-set field, so the
    /// current set is read first and the name edits merged into it.
    async fn pfm_update(
        &self,
        id: &TransactionId,
        edit: &TransactionEdit,
        category: Option<&(CategoryId, String)>,
    ) -> Result<()> {
        let mut body = json!({ "type": "CashAndCreditTransaction" });

        if let Some(description) = &edit.description {
            body["description"] = json!(description);
        }
        if let Some((category_id, category_name)) = category {
            body["category"] = json!({ "id": category_id, "name": category_name });
        }
        if let Some(note) = &edit.note {
            body["notes"] = json!(note);
        }
        if let Some(date) = edit.date {
            body["date"] = json!(date.format("%Y-%m-%d").to_string());
        }

        if !edit.tags.is_empty() {
            let current = self
                .inner
                .pfm_request(Method::GET, &format!("transactions/{id}"), None)
                .await?;
            let current_names: BTreeSet<String> = current
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            let merged = crate::models::merge_tags(&current_names, &edit.tags);
            let mut tag_refs = Vec::new();
            for name in &merged {
                let tag_id = self.tags().resolve(name).await?;
                tag_refs.push(json!({ "id": tag_id, "name": name }));
            }
            body["tags"] = Value::Array(tag_refs);
        }

        self.inner
            .pfm_request(Method::PUT, &format!("transactions/{id}"), Some(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_code_table() {
        assert_eq!(sort_code(SortField::Date, true).unwrap(), 4);
        assert_eq!(sort_code(SortField::Date, false).unwrap(), 8);
        assert_eq!(sort_code(SortField::Amount, true).unwrap(), 7);
        assert_eq!(sort_code(SortField::Amount, false).unwrap(), 3);
        assert_eq!(sort_code(SortField::Merchant, true).unwrap(), 1);
        assert_eq!(sort_code(SortField::Merchant, false).unwrap(), 5);
        assert_eq!(sort_code(SortField::Category, true).unwrap(), 6);
    }

    #[test]
    fn test_unsupported_sort_fails() {
        assert!(matches!(
            sort_code(SortField::Category, false),
            Err(Error::UnsupportedSort {
                field: "category",
                direction: "descending",
            })
        ));
    }

    #[test]
    fn test_default_filter() {
        let filter = TransactionFilter::default();
        assert!(filter.include_investment);
        assert!(filter.clean);
        assert_eq!(filter.sort_field, SortField::Date);
        assert!(!filter.sort_ascending);
    }
}
