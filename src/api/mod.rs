//! API service modules, one per resource family.
//!
//! Services are cheap handles over the shared client state; obtain them from
//! the accessor methods on [`MintClient`](crate::MintClient).

mod accounts;
mod categories;
mod preferences;
mod refresh;
mod tags;
mod transactions;

pub use accounts::AccountsService;
pub use categories::CategoriesService;
pub use preferences::PreferencesService;
pub use refresh::RefreshService;
pub use tags::TagsService;
pub use transactions::{
    sort_code, CategorySelector, NewCashTransaction, SortField, SplitPart, TransactionEdit,
    TransactionFilter, TransactionsService,
};
