//! Data models for Mint API resources.

mod account;
mod category;
mod primitives;
mod tag;
mod transaction;

pub use account::{Account, AccountKind};
pub use category::{resolve_category, Category, CategoryParent};
pub use primitives::{
    AccountId, CategoryId, TagId, TransactionId, TransactionKind, SYSTEM_CATEGORY_MAX_ID,
};
pub use tag::{merge_tags, Tag};
pub use transaction::{clean_date, Amount, TagRef, Transaction};
