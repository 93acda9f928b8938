//! Primitive types and newtypes for type-safe API interactions.
//!
//! Accounts, categories and tags are identified by plain numeric ids;
//! transactions carry a composite id whose shape depends on the API style.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Create a new id.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw numeric value.
            pub fn value(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

numeric_id! {
    /// A strongly-typed account id.
    AccountId
}

numeric_id! {
    /// A strongly-typed category id.
    CategoryId
}

numeric_id! {
    /// A strongly-typed tag id.
    TagId
}

/// Largest category id the server reserves for its built-in category tree.
///
/// Categories at or below this id are system-provided and immutable;
/// user-created categories are assigned ids above it.
pub const SYSTEM_CATEGORY_MAX_ID: i64 = 100_000;

impl CategoryId {
    /// Returns `true` if this id is in the user-created range and may be
    /// renamed or deleted by the client.
    pub fn is_user_defined(&self) -> bool {
        self.0 > SYSTEM_CATEGORY_MAX_ID
    }
}

/// Which legacy transaction table a record lives in.
///
/// The legacy API keeps cash/credit and investment transactions in separate
/// tables and distinguishes them with a numeric suffix on the transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Bank and credit-card transactions (id suffix `0`)
    CashAndCredit,
    /// Investment transactions (id suffix `1`)
    Investment,
}

impl TransactionKind {
    pub(crate) fn suffix(&self) -> u8 {
        match self {
            TransactionKind::CashAndCredit => 0,
            TransactionKind::Investment => 1,
        }
    }
}

/// A composite transaction id.
///
/// The legacy API addresses transactions as `"<numeric id>:<kind suffix>"`,
/// while the newer PFM API uses opaque compound string ids. Both shapes are
/// carried so the same edit methods work against either style.
///
/// # Example
///
/// ```
/// use mint_rs::models::{TransactionId, TransactionKind};
///
/// let id = TransactionId::legacy(1234567, TransactionKind::CashAndCredit);
/// assert_eq!(id.to_string(), "1234567:0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionId {
    /// Legacy numeric id plus table suffix
    Legacy {
        /// Numeric transaction id
        id: i64,
        /// Which table the transaction lives in
        kind: TransactionKind,
    },
    /// Compound string id used by the PFM API
    Pfm(String),
}

impl TransactionId {
    /// Create a legacy transaction id.
    pub fn legacy(id: i64, kind: TransactionKind) -> Self {
        TransactionId::Legacy { id, kind }
    }

    /// Create a PFM compound transaction id.
    pub fn pfm(id: impl Into<String>) -> Self {
        TransactionId::Pfm(id.into())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionId::Legacy { id, kind } => write!(f, "{}:{}", id, kind.suffix()),
            TransactionId::Pfm(id) => write!(f, "{}", id),
        }
    }
}
