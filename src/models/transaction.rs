//! Transaction model and the raw-field cleaning step.
//!
//! The legacy transaction endpoint returns amounts as display strings
//! (`"$1,234.56"` plus an `isDebit` flag) and dates in two formats: `MM/dd/yy`
//! for previous years and an abbreviated `Mon d` for the current year.
//! [`Transaction::clean`] normalizes both to machine-friendly forms. Cleaning
//! is idempotent: a record that is already clean passes through unchanged.

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::{CategoryId, TagId, TransactionId, TransactionKind};

/// Canonical date format after cleaning.
const ISO_DATE: &str = "%Y-%m-%d";

/// A transaction amount, either as received from the server or normalized.
///
/// Raw legacy amounts are unsigned display strings; the debit/credit sign
/// lives in a separate flag. After cleaning the amount is a signed
/// [`Decimal`] (negative for debits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    /// Normalized signed amount
    Clean(Decimal),
    /// Display string as returned by the server, e.g. `"$1,234.56"`
    Raw(String),
}

impl Amount {
    /// Normalize a raw display amount into a signed decimal.
    ///
    /// Already-clean amounts are returned unchanged, so cleaning twice is
    /// safe.
    pub fn clean(&self, is_debit: bool) -> Result<Amount> {
        match self {
            Amount::Clean(d) => Ok(Amount::Clean(*d)),
            Amount::Raw(s) => {
                let stripped: String = s
                    .chars()
                    .filter(|c| !matches!(c, '$' | ','))
                    .collect();
                let value = Decimal::from_str(stripped.trim()).map_err(|_| {
                    Error::InvalidInput(format!("unparseable amount {s:?}"))
                })?;
                Ok(Amount::Clean(if is_debit { -value } else { value }))
            }
        }
    }

    /// The normalized value, if this amount has been cleaned.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Amount::Clean(d) => Some(*d),
            Amount::Raw(_) => None,
        }
    }
}

/// A tag reference attached to a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag id
    pub id: TagId,
    /// Tag name
    pub name: String,
}

/// A single transaction record.
///
/// Unmodeled server fields are preserved verbatim in [`extra`](Self::extra)
/// so nothing is lost between fetch and any later serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Numeric transaction id
    pub id: i64,
    /// Transaction date; canonical `YYYY-MM-DD` after cleaning
    pub date: String,
    /// Original (pre-edit) date, if the server sent one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odate: Option<String>,
    /// Merchant / description
    #[serde(default)]
    pub merchant: String,
    /// Free-form note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Whether the amount is a debit (spend)
    #[serde(rename = "isDebit", default)]
    pub is_debit: bool,
    /// Amount; signed decimal after cleaning
    pub amount: Amount,
    /// Category name
    #[serde(default)]
    pub category: String,
    /// Category id
    #[serde(rename = "categoryId", default)]
    pub category_id: Option<CategoryId>,
    /// Tag membership
    #[serde(rename = "labels", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRef>,
    /// Not yet posted by the financial institution
    #[serde(rename = "isPending", default)]
    pub is_pending: bool,
    /// Flagged as a likely duplicate
    #[serde(rename = "isDuplicate", default)]
    pub is_duplicate: bool,
    /// This record is a split child
    #[serde(rename = "isChild", default)]
    pub is_child: bool,
    /// Parent transaction id, for split children
    #[serde(rename = "pid", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    /// Legacy table selector: `0` cash/credit, `1` investment
    #[serde(rename = "txnType", default)]
    pub txn_type: i32,
    /// Non-zero for manually entered transactions
    #[serde(rename = "manualType", default)]
    pub manual_type: i32,
    /// Server fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Which legacy table this transaction lives in.
    pub fn kind(&self) -> TransactionKind {
        if self.txn_type == 1 {
            TransactionKind::Investment
        } else {
            TransactionKind::CashAndCredit
        }
    }

    /// The composite id used to address this transaction in edit calls.
    pub fn transaction_id(&self) -> TransactionId {
        TransactionId::legacy(self.id, self.kind())
    }

    /// Whether this transaction was entered by hand rather than imported.
    pub fn is_manual(&self) -> bool {
        self.manual_type != 0
    }

    /// Whether the server permits deleting this transaction.
    ///
    /// Only pending transactions and manually entered cash transactions can
    /// be deleted; everything else is institution data the site refuses to
    /// drop.
    pub fn is_deletable(&self) -> bool {
        self.is_pending
            || (self.is_manual() && self.kind() == TransactionKind::CashAndCredit)
    }

    /// Normalize raw display fields in place, using today's date to resolve
    /// current-year abbreviated dates.
    ///
    /// Idempotent: cleaning an already-clean record yields the same record.
    pub fn clean(&mut self) -> Result<()> {
        self.clean_with_today(Utc::now().date_naive())
    }

    /// [`clean`](Self::clean) with an explicit "today", for deterministic
    /// resolution of abbreviated dates.
    pub fn clean_with_today(&mut self, today: NaiveDate) -> Result<()> {
        self.date = clean_date(&self.date, today)?;
        if let Some(odate) = &self.odate {
            self.odate = Some(clean_date(odate, today)?);
        }
        self.amount = self.amount.clean(self.is_debit)?;
        Ok(())
    }
}

/// Normalize a server date string to `YYYY-MM-DD`.
///
/// Accepts, in order: already-canonical ISO dates (returned unchanged),
/// `MM/dd/yy` and `MM/dd/YYYY` (previous-year records), and abbreviated
/// `Mon d` forms which the server uses for the current year.
pub fn clean_date(raw: &str, today: NaiveDate) -> Result<String> {
    if NaiveDate::parse_from_str(raw, ISO_DATE).is_ok() {
        return Ok(raw.to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%y") {
        return Ok(d.format(ISO_DATE).to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(d.format(ISO_DATE).to_string());
    }
    let with_year = format!("{} {}", raw, today.year());
    if let Ok(d) = NaiveDate::parse_from_str(&with_year, "%b %d %Y") {
        return Ok(d.format(ISO_DATE).to_string());
    }
    Err(Error::InvalidInput(format!("unparseable date {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn raw_transaction() -> Transaction {
        serde_json::from_value(serde_json::json!({
            "id": 1234567,
            "date": "Feb 23",
            "odate": "02/21/23",
            "merchant": "Corner Store",
            "isDebit": true,
            "amount": "$1,234.56",
            "category": "Groceries",
            "categoryId": 701,
            "txnType": 0,
            "manualType": 0,
            "fi": "Some Bank"
        }))
        .unwrap()
    }

    #[test]
    fn test_clean_normalizes_raw_fields() {
        let mut txn = raw_transaction();
        txn.clean_with_today(today()).unwrap();

        assert_eq!(txn.date, "2024-02-23");
        assert_eq!(txn.odate.as_deref(), Some("2023-02-21"));
        assert_eq!(txn.amount, Amount::Clean(dec!(-1234.56)));
        // Unmodeled fields survive
        assert_eq!(txn.extra.get("fi").and_then(|v| v.as_str()), Some("Some Bank"));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let mut txn = raw_transaction();
        txn.clean_with_today(today()).unwrap();
        let once = format!("{:?}", txn);
        txn.clean_with_today(today()).unwrap();
        assert_eq!(once, format!("{:?}", txn));
    }

    #[test]
    fn test_credit_amount_sign() {
        let amount = Amount::Raw("$25.00".into()).clean(false).unwrap();
        assert_eq!(amount, Amount::Clean(dec!(25.00)));
    }

    #[test]
    fn test_clean_date_passthrough_and_errors() {
        assert_eq!(clean_date("2023-12-31", today()).unwrap(), "2023-12-31");
        assert_eq!(clean_date("12/31/23", today()).unwrap(), "2023-12-31");
        assert!(clean_date("someday", today()).is_err());
    }

    #[test]
    fn test_deletable_guard() {
        let mut txn = raw_transaction();
        assert!(!txn.is_deletable());

        txn.is_pending = true;
        assert!(txn.is_deletable());

        txn.is_pending = false;
        txn.manual_type = 1;
        assert!(txn.is_deletable());

        // Manual investment rows are still not deletable
        txn.txn_type = 1;
        assert!(!txn.is_deletable());
    }

    #[test]
    fn test_transaction_id_uses_kind_suffix() {
        let mut txn = raw_transaction();
        assert_eq!(txn.transaction_id().to_string(), "1234567:0");
        txn.txn_type = 1;
        assert_eq!(txn.transaction_id().to_string(), "1234567:1");
    }
}
