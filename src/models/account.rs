//! Account models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::AccountId;

/// Account types known to the aggregation site.
///
/// Used when requesting the account listing; the server expects the
/// upper-snake spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountKind {
    /// Checking and savings accounts
    Bank,
    /// Credit cards
    Credit,
    /// Brokerage and retirement accounts
    Investment,
    /// Loans
    Loan,
    /// Mortgages
    Mortgage,
    /// Other property
    OtherProperty,
    /// Real estate
    RealEstate,
    /// Vehicles
    Vehicle,
    /// Anything the site could not classify
    Unclassified,
}

impl AccountKind {
    /// All account kinds, in the order the site lists them.
    pub const ALL: [AccountKind; 9] = [
        AccountKind::Bank,
        AccountKind::Credit,
        AccountKind::Investment,
        AccountKind::Loan,
        AccountKind::Mortgage,
        AccountKind::OtherProperty,
        AccountKind::RealEstate,
        AccountKind::Vehicle,
        AccountKind::Unclassified,
    ];
}

/// A linked or manual financial account.
///
/// Read-mostly: visibility and the manual value are the only fields the
/// client can change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account id
    #[serde(rename = "accountId")]
    pub id: AccountId,
    /// Display name
    #[serde(rename = "accountName", default)]
    pub name: String,
    /// Account type as reported by the server (e.g. `"bank"`, `"credit"`)
    #[serde(rename = "accountType", default)]
    pub kind: String,
    /// Whether the account is shown in planning and trends
    #[serde(rename = "isVisible", default = "default_true")]
    pub is_visible: bool,
    /// Current balance as computed by the server
    #[serde(rename = "currentBalance", default, skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Decimal>,
    /// Caller-assigned value, for manual (unlinked) accounts
    #[serde(rename = "manualValue", default, skip_serializing_if = "Option::is_none")]
    pub manual_value: Option<Decimal>,
    /// Server fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_account() {
        let json = r#"{
            "accountId": 2822158,
            "accountName": "Everyday Checking",
            "accountType": "bank",
            "currentBalance": 1523.07,
            "fiName": "Some Bank"
        }"#;

        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.id, AccountId::new(2822158));
        assert_eq!(account.kind, "bank");
        assert!(account.is_visible);
        assert!(account.manual_value.is_none());
        assert_eq!(
            account.extra.get("fiName").and_then(|v| v.as_str()),
            Some("Some Bank")
        );
    }

    #[test]
    fn test_account_kind_wire_spelling() {
        assert_eq!(
            serde_json::to_value(AccountKind::OtherProperty).unwrap(),
            serde_json::json!("OTHER_PROPERTY")
        );
    }
}
