//! JSON wire types of the REST API.
//!
//! Field names are camelCase on the wire. Money is always an integer amount
//! of minor units (`...Minor` fields), never a float.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Usd,
    Gbp,
    Inr,
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Success {
    pub success: bool,
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WalletKind {
        #[default]
        Personal,
        Shared,
        Family,
        Business,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletNew {
        pub name: String,
        pub kind: Option<WalletKind>,
        /// Opening balance, defaults to 0.
        pub initial_balance_minor: Option<i64>,
        pub currency: Option<Currency>,
        pub description: Option<String>,
        #[serde(default)]
        pub shared_with: Vec<String>,
    }

    /// Metadata edit. The balance only moves through money operations.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletUpdate {
        pub name: Option<String>,
        /// Empty string clears the description.
        pub description: Option<String>,
        pub kind: Option<WalletKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AddBalance {
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareRequest {
        pub username: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletView {
        pub id: Uuid,
        pub owner_id: String,
        pub shared_with: Vec<String>,
        pub name: String,
        pub kind: WalletKind,
        pub balance_minor: i64,
        pub currency: Currency,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

pub mod expense {
    use super::*;
    use crate::{budget::BudgetViolationView, wallet::WalletView};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum RecurringType {
        Daily,
        Weekly,
        Monthly,
        Yearly,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseNew {
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        pub date: DateTime<Utc>,
        pub wallet_id: Option<Uuid>,
        #[serde(default)]
        pub tags: Vec<String>,
        #[serde(default)]
        pub is_recurring: bool,
        pub recurring_type: Option<RecurringType>,
    }

    /// Partial edit: absent fields keep their value.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseUpdate {
        pub amount_minor: Option<i64>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub date: Option<DateTime<Utc>>,
        pub wallet_id: Option<Uuid>,
        pub tags: Option<Vec<String>>,
        pub is_recurring: Option<bool>,
        pub recurring_type: Option<RecurringType>,
    }

    /// Query string of `GET /expenses`. Date bounds are inclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseListQuery {
        pub wallet_id: Option<Uuid>,
        pub category: Option<String>,
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub offset: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseView {
        pub id: Uuid,
        pub user_id: String,
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        pub date: DateTime<Utc>,
        pub wallet_id: Option<Uuid>,
        pub tags: Vec<String>,
        pub is_recurring: bool,
        pub recurring_type: Option<RecurringType>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseOutcome {
        pub expense: ExpenseView,
        pub wallet: Option<WalletView>,
        pub budget_violations: Vec<BudgetViolationView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExpenseDeleted {
        pub success: bool,
        pub wallet: Option<WalletView>,
        pub budget_violations: Vec<BudgetViolationView>,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetNew {
        pub category: String,
        pub amount_minor: i64,
        pub start_date: DateTime<Utc>,
        /// Exclusive.
        pub end_date: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetUpdate {
        pub category: Option<String>,
        pub amount_minor: Option<i64>,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetView {
        pub id: Uuid,
        pub user_id: String,
        pub category: String,
        pub amount_minor: i64,
        pub start_date: DateTime<Utc>,
        pub end_date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetStatusView {
        pub budget: BudgetView,
        pub consumed_minor: i64,
        /// Negative once the budget is exceeded.
        pub remaining_minor: i64,
        pub exceeded: bool,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct BudgetViolationView {
        pub budget_id: Uuid,
        pub category: String,
        pub cap_minor: i64,
        pub consumed_minor: i64,
        pub overage_minor: i64,
    }
}

pub mod goal {
    use super::*;
    use crate::wallet::WalletView;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalNew {
        pub name: String,
        pub target_minor: i64,
        pub description: Option<String>,
        pub deadline: Option<DateTime<Utc>>,
        pub category: Option<String>,
    }

    /// Direct edit. Never moves money between wallets and goals.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalUpdate {
        pub name: Option<String>,
        pub description: Option<String>,
        pub target_minor: Option<i64>,
        pub current_minor: Option<i64>,
        pub deadline: Option<DateTime<Utc>>,
        pub category: Option<String>,
        pub is_completed: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct FundGoal {
        pub amount_minor: i64,
        pub wallet_id: Uuid,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalView {
        pub id: Uuid,
        pub user_id: String,
        pub name: String,
        pub description: Option<String>,
        pub target_minor: i64,
        pub current_minor: i64,
        pub deadline: Option<DateTime<Utc>>,
        pub category: Option<String>,
        pub is_completed: bool,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GoalFunded {
        pub goal: GoalView,
        pub wallet: WalletView,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_new_uses_camel_case_and_defaults() {
        let raw = r#"{
            "amountMinor": 3000,
            "category": "food",
            "date": "2024-03-01T12:00:00Z",
            "walletId": "7f0b5b8e-8c1b-4d4e-9d0a-1f7f1d2f3a4b"
        }"#;
        let parsed: expense::ExpenseNew = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.amount_minor, 3000);
        assert!(parsed.wallet_id.is_some());
        assert!(parsed.tags.is_empty());
        assert!(!parsed.is_recurring);
    }

    #[test]
    fn fund_goal_requires_wallet() {
        let raw = r#"{"amountMinor": 100}"#;
        assert!(serde_json::from_str::<goal::FundGoal>(raw).is_err());
    }

    #[test]
    fn enums_use_lowercase_tags() {
        assert_eq!(
            serde_json::to_string(&wallet::WalletKind::Family).unwrap(),
            r#""family""#
        );
        assert_eq!(
            serde_json::to_string(&expense::RecurringType::Monthly).unwrap(),
            r#""monthly""#
        );
        assert_eq!(serde_json::to_string(&Currency::Gbp).unwrap(), r#""GBP""#);
    }
}
