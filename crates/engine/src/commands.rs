//! Command structs for engine operations.
//!
//! These types group parameters for write operations (wallets, expenses,
//! budgets, goals), keeping call sites readable and avoiding long argument
//! lists. Update commands carry `Option` fields: `None` keeps the stored value.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Currency, GoalPatch, MoneyCents, RecurringType, WalletKind};

/// Create a wallet.
#[derive(Clone, Debug)]
pub struct NewWalletCmd {
    pub user_id: String,
    pub name: String,
    pub kind: WalletKind,
    pub initial_balance: MoneyCents,
    pub currency: Currency,
    pub description: Option<String>,
    pub shared_with: Vec<String>,
}

impl NewWalletCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            kind: WalletKind::default(),
            initial_balance: MoneyCents::ZERO,
            currency: Currency::default(),
            description: None,
            shared_with: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: WalletKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, balance: MoneyCents) -> Self {
        self.initial_balance = balance;
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn shared_with<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shared_with = users.into_iter().map(Into::into).collect();
        self
    }
}

/// Edit wallet metadata. The balance is never edited directly.
#[derive(Clone, Debug)]
pub struct WalletUpdateCmd {
    pub wallet_id: Uuid,
    pub user_id: String,
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub kind: Option<WalletKind>,
}

impl WalletUpdateCmd {
    #[must_use]
    pub fn new(wallet_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            wallet_id,
            user_id: user_id.into(),
            name: None,
            description: None,
            kind: None,
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: WalletKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Record an expense, optionally paid from a wallet.
#[derive(Clone, Debug)]
pub struct NewExpenseCmd {
    pub user_id: String,
    pub amount: MoneyCents,
    pub category: String,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub wallet_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub is_recurring: bool,
    pub recurring_type: Option<RecurringType>,
}

impl NewExpenseCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        amount: MoneyCents,
        category: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount,
            category: category.into(),
            date,
            description: None,
            wallet_id: None,
            tags: Vec::new(),
            is_recurring: false,
            recurring_type: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the expense as recurring with the given cadence.
    #[must_use]
    pub fn recurring(mut self, recurring_type: RecurringType) -> Self {
        self.is_recurring = true;
        self.recurring_type = Some(recurring_type);
        self
    }
}

/// Edit an expense. Wallet balances follow the change.
///
/// An expense can be moved to another wallet but not detached from one.
#[derive(Clone, Debug)]
pub struct UpdateExpenseCmd {
    pub expense_id: Uuid,
    pub user_id: String,
    pub amount: Option<MoneyCents>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub wallet_id: Option<Uuid>,
    pub tags: Option<Vec<String>>,
    pub is_recurring: Option<bool>,
    pub recurring_type: Option<RecurringType>,
}

impl UpdateExpenseCmd {
    #[must_use]
    pub fn new(expense_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            expense_id,
            user_id: user_id.into(),
            amount: None,
            category: None,
            date: None,
            description: None,
            wallet_id: None,
            tags: None,
            is_recurring: None,
            recurring_type: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn recurring(mut self, recurring_type: RecurringType) -> Self {
        self.is_recurring = Some(true);
        self.recurring_type = Some(recurring_type);
        self
    }

    #[must_use]
    pub fn not_recurring(mut self) -> Self {
        self.is_recurring = Some(false);
        self.recurring_type = None;
        self
    }
}

/// Filters for listing expenses.
///
/// Date bounds are inclusive on both sides.
#[derive(Clone, Debug, Default)]
pub struct ExpenseListFilter {
    pub wallet_id: Option<Uuid>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub offset: u64,
    /// Defaults to [`ExpenseListFilter::DEFAULT_LIMIT`].
    pub limit: Option<u64>,
}

impl ExpenseListFilter {
    pub const DEFAULT_LIMIT: u64 = 100;

    #[must_use]
    pub fn wallet_id(mut self, wallet_id: Uuid) -> Self {
        self.wallet_id = Some(wallet_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn date_from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    #[must_use]
    pub fn date_to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Create a budget. `end_date` is exclusive.
#[derive(Clone, Debug)]
pub struct NewBudgetCmd {
    pub user_id: String,
    pub category: String,
    pub amount: MoneyCents,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl NewBudgetCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        category: impl Into<String>,
        amount: MoneyCents,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            category: category.into(),
            amount,
            start_date,
            end_date,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateBudgetCmd {
    pub budget_id: Uuid,
    pub user_id: String,
    pub category: Option<String>,
    pub amount: Option<MoneyCents>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl UpdateBudgetCmd {
    #[must_use]
    pub fn new(budget_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            budget_id,
            user_id: user_id.into(),
            category: None,
            amount: None,
            start_date: None,
            end_date: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// Create a savings goal. Progress always starts at zero.
#[derive(Clone, Debug)]
pub struct NewGoalCmd {
    pub user_id: String,
    pub name: String,
    pub target: MoneyCents,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
}

impl NewGoalCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, target: MoneyCents) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            target,
            description: None,
            deadline: None,
            category: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Direct edit of a goal. Never moves money.
#[derive(Clone, Debug)]
pub struct UpdateGoalCmd {
    pub goal_id: Uuid,
    pub user_id: String,
    pub patch: GoalPatch,
}

impl UpdateGoalCmd {
    #[must_use]
    pub fn new(goal_id: Uuid, user_id: impl Into<String>) -> Self {
        Self {
            goal_id,
            user_id: user_id.into(),
            patch: GoalPatch::default(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.patch.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.patch.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn target(mut self, target: MoneyCents) -> Self {
        self.patch.target = Some(target);
        self
    }

    #[must_use]
    pub fn current(mut self, current: MoneyCents) -> Self {
        self.patch.current = Some(current);
        self
    }

    #[must_use]
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.patch.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.patch.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn completed(mut self, is_completed: bool) -> Self {
        self.patch.is_completed = Some(is_completed);
        self
    }
}

/// Move `amount` from a wallet into a goal.
#[derive(Clone, Debug)]
pub struct FundGoalCmd {
    pub goal_id: Uuid,
    pub wallet_id: Uuid,
    pub amount: MoneyCents,
    pub user_id: String,
}

impl FundGoalCmd {
    #[must_use]
    pub fn new(
        goal_id: Uuid,
        wallet_id: Uuid,
        amount: MoneyCents,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            goal_id,
            wallet_id,
            amount,
            user_id: user_id.into(),
        }
    }
}
