//! Conversions between engine values and wire types.

use api_types::{
    Currency as ApiCurrency,
    budget::{BudgetStatusView, BudgetView, BudgetViolationView},
    expense::{ExpenseView, RecurringType as ApiRecurring},
    goal::GoalView,
    wallet::{WalletKind as ApiKind, WalletView},
};
use engine::{
    Budget, BudgetStatus, BudgetViolation, Currency, Expense, Goal, RecurringType, Wallet,
    WalletKind,
};

pub fn currency_in(currency: ApiCurrency) -> Currency {
    match currency {
        ApiCurrency::Eur => Currency::Eur,
        ApiCurrency::Usd => Currency::Usd,
        ApiCurrency::Gbp => Currency::Gbp,
        ApiCurrency::Inr => Currency::Inr,
    }
}

fn currency_out(currency: Currency) -> ApiCurrency {
    match currency {
        Currency::Eur => ApiCurrency::Eur,
        Currency::Usd => ApiCurrency::Usd,
        Currency::Gbp => ApiCurrency::Gbp,
        Currency::Inr => ApiCurrency::Inr,
    }
}

pub fn kind_in(kind: ApiKind) -> WalletKind {
    match kind {
        ApiKind::Personal => WalletKind::Personal,
        ApiKind::Shared => WalletKind::Shared,
        ApiKind::Family => WalletKind::Family,
        ApiKind::Business => WalletKind::Business,
    }
}

fn kind_out(kind: WalletKind) -> ApiKind {
    match kind {
        WalletKind::Personal => ApiKind::Personal,
        WalletKind::Shared => ApiKind::Shared,
        WalletKind::Family => ApiKind::Family,
        WalletKind::Business => ApiKind::Business,
    }
}

pub fn recurring_in(recurring: ApiRecurring) -> RecurringType {
    match recurring {
        ApiRecurring::Daily => RecurringType::Daily,
        ApiRecurring::Weekly => RecurringType::Weekly,
        ApiRecurring::Monthly => RecurringType::Monthly,
        ApiRecurring::Yearly => RecurringType::Yearly,
    }
}

fn recurring_out(recurring: RecurringType) -> ApiRecurring {
    match recurring {
        RecurringType::Daily => ApiRecurring::Daily,
        RecurringType::Weekly => ApiRecurring::Weekly,
        RecurringType::Monthly => ApiRecurring::Monthly,
        RecurringType::Yearly => ApiRecurring::Yearly,
    }
}

pub fn wallet(wallet: Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        owner_id: wallet.owner_id,
        shared_with: wallet.shared_with.into_iter().collect(),
        name: wallet.name,
        kind: kind_out(wallet.kind),
        balance_minor: wallet.balance.cents(),
        currency: currency_out(wallet.currency),
        description: wallet.description,
        created_at: wallet.created_at,
        updated_at: wallet.updated_at,
    }
}

pub fn expense(expense: Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        user_id: expense.user_id,
        amount_minor: expense.amount.cents(),
        category: expense.category,
        description: expense.description,
        date: expense.date,
        wallet_id: expense.wallet_id,
        tags: expense.tags.into_iter().collect(),
        is_recurring: expense.is_recurring,
        recurring_type: expense.recurring_type.map(recurring_out),
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

pub fn budget(budget: Budget) -> BudgetView {
    BudgetView {
        id: budget.id,
        user_id: budget.user_id,
        category: budget.category,
        amount_minor: budget.amount.cents(),
        start_date: budget.start_date,
        end_date: budget.end_date,
        created_at: budget.created_at,
        updated_at: budget.updated_at,
    }
}

pub fn budget_status(status: BudgetStatus) -> BudgetStatusView {
    BudgetStatusView {
        budget: budget(status.budget),
        consumed_minor: status.consumed.cents(),
        remaining_minor: status.remaining.cents(),
        exceeded: status.exceeded,
    }
}

pub fn violation(violation: BudgetViolation) -> BudgetViolationView {
    BudgetViolationView {
        budget_id: violation.budget_id,
        category: violation.category,
        cap_minor: violation.cap.cents(),
        consumed_minor: violation.consumed.cents(),
        overage_minor: violation.overage.cents(),
    }
}

pub fn goal(goal: Goal) -> GoalView {
    GoalView {
        id: goal.id,
        user_id: goal.user_id,
        name: goal.name,
        description: goal.description,
        target_minor: goal.target.cents(),
        current_minor: goal.current.cents(),
        deadline: goal.deadline,
        category: goal.category,
        is_completed: goal.is_completed,
        created_at: goal.created_at,
        updated_at: goal.updated_at,
    }
}
