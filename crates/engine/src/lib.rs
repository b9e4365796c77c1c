//! Money-movement engine for a personal finance tracker.
//!
//! The engine owns wallets, expenses, budgets and savings goals, persisted
//! with sea-orm. Every operation that moves money (recording, editing or
//! deleting an expense, funding a goal, adding balance) runs in a single
//! database transaction so that wallet balances stay non-negative and
//! conserved.

pub use budgets::{Budget, BudgetStatus, BudgetViolation, compute_consumption, evaluate};
pub use commands::{
    ExpenseListFilter, FundGoalCmd, NewBudgetCmd, NewExpenseCmd, NewGoalCmd, NewWalletCmd,
    UpdateBudgetCmd, UpdateExpenseCmd, UpdateGoalCmd, WalletUpdateCmd,
};
pub use currency::Currency;
pub use error::EngineError;
pub use expenses::{Expense, RecurringType};
pub use goals::{Goal, GoalPatch};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, ExpenseOutcome, GoalFunded};
pub use wallets::{Wallet, WalletKind};

pub mod budgets;
mod commands;
mod currency;
mod error;
pub mod expenses;
pub mod goals;
mod money;
mod ops;
pub mod users;
mod util;
pub mod wallet_shares;
pub mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
