//! Expense side of the money-movement coordinator.
//!
//! Every entry point runs one DB transaction: the expense row and the wallet
//! balance change commit together or not at all. Budget evaluation runs in
//! the same transaction, so a failure there also rolls back.

use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    Budget, BudgetViolation, EngineError, Expense, ExpenseListFilter, NewExpenseCmd,
    ResultEngine, UpdateExpenseCmd, Wallet, budgets, evaluate,
    expenses::{self, validate_recurrence},
    util::{
        apply_optional_text_patch, category_key, normalize_optional_text,
        normalize_required_text, normalize_tags,
    },
};

use super::{Engine, retry_on_conflict, with_tx};

/// Result of recording, editing or deleting an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpenseOutcome {
    /// The expense as stored, or as it was before deletion.
    pub expense: Expense,
    /// The affected wallet after the change, when the caller can see it.
    pub wallet: Option<Wallet>,
    /// Budgets of the caller that are exceeded after the change.
    pub budget_violations: Vec<BudgetViolation>,
}

fn validate_list_filter(filter: &ExpenseListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::Validation(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    if filter.limit == Some(0) {
        return Err(EngineError::Validation("limit must be > 0".to_string()));
    }
    Ok(())
}

/// Matches the row only if amount and wallet are still the ones we loaded.
fn unchanged_since_load(expense: &Expense) -> Condition {
    let wallet = match expense.wallet_id {
        Some(wallet_id) => expenses::Column::WalletId.eq(wallet_id.to_string()),
        None => expenses::Column::WalletId.is_null(),
    };
    Condition::all()
        .add(expenses::Column::Id.eq(expense.id.to_string()))
        .add(expenses::Column::AmountMinor.eq(expense.amount.cents()))
        .add(wallet)
}

impl Engine {
    /// Return an expense visible to `user_id`.
    pub async fn expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<Expense> {
        with_tx!(self, |db_tx| {
            let (expense, _) = self
                .require_expense_visible(&db_tx, expense_id, user_id)
                .await?;
            Ok(expense)
        })
    }

    /// Lists the user's own expenses plus the ones paid from wallets they
    /// own or share, newest first.
    pub async fn list_expenses(
        &self,
        filter: &ExpenseListFilter,
        user_id: &str,
    ) -> ResultEngine<Vec<Expense>> {
        validate_list_filter(filter)?;
        let limit = filter.limit.unwrap_or(ExpenseListFilter::DEFAULT_LIMIT);

        with_tx!(self, |db_tx| {
            let mut query = expenses::Entity::find()
                .filter(self.visible_expenses_condition(&db_tx, user_id).await?)
                .order_by_desc(expenses::Column::Date)
                .order_by_desc(expenses::Column::Id);
            if let Some(wallet_id) = filter.wallet_id {
                query = query.filter(expenses::Column::WalletId.eq(wallet_id.to_string()));
            }
            if let Some(from) = filter.from {
                query = query.filter(expenses::Column::Date.gte(from));
            }
            if let Some(to) = filter.to {
                query = query.filter(expenses::Column::Date.lte(to));
            }

            // Category keys are computed in Rust, so pagination follows the
            // category filter when one is given.
            let models = match filter.category.as_deref() {
                Some(category) => {
                    let key = category_key(category);
                    query
                        .all(&db_tx)
                        .await?
                        .into_iter()
                        .filter(|model| category_key(&model.category) == key)
                        .skip(filter.offset as usize)
                        .take(limit as usize)
                        .collect::<Vec<_>>()
                }
                None => {
                    query
                        .offset(filter.offset)
                        .limit(limit)
                        .all(&db_tx)
                        .await?
                }
            };

            models.into_iter().map(Expense::try_from).collect()
        })
    }

    /// Records an expense and debits its wallet by the same amount.
    ///
    /// Fails with `InsufficientFunds` (nothing stored) when the wallet cannot
    /// cover the amount.
    pub async fn record_expense(&self, cmd: NewExpenseCmd) -> ResultEngine<ExpenseOutcome> {
        retry_on_conflict!("record_expense", self.record_expense_once(&cmd).await)
    }

    async fn record_expense_once(&self, cmd: &NewExpenseCmd) -> ResultEngine<ExpenseOutcome> {
        let amount = cmd.amount.require_positive("amount")?;
        let category = normalize_required_text(&cmd.category, "category")?;
        validate_recurrence(cmd.is_recurring, cmd.recurring_type)?;
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4(),
            user_id: cmd.user_id.clone(),
            amount,
            category,
            description: normalize_optional_text(cmd.description.as_deref()),
            date: cmd.date,
            wallet_id: cmd.wallet_id,
            tags: normalize_tags(&cmd.tags),
            is_recurring: cmd.is_recurring,
            recurring_type: cmd.recurring_type,
            created_at: now,
            updated_at: now,
        };

        with_tx!(self, |db_tx| {
            if let Some(wallet_id) = expense.wallet_id {
                self.require_wallet_access(&db_tx, wallet_id, &expense.user_id)
                    .await?;
            }

            let model: expenses::ActiveModel = (&expense).try_into()?;
            model.insert(&db_tx).await?;

            if let Some(wallet_id) = expense.wallet_id {
                self.debit_balance(&db_tx, wallet_id, amount, now).await?;
            }

            let wallet = self
                .outcome_wallet(&db_tx, expense.wallet_id, &expense.user_id)
                .await?;
            let budget_violations = self.violations_for(&db_tx, &expense.user_id).await?;
            tracing::info!(
                expense = %expense.id,
                user = %expense.user_id,
                amount = %expense.amount,
                "expense recorded"
            );
            Ok(ExpenseOutcome {
                expense: expense.clone(),
                wallet,
                budget_violations,
            })
        })
    }

    /// Edits an expense. Only its creator may do so.
    ///
    /// Wallet balances follow the edit:
    /// - same wallet: the difference between new and old amount is debited
    ///   (or credited back when the amount shrinks);
    /// - moved to another wallet: the old wallet gets the old amount back and
    ///   the new wallet is debited the new amount;
    /// - previously unattributed: the new wallet is debited the new amount.
    pub async fn update_expense(&self, cmd: UpdateExpenseCmd) -> ResultEngine<ExpenseOutcome> {
        retry_on_conflict!("update_expense", self.update_expense_once(&cmd).await)
    }

    async fn update_expense_once(&self, cmd: &UpdateExpenseCmd) -> ResultEngine<ExpenseOutcome> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let (old, _) = self
                .require_expense_visible(&db_tx, cmd.expense_id, &cmd.user_id)
                .await?;
            if old.user_id != cmd.user_id {
                return Err(EngineError::Forbidden(
                    "only the creator can edit an expense".to_string(),
                ));
            }

            let mut updated = old.clone();
            if let Some(amount) = cmd.amount {
                updated.amount = amount.require_positive("amount")?;
            }
            if let Some(category) = cmd.category.as_deref() {
                updated.category = normalize_required_text(category, "category")?;
            }
            if let Some(date) = cmd.date {
                updated.date = date;
            }
            updated.description =
                apply_optional_text_patch(updated.description.take(), cmd.description.as_deref());
            if let Some(tags) = &cmd.tags {
                updated.tags = normalize_tags(tags);
            }
            updated.is_recurring = cmd.is_recurring.unwrap_or(old.is_recurring);
            updated.recurring_type = match (cmd.is_recurring, cmd.recurring_type) {
                (_, Some(recurring_type)) => Some(recurring_type),
                (Some(false), None) => None,
                (_, None) => old.recurring_type,
            };
            validate_recurrence(updated.is_recurring, updated.recurring_type)?;

            if let Some(wallet_id) = cmd.wallet_id
                && old.wallet_id != Some(wallet_id)
            {
                self.require_wallet_access(&db_tx, wallet_id, &cmd.user_id)
                    .await?;
                updated.wallet_id = Some(wallet_id);
            }
            updated.updated_at = now;

            let model: expenses::ActiveModel = (&updated).try_into()?;
            let result = expenses::Entity::update_many()
                .set(model)
                .filter(unchanged_since_load(&old))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::Conflict(format!(
                    "expense {} changed concurrently",
                    old.id
                )));
            }

            match (old.wallet_id, updated.wallet_id) {
                (Some(before), Some(after)) if before == after => {
                    self.apply_wallet_delta(&db_tx, after, updated.amount - old.amount, now)
                        .await?;
                }
                (before, Some(after)) => {
                    if let Some(before) = before {
                        self.credit_balance(&db_tx, before, old.amount, now)
                            .await?;
                    }
                    self.debit_balance(&db_tx, after, updated.amount, now)
                        .await?;
                }
                (_, None) => {}
            }

            let wallet = self
                .outcome_wallet(&db_tx, updated.wallet_id, &cmd.user_id)
                .await?;
            let budget_violations = self.violations_for(&db_tx, &cmd.user_id).await?;
            Ok(ExpenseOutcome {
                expense: updated,
                wallet,
                budget_violations,
            })
        })
    }

    /// Deletes an expense and credits its wallet back.
    ///
    /// Allowed for the creator and for the owner of the wallet it was paid
    /// from. The returned outcome carries the deleted expense.
    pub async fn delete_expense(
        &self,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<ExpenseOutcome> {
        retry_on_conflict!(
            "delete_expense",
            self.delete_expense_once(expense_id, user_id).await
        )
    }

    async fn delete_expense_once(
        &self,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<ExpenseOutcome> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let (expense, wallet) = self
                .require_expense_visible(&db_tx, expense_id, user_id)
                .await?;
            let allowed = expense.user_id == user_id
                || wallet.as_ref().is_some_and(|wallet| wallet.is_owner(user_id));
            if !allowed {
                return Err(EngineError::Forbidden(
                    "only the creator or the wallet owner can delete an expense".to_string(),
                ));
            }

            let result = expenses::Entity::delete_many()
                .filter(unchanged_since_load(&expense))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::Conflict(format!(
                    "expense {} changed concurrently",
                    expense.id
                )));
            }

            if let Some(wallet_id) = expense.wallet_id {
                self.credit_balance(&db_tx, wallet_id, expense.amount, now)
                    .await?;
            }

            let wallet = self
                .outcome_wallet(&db_tx, expense.wallet_id, user_id)
                .await?;
            let budget_violations = self.violations_for(&db_tx, user_id).await?;
            tracing::info!(expense = %expense.id, user = %user_id, "expense deleted");
            Ok(ExpenseOutcome {
                expense,
                wallet,
                budget_violations,
            })
        })
    }

    /// Wallet snapshot for an outcome, hidden when the caller has no access.
    async fn outcome_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Option<Uuid>,
        user_id: &str,
    ) -> ResultEngine<Option<Wallet>> {
        let Some(wallet_id) = wallet_id else {
            return Ok(None);
        };
        Ok(self
            .load_wallet(db, wallet_id)
            .await?
            .filter(|wallet| wallet.is_accessible_by(user_id)))
    }

    /// Evaluates every budget of `user_id` against their expenses.
    pub(super) async fn violations_for(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<BudgetViolation>> {
        let budgets = self.user_budgets(db, user_id).await?;
        if budgets.is_empty() {
            return Ok(Vec::new());
        }
        let expenses = self.user_expenses(db, user_id).await?;
        Ok(evaluate(user_id, &budgets, &expenses))
    }

    pub(super) async fn user_budgets(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(budgets::Column::StartDate)
            .order_by_asc(budgets::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(Budget::try_from)
            .collect()
    }

    pub(super) async fn user_expenses(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<Expense>> {
        expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(Expense::try_from)
            .collect()
    }
}
