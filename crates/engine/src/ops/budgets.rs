use chrono::Utc;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, BudgetStatus, BudgetViolation, NewBudgetCmd, ResultEngine, UpdateBudgetCmd, budgets,
    budgets::validate_budget_fields, util::normalize_required_text,
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn new_budget(&self, cmd: NewBudgetCmd) -> ResultEngine<Budget> {
        let category = normalize_required_text(&cmd.category, "category")?;
        validate_budget_fields(cmd.amount, cmd.start_date, cmd.end_date)?;
        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4(),
            user_id: cmd.user_id,
            category,
            amount: cmd.amount,
            start_date: cmd.start_date,
            end_date: cmd.end_date,
            created_at: now,
            updated_at: now,
        };

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &budget.user_id).await?;
            let model: budgets::ActiveModel = (&budget).into();
            model.insert(&db_tx).await?;
            Ok(budget)
        })
    }

    pub async fn budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            self.require_budget_owner(&db_tx, budget_id, user_id)
                .await
        })
    }

    /// Budgets of `user_id`, ordered by start date.
    pub async fn list_budgets(&self, user_id: &str) -> ResultEngine<Vec<Budget>> {
        with_tx!(self, |db_tx| self.user_budgets(&db_tx, user_id).await)
    }

    /// Applies the patch, then validates the resulting budget as a whole.
    pub async fn update_budget(&self, cmd: UpdateBudgetCmd) -> ResultEngine<Budget> {
        with_tx!(self, |db_tx| {
            let mut budget = self
                .require_budget_owner(&db_tx, cmd.budget_id, &cmd.user_id)
                .await?;
            if let Some(category) = cmd.category.as_deref() {
                budget.category = normalize_required_text(category, "category")?;
            }
            budget.amount = cmd.amount.unwrap_or(budget.amount);
            budget.start_date = cmd.start_date.unwrap_or(budget.start_date);
            budget.end_date = cmd.end_date.unwrap_or(budget.end_date);
            validate_budget_fields(budget.amount, budget.start_date, budget.end_date)?;
            budget.updated_at = Utc::now();

            let mut model: budgets::ActiveModel = (&budget).into();
            model.created_at = ActiveValue::NotSet;
            model.user_id = ActiveValue::NotSet;
            model.update(&db_tx).await?;
            Ok(budget)
        })
    }

    /// Deleting a budget never touches expenses or wallets.
    pub async fn delete_budget(&self, budget_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_budget_owner(&db_tx, budget_id, user_id)
                .await?;
            budgets::Entity::delete_by_id(budget_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Consumption and remaining amount of every budget of `user_id`.
    pub async fn budget_statuses(&self, user_id: &str) -> ResultEngine<Vec<BudgetStatus>> {
        with_tx!(self, |db_tx| {
            let budgets = self.user_budgets(&db_tx, user_id).await?;
            let expenses = self.user_expenses(&db_tx, user_id).await?;
            Ok(budgets::statuses(user_id, &budgets, &expenses))
        })
    }

    /// Budgets of `user_id` currently exceeded.
    pub async fn evaluate_budgets(&self, user_id: &str) -> ResultEngine<Vec<BudgetViolation>> {
        with_tx!(self, |db_tx| self.violations_for(&db_tx, user_id).await)
    }
}
