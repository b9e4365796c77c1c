//! Savings goals and the wallet → goal transfer.

use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, FundGoalCmd, Goal, NewGoalCmd, ResultEngine, UpdateGoalCmd, Wallet, goals,
    util::normalize_optional_text,
};

use super::{Engine, retry_on_conflict, with_tx};

/// Both sides of a goal funding, as committed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GoalFunded {
    pub goal: Goal,
    pub wallet: Wallet,
}

impl Engine {
    pub async fn new_goal(&self, cmd: NewGoalCmd) -> ResultEngine<Goal> {
        let mut goal = Goal::new(cmd.user_id, &cmd.name, cmd.target, Utc::now())?;
        goal.description = normalize_optional_text(cmd.description.as_deref());
        goal.category = normalize_optional_text(cmd.category.as_deref());
        goal.deadline = cmd.deadline;

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &goal.user_id).await?;
            let model: goals::ActiveModel = (&goal).into();
            model.insert(&db_tx).await?;
            Ok(goal)
        })
    }

    pub async fn goal(&self, goal_id: Uuid, user_id: &str) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            self.require_goal_owner(&db_tx, goal_id, user_id).await
        })
    }

    /// Goals of `user_id`: active ones first, then by deadline.
    pub async fn list_goals(&self, user_id: &str) -> ResultEngine<Vec<Goal>> {
        with_tx!(self, |db_tx| {
            goals::Entity::find()
                .filter(goals::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(goals::Column::IsCompleted)
                .order_by_asc(goals::Column::Deadline)
                .order_by_asc(goals::Column::Name)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Goal::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    /// Edits a goal directly. Never moves money: changing `current` here is
    /// a correction, not a transfer.
    pub async fn update_goal(&self, cmd: UpdateGoalCmd) -> ResultEngine<Goal> {
        with_tx!(self, |db_tx| {
            let mut goal = self
                .require_goal_owner(&db_tx, cmd.goal_id, &cmd.user_id)
                .await?;
            goal.apply_patch(cmd.patch.clone(), Utc::now())?;

            let mut model: goals::ActiveModel = (&goal).into();
            model.user_id = ActiveValue::NotSet;
            model.created_at = ActiveValue::NotSet;
            model.update(&db_tx).await?;
            Ok(goal)
        })
    }

    /// Deletes a goal. Funds already moved into it are not returned to any
    /// wallet.
    pub async fn delete_goal(&self, goal_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_goal_owner(&db_tx, goal_id, user_id).await?;
            goals::Entity::delete_by_id(goal_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Moves `amount` from a wallet into a goal.
    ///
    /// The wallet is debited and the goal credited by exactly `amount`, or
    /// nothing changes. Checks run in this order:
    /// 1. `GoalCompleted` if the goal is already completed;
    /// 2. `InsufficientFunds` if the wallet cannot cover `amount`;
    /// 3. `Overfunding` if `amount` exceeds what the goal still needs.
    ///
    /// The goal completes when its progress reaches the target exactly.
    pub async fn fund_goal(&self, cmd: FundGoalCmd) -> ResultEngine<GoalFunded> {
        retry_on_conflict!("fund_goal", self.fund_goal_once(&cmd).await)
    }

    async fn fund_goal_once(&self, cmd: &FundGoalCmd) -> ResultEngine<GoalFunded> {
        let amount = cmd.amount.require_positive("amount")?;
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let mut goal = self
                .require_goal_owner(&db_tx, cmd.goal_id, &cmd.user_id)
                .await?;
            let wallet = self
                .require_wallet_access(&db_tx, cmd.wallet_id, &cmd.user_id)
                .await?;

            if goal.is_completed {
                return Err(EngineError::GoalCompleted(goal.name));
            }
            wallet.debited(amount)?;
            let observed = goal.current;
            goal.apply_funding(amount, now)?;

            self.debit_balance(&db_tx, wallet.id, amount, now).await?;

            let result = goals::Entity::update_many()
                .col_expr(goals::Column::CurrentMinor, Expr::value(goal.current.cents()))
                .col_expr(goals::Column::IsCompleted, Expr::value(goal.is_completed))
                .col_expr(goals::Column::UpdatedAt, Expr::value(now))
                .filter(goals::Column::Id.eq(goal.id.to_string()))
                .filter(goals::Column::CurrentMinor.eq(observed.cents()))
                .filter(goals::Column::IsCompleted.eq(false))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::Conflict(format!(
                    "goal '{}' changed concurrently",
                    goal.name
                )));
            }

            let wallet = self
                .require_wallet_access(&db_tx, cmd.wallet_id, &cmd.user_id)
                .await?;
            tracing::info!(
                goal = %goal.id,
                wallet = %wallet.id,
                %amount,
                completed = goal.is_completed,
                "goal funded"
            );
            Ok(GoalFunded { goal, wallet })
        })
    }
}
