//! Ownership and visibility checks shared by the operations.
//!
//! Entities that are not visible to the caller are reported as
//! `KeyNotFound`, never `Forbidden`, so callers learn nothing about ids
//! they cannot see.
//! `Forbidden` is reserved for visible entities the caller may not change.

use std::collections::BTreeSet;

use sea_orm::{Condition, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Budget, EngineError, Expense, Goal, ResultEngine, Wallet, budgets, expenses, goals, users,
    wallet_shares, wallets,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .map(|_| ())
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {username}")))
    }

    async fn wallet_shared_with(
        &self,
        db: &DatabaseTransaction,
        wallet_id: &str,
    ) -> ResultEngine<BTreeSet<String>> {
        let rows = wallet_shares::Entity::find()
            .filter(wallet_shares::Column::WalletId.eq(wallet_id.to_string()))
            .all(db)
            .await?;
        Ok(rows.into_iter().map(|row| row.user_id).collect())
    }

    /// Loads a wallet with its share list, regardless of the caller.
    pub(super) async fn load_wallet(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<Option<Wallet>> {
        let Some(model) = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db)
            .await?
        else {
            return Ok(None);
        };
        let shared_with = self.wallet_shared_with(db, &model.id).await?;
        Wallet::try_from((model, shared_with)).map(Some)
    }

    /// Owner or sharer of the wallet.
    pub(super) async fn require_wallet_access(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        match self.load_wallet(db, wallet_id).await? {
            Some(wallet) if wallet.is_accessible_by(user_id) => Ok(wallet),
            _ => Err(EngineError::KeyNotFound("wallet not exists".to_string())),
        }
    }

    /// Owner only. A sharer gets `Forbidden`.
    pub(super) async fn require_wallet_owner(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        let wallet = self.require_wallet_access(db, wallet_id, user_id).await?;
        if !wallet.is_owner(user_id) {
            return Err(EngineError::Forbidden(format!(
                "only the owner can modify wallet '{}'",
                wallet.name
            )));
        }
        Ok(wallet)
    }

    /// Ids of the wallets owned by or shared with `user_id`.
    pub(super) async fn accessible_wallet_ids(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<String>> {
        let mut ids: BTreeSet<String> = wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(user_id.to_string()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();
        ids.extend(
            wallet_shares::Entity::find()
                .filter(wallet_shares::Column::UserId.eq(user_id.to_string()))
                .all(db)
                .await?
                .into_iter()
                .map(|row| row.wallet_id),
        );
        Ok(ids.into_iter().collect())
    }

    /// Loads every wallet visible to `user_id`, ordered by name.
    pub(super) async fn accessible_wallets(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Vec<Wallet>> {
        let ids = self.accessible_wallet_ids(db, user_id).await?;
        let models = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in(ids))
            .order_by_asc(wallets::Column::Name)
            .order_by_asc(wallets::Column::Id)
            .all(db)
            .await?;
        let mut out = Vec::with_capacity(models.len());
        for model in models {
            let shared_with = self.wallet_shared_with(db, &model.id).await?;
            out.push(Wallet::try_from((model, shared_with))?);
        }
        Ok(out)
    }

    /// An expense is visible to its creator and to everyone with access to
    /// its wallet.
    pub(super) async fn require_expense_visible(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(Expense, Option<Wallet>)> {
        let not_found = || EngineError::KeyNotFound("expense not exists".to_string());
        let model = expenses::Entity::find_by_id(expense_id.to_string())
            .one(db)
            .await?
            .ok_or_else(not_found)?;
        let expense = Expense::try_from(model)?;
        let wallet = match expense.wallet_id {
            Some(wallet_id) => self.load_wallet(db, wallet_id).await?,
            None => None,
        };

        let visible = expense.user_id == user_id
            || wallet
                .as_ref()
                .is_some_and(|wallet| wallet.is_accessible_by(user_id));
        if !visible {
            return Err(not_found());
        }
        Ok((expense, wallet))
    }

    /// Condition matching the expenses visible to `user_id`.
    pub(super) async fn visible_expenses_condition(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<Condition> {
        let wallet_ids = self.accessible_wallet_ids(db, user_id).await?;
        Ok(Condition::any()
            .add(expenses::Column::UserId.eq(user_id.to_string()))
            .add(expenses::Column::WalletId.is_in(wallet_ids)))
    }

    pub(super) async fn require_budget_owner(
        &self,
        db: &DatabaseTransaction,
        budget_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Budget> {
        let model = budgets::Entity::find_by_id(budget_id.to_string())
            .filter(budgets::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("budget not exists".to_string()))?;
        Budget::try_from(model)
    }

    pub(super) async fn require_goal_owner(
        &self,
        db: &DatabaseTransaction,
        goal_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Goal> {
        let model = goals::Entity::find_by_id(goal_id.to_string())
            .filter(goals::Column::UserId.eq(user_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("goal not exists".to_string()))?;
        Goal::try_from(model)
    }
}
