//! Guarded balance primitives.
//!
//! Balances are never written back from a value read earlier in the
//! transaction. Each movement is a single `UPDATE ... SET balance_minor =
//! balance_minor ± amount` whose `WHERE` clause carries the guard, so two
//! concurrent debits can never both spend the same funds.

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, wallets};

use super::Engine;

impl Engine {
    /// Subtracts `amount` from the wallet balance unless it would go below
    /// zero.
    pub(super) async fn debit_balance(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        amount: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        amount.require_positive("amount")?;
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::BalanceMinor,
                Expr::col(wallets::Column::BalanceMinor).sub(amount.cents()),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(now))
            .filter(wallets::Column::Id.eq(wallet_id.to_string()))
            .filter(wallets::Column::BalanceMinor.gte(amount.cents()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            let wallet = self
                .load_wallet(db, wallet_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
            // Produces the `InsufficientFunds` error with the current balance.
            wallet.debited(amount)?;
            return Err(EngineError::Conflict(format!(
                "balance of wallet '{}' changed during debit",
                wallet.name
            )));
        }
        tracing::info!(wallet = %wallet_id, %amount, "wallet debited");
        Ok(())
    }

    /// Adds `amount` to the wallet balance.
    pub(super) async fn credit_balance(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        amount: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        amount.require_positive("amount")?;
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::BalanceMinor,
                Expr::col(wallets::Column::BalanceMinor).add(amount.cents()),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(now))
            .filter(wallets::Column::Id.eq(wallet_id.to_string()))
            .filter(wallets::Column::BalanceMinor.lte(i64::MAX - amount.cents()))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            let wallet = self
                .load_wallet(db, wallet_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
            wallet.credited(amount)?;
            return Err(EngineError::Conflict(format!(
                "balance of wallet '{}' changed during credit",
                wallet.name
            )));
        }
        tracing::info!(wallet = %wallet_id, %amount, "wallet credited");
        Ok(())
    }

    /// Applies a signed change: positive debits, negative credits.
    pub(super) async fn apply_wallet_delta(
        &self,
        db: &DatabaseTransaction,
        wallet_id: Uuid,
        delta: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        if delta.is_positive() {
            self.debit_balance(db, wallet_id, delta, now).await
        } else if delta.is_negative() {
            self.credit_balance(db, wallet_id, -delta, now).await
        } else {
            Ok(())
        }
    }
}
