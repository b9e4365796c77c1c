use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, NewWalletCmd, ResultEngine, Wallet, WalletUpdateCmd, expenses,
    util::{apply_optional_text_patch, normalize_optional_text, normalize_required_text},
    wallet_shares, wallets,
};

use super::{Engine, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    ///
    /// Visible to the owner and to the users it is shared with.
    pub async fn wallet(&self, wallet_id: Uuid, user_id: &str) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await
        })
    }

    /// Every wallet owned by or shared with `user_id`, ordered by name.
    pub async fn list_wallets(&self, user_id: &str) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| self.accessible_wallets(&db_tx, user_id).await)
    }

    /// Add a new wallet.
    ///
    /// Names are unique per owner, compared case-insensitively. Every user in
    /// `shared_with` must exist and differ from the owner.
    pub async fn new_wallet(&self, cmd: NewWalletCmd) -> ResultEngine<Wallet> {
        let name = normalize_required_text(&cmd.name, "wallet name")?;
        let mut wallet = Wallet::new(
            cmd.user_id.clone(),
            name,
            cmd.kind,
            cmd.initial_balance,
            cmd.currency,
            Utc::now(),
        )?;
        wallet.description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, &cmd.user_id).await?;
            self.ensure_wallet_name_free(&db_tx, &cmd.user_id, &wallet.name, None)
                .await?;

            for member in &cmd.shared_with {
                let member = member.trim();
                if member == cmd.user_id {
                    return Err(EngineError::Validation(
                        "a wallet cannot be shared with its owner".to_string(),
                    ));
                }
                self.require_user(&db_tx, member).await?;
                wallet.shared_with.insert(member.to_string());
            }

            let model: wallets::ActiveModel = (&wallet).into();
            model.insert(&db_tx).await?;
            for member in &wallet.shared_with {
                wallet_shares::ActiveModel {
                    wallet_id: ActiveValue::Set(wallet.id.to_string()),
                    user_id: ActiveValue::Set(member.clone()),
                }
                .insert(&db_tx)
                .await?;
            }

            tracing::info!(wallet = %wallet.id, owner = %wallet.owner_id, "wallet created");
            Ok(wallet)
        })
    }

    /// Edits name, description or kind. Owner only.
    pub async fn update_wallet(&self, cmd: WalletUpdateCmd) -> ResultEngine<Wallet> {
        let name = cmd
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "wallet name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let mut wallet = self
                .require_wallet_owner(&db_tx, cmd.wallet_id, &cmd.user_id)
                .await?;

            if let Some(name) = name {
                self.ensure_wallet_name_free(&db_tx, &cmd.user_id, &name, Some(wallet.id))
                    .await?;
                wallet.name = name;
            }
            wallet.description =
                apply_optional_text_patch(wallet.description.take(), cmd.description.as_deref());
            if let Some(kind) = cmd.kind {
                wallet.kind = kind;
            }
            wallet.updated_at = Utc::now();

            wallets::ActiveModel {
                id: ActiveValue::Set(wallet.id.to_string()),
                name: ActiveValue::Set(wallet.name.clone()),
                description: ActiveValue::Set(wallet.description.clone()),
                kind: ActiveValue::Set(wallet.kind.as_str().to_string()),
                updated_at: ActiveValue::Set(wallet.updated_at),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(wallet)
        })
    }

    /// Grants `member` read and spend access. Owner only.
    pub async fn share_wallet(
        &self,
        wallet_id: Uuid,
        member: &str,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        let member = normalize_required_text(member, "username")?;
        with_tx!(self, |db_tx| {
            let mut wallet = self
                .require_wallet_owner(&db_tx, wallet_id, user_id)
                .await?;
            if wallet.is_owner(&member) {
                return Err(EngineError::Validation(
                    "a wallet cannot be shared with its owner".to_string(),
                ));
            }
            self.require_user(&db_tx, &member).await?;
            if wallet.shared_with.contains(&member) {
                return Err(EngineError::ExistingKey(member));
            }

            wallet_shares::ActiveModel {
                wallet_id: ActiveValue::Set(wallet_id.to_string()),
                user_id: ActiveValue::Set(member.clone()),
            }
            .insert(&db_tx)
            .await?;
            wallet.shared_with.insert(member);
            Ok(wallet)
        })
    }

    /// Revokes a share. Expenses the member recorded stay in place.
    pub async fn unshare_wallet(
        &self,
        wallet_id: Uuid,
        member: &str,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let mut wallet = self
                .require_wallet_owner(&db_tx, wallet_id, user_id)
                .await?;
            let result = wallet_shares::Entity::delete_by_id((
                wallet_id.to_string(),
                member.to_string(),
            ))
            .exec(&db_tx)
            .await?;
            if result.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(format!(
                    "wallet share for {member}"
                )));
            }
            wallet.shared_with.remove(member);
            Ok(wallet)
        })
    }

    /// Adds money to a wallet (`add_balance`). Owner or sharer.
    pub async fn credit_wallet(
        &self,
        wallet_id: Uuid,
        amount: MoneyCents,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        amount.require_positive("amount")?;
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await?;
            self.credit_balance(&db_tx, wallet_id, amount, now).await?;
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await
        })
    }

    /// Takes money out of a wallet. Fails with `InsufficientFunds` rather
    /// than letting the balance go negative.
    pub async fn debit_wallet(
        &self,
        wallet_id: Uuid,
        amount: MoneyCents,
        user_id: &str,
    ) -> ResultEngine<Wallet> {
        amount.require_positive("amount")?;
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await?;
            self.debit_balance(&db_tx, wallet_id, amount, now).await?;
            self.require_wallet_access(&db_tx, wallet_id, user_id)
                .await
        })
    }

    /// Deletes a wallet. Owner only.
    ///
    /// Expenses paid from the wallet are kept and become unattributed; their
    /// amounts are not refunded anywhere.
    pub async fn delete_wallet(&self, wallet_id: Uuid, user_id: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_wallet_owner(&db_tx, wallet_id, user_id)
                .await?;

            let detached = expenses::Entity::update_many()
                .col_expr(
                    expenses::Column::WalletId,
                    Expr::value(Option::<String>::None),
                )
                .filter(expenses::Column::WalletId.eq(wallet_id.to_string()))
                .exec(&db_tx)
                .await?;
            wallet_shares::Entity::delete_many()
                .filter(wallet_shares::Column::WalletId.eq(wallet_id.to_string()))
                .exec(&db_tx)
                .await?;
            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(
                wallet = %wallet_id,
                detached_expenses = detached.rows_affected,
                "wallet deleted"
            );
            Ok(())
        })
    }

    async fn ensure_wallet_name_free(
        &self,
        db: &sea_orm::DatabaseTransaction,
        owner_id: &str,
        name: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner_id.to_string()))
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(id) = except {
            query = query.filter(wallets::Column::Id.ne(id.to_string()));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
