//! The module contains `Wallet` struct and its implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Currency, EngineError, MoneyCents, ResultEngine,
    util::{model_currency, parse_uuid},
};

/// What a wallet is used for. Purely descriptive: sharing is governed by
/// `shared_with`, not by the kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletKind {
    #[default]
    Personal,
    Shared,
    Family,
    Business,
}

impl WalletKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Shared => "shared",
            Self::Family => "family",
            Self::Business => "business",
        }
    }
}

impl TryFrom<&str> for WalletKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "personal" => Ok(Self::Personal),
            "shared" => Ok(Self::Shared),
            "family" => Ok(Self::Family),
            "business" => Ok(Self::Business),
            other => Err(EngineError::Validation(format!(
                "invalid wallet kind: {other}"
            ))),
        }
    }
}

/// A wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. Its balance never goes below zero and is only
/// moved by the engine's money-movement operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: String,
    /// Users allowed to read the wallet and spend from it.
    pub shared_with: BTreeSet<String>,
    pub name: String,
    pub kind: WalletKind,
    pub balance: MoneyCents,
    pub currency: Currency,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(
        owner_id: String,
        name: String,
        kind: WalletKind,
        balance: MoneyCents,
        currency: Currency,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        balance.require_non_negative("initial balance")?;
        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            shared_with: BTreeSet::new(),
            name,
            kind,
            balance,
            currency,
            description: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    /// Owner or one of the users the wallet is shared with.
    pub fn is_accessible_by(&self, user_id: &str) -> bool {
        self.is_owner(user_id) || self.shared_with.contains(user_id)
    }

    /// Balance after crediting `amount`, without touching `self`.
    pub fn credited(&self, amount: MoneyCents) -> ResultEngine<MoneyCents> {
        amount.require_positive("amount")?;
        self.balance
            .checked_add(amount)
            .ok_or_else(|| EngineError::Validation("wallet balance overflow".to_string()))
    }

    /// Balance after debiting `amount`, without touching `self`.
    pub fn debited(&self, amount: MoneyCents) -> ResultEngine<MoneyCents> {
        amount.require_positive("amount")?;
        match self.balance.checked_sub(amount) {
            Some(balance) if !balance.is_negative() => Ok(balance),
            _ => Err(EngineError::InsufficientFunds(format!(
                "wallet '{}' has {}, needs {}",
                self.name, self.balance, amount
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub kind: String,
    pub balance_minor: i64,
    pub currency: String,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallet_shares::Entity")]
    Shares,
    #[sea_orm(has_many = "super::expenses::Entity")]
    Expenses,
}

impl Related<super::wallet_shares::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shares.def()
    }
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            balance_minor: ActiveValue::Set(value.balance.cents()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            description: ActiveValue::Set(value.description.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<(Model, BTreeSet<String>)> for Wallet {
    type Error = EngineError;

    fn try_from((model, shared_with): (Model, BTreeSet<String>)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            owner_id: model.owner_id,
            shared_with,
            name: model.name,
            kind: WalletKind::try_from(model.kind.as_str())?,
            balance: MoneyCents::new(model.balance_minor),
            currency: model_currency(&model.currency)?,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn wallet(balance: i64) -> Wallet {
        Wallet::new(
            "alice".to_string(),
            "Cash".to_string(),
            WalletKind::Personal,
            MoneyCents::new(balance),
            Currency::Eur,
            Utc.timestamp_opt(0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn new_rejects_negative_opening_balance() {
        let err = Wallet::new(
            "alice".to_string(),
            "Cash".to_string(),
            WalletKind::Personal,
            MoneyCents::new(-1),
            Currency::Eur,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::Validation("initial balance must be >= 0".to_string())
        );
    }

    #[test]
    fn debit_down_to_zero_is_allowed() {
        let wallet = wallet(10_00);
        assert_eq!(wallet.debited(MoneyCents::new(10_00)).unwrap(), MoneyCents::ZERO);
    }

    #[test]
    fn debit_below_zero_is_insufficient_funds() {
        let wallet = wallet(10_00);
        assert!(matches!(
            wallet.debited(MoneyCents::new(50_00)),
            Err(EngineError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn credit_and_debit_require_positive_amounts() {
        let wallet = wallet(10_00);
        assert!(matches!(
            wallet.credited(MoneyCents::ZERO),
            Err(EngineError::Validation(_))
        ));
        assert!(matches!(
            wallet.debited(MoneyCents::new(-1)),
            Err(EngineError::Validation(_))
        ));
        assert_eq!(
            wallet.credited(MoneyCents::new(5_50)).unwrap(),
            MoneyCents::new(15_50)
        );
    }

    #[test]
    fn access_covers_owner_and_sharers() {
        let mut wallet = wallet(0);
        wallet.shared_with.insert("bob".to_string());
        assert!(wallet.is_accessible_by("alice"));
        assert!(wallet.is_accessible_by("bob"));
        assert!(!wallet.is_owner("bob"));
        assert!(!wallet.is_accessible_by("carol"));
    }

    #[test]
    fn kind_roundtrips_through_storage_string() {
        for kind in [
            WalletKind::Personal,
            WalletKind::Shared,
            WalletKind::Family,
            WalletKind::Business,
        ] {
            assert_eq!(WalletKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(WalletKind::try_from("savings").is_err());
    }
}
