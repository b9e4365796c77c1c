//! Expenses: dated money outflows, optionally attributed to a wallet.
//!
//! An expense that references a wallet is mirrored in that wallet's balance:
//! recording debits it, editing moves the difference, deleting credits it
//! back. The bookkeeping itself lives in `ops::expenses`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    util::{decode_tags, encode_tags, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for RecurringType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::Validation(format!(
                "invalid recurring type: {other}"
            ))),
        }
    }
}

/// Checks that `recurring_type` is present exactly when the expense recurs.
pub(crate) fn validate_recurrence(
    is_recurring: bool,
    recurring_type: Option<RecurringType>,
) -> ResultEngine<()> {
    match (is_recurring, recurring_type) {
        (true, None) => Err(EngineError::Validation(
            "recurring expenses need a recurring type".to_string(),
        )),
        (false, Some(_)) => Err(EngineError::Validation(
            "recurring type set on a non-recurring expense".to_string(),
        )),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub user_id: String,
    pub amount: MoneyCents,
    pub category: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub wallet_id: Option<Uuid>,
    pub tags: BTreeSet<String>,
    pub is_recurring: bool,
    pub recurring_type: Option<RecurringType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub date: DateTimeUtc,
    pub wallet_id: Option<String>,
    /// JSON array of strings.
    pub tags: String,
    pub is_recurring: bool,
    pub recurring_type: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Expense> for ActiveModel {
    type Error = EngineError;

    fn try_from(value: &Expense) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            category: ActiveValue::Set(value.category.clone()),
            description: ActiveValue::Set(value.description.clone()),
            date: ActiveValue::Set(value.date),
            wallet_id: ActiveValue::Set(value.wallet_id.map(|id| id.to_string())),
            tags: ActiveValue::Set(encode_tags(&value.tags)?),
            is_recurring: ActiveValue::Set(value.is_recurring),
            recurring_type: ActiveValue::Set(
                value.recurring_type.map(|t| t.as_str().to_string()),
            ),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        })
    }
}

impl TryFrom<Model> for Expense {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "expense")?,
            user_id: model.user_id,
            amount: MoneyCents::new(model.amount_minor),
            category: model.category,
            description: model.description,
            date: model.date,
            wallet_id: model
                .wallet_id
                .as_deref()
                .map(|id| parse_uuid(id, "wallet"))
                .transpose()?,
            tags: decode_tags(&model.tags)?,
            is_recurring: model.is_recurring,
            recurring_type: model
                .recurring_type
                .as_deref()
                .map(RecurringType::try_from)
                .transpose()?,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_fields_must_agree() {
        assert!(validate_recurrence(false, None).is_ok());
        assert!(validate_recurrence(true, Some(RecurringType::Monthly)).is_ok());
        assert!(validate_recurrence(true, None).is_err());
        assert!(validate_recurrence(false, Some(RecurringType::Weekly)).is_err());
    }

    #[test]
    fn model_conversion_restores_tags_and_wallet() {
        let wallet_id = Uuid::new_v4();
        let now = Utc::now();
        let model = Model {
            id: Uuid::new_v4().to_string(),
            user_id: "alice".to_string(),
            amount_minor: 30_00,
            category: "food".to_string(),
            description: None,
            date: now,
            wallet_id: Some(wallet_id.to_string()),
            tags: r#"["lunch","work"]"#.to_string(),
            is_recurring: true,
            recurring_type: Some("weekly".to_string()),
            created_at: now,
            updated_at: now,
        };

        let expense = Expense::try_from(model).unwrap();
        assert_eq!(expense.amount, MoneyCents::new(30_00));
        assert_eq!(expense.wallet_id, Some(wallet_id));
        assert!(expense.tags.contains("lunch"));
        assert_eq!(expense.recurring_type, Some(RecurringType::Weekly));
    }
}
