//! Savings goals.
//!
//! A goal moves through a single one-way transition:
//!
//! ```text
//! Active (current < target) --fund / update--> Completed (terminal)
//! ```
//!
//! In normal operation `current` only grows through
//! [`Engine::fund_goal`](crate::Engine::fund_goal), which debits a wallet by
//! the same amount. Direct edits of `current` are corrections and never touch
//! a wallet.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, MoneyCents, ResultEngine,
    util::{apply_optional_text_patch, normalize_required_text, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub target: MoneyCents,
    pub current: MoneyCents,
    pub deadline: Option<DateTime<Utc>>,
    pub category: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field edits for [`Goal::apply_patch`]. `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct GoalPatch {
    pub name: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
    pub target: Option<MoneyCents>,
    pub current: Option<MoneyCents>,
    pub deadline: Option<DateTime<Utc>>,
    /// `Some("")` clears the category.
    pub category: Option<String>,
    pub is_completed: Option<bool>,
}

impl Goal {
    pub fn new(
        user_id: String,
        name: &str,
        target: MoneyCents,
        now: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let name = normalize_required_text(name, "goal name")?;
        target.require_positive("goal target")?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            description: None,
            target,
            current: MoneyCents::ZERO,
            deadline: None,
            category: None,
            is_completed: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// How much can still be funded before the target is reached.
    pub fn remaining(&self) -> MoneyCents {
        if self.current >= self.target {
            MoneyCents::ZERO
        } else {
            self.target - self.current
        }
    }

    /// Validates a funding of `amount` and returns the resulting progress.
    ///
    /// Funding is exact: a request above [`remaining`](Self::remaining) is
    /// rejected with `Overfunding` instead of being clamped.
    pub fn funded(&self, amount: MoneyCents) -> ResultEngine<MoneyCents> {
        if self.is_completed {
            return Err(EngineError::GoalCompleted(self.name.clone()));
        }
        amount.require_positive("amount")?;
        let remaining = self.remaining();
        if amount > remaining {
            return Err(EngineError::Overfunding {
                requested: amount,
                remaining,
            });
        }
        Ok(self.current + amount)
    }

    /// Records a funding previously validated with [`funded`](Self::funded).
    pub fn apply_funding(&mut self, amount: MoneyCents, now: DateTime<Utc>) -> ResultEngine<()> {
        self.current = self.funded(amount)?;
        if self.current == self.target {
            self.is_completed = true;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Applies arbitrary field edits.
    ///
    /// A goal is completed exactly when `current == target`: reaching the
    /// target through an edit completes it, and marking it completed below
    /// the target is rejected. A completed goal can never be reopened and
    /// `current` never exceeds `target`.
    pub fn apply_patch(&mut self, patch: GoalPatch, now: DateTime<Utc>) -> ResultEngine<()> {
        if patch.is_completed == Some(false) && self.is_completed {
            return Err(EngineError::Validation(
                "a completed goal cannot be reopened".to_string(),
            ));
        }

        let name = match patch.name.as_deref() {
            Some(name) => normalize_required_text(name, "goal name")?,
            None => self.name.clone(),
        };
        let target = patch
            .target
            .unwrap_or(self.target)
            .require_positive("goal target")?;
        let current = patch
            .current
            .unwrap_or(self.current)
            .require_non_negative("goal current amount")?;
        if current > target {
            return Err(EngineError::Validation(format!(
                "goal current amount {current} exceeds target {target}"
            )));
        }
        if current < target && patch.is_completed == Some(true) {
            return Err(EngineError::Validation(format!(
                "goal is completed only when current amount {current} reaches target {target}"
            )));
        }
        if current < target && self.is_completed {
            return Err(EngineError::Validation(
                "a completed goal must stay at its target".to_string(),
            ));
        }

        self.name = name;
        self.description = apply_optional_text_patch(
            self.description.take(),
            patch.description.as_deref(),
        );
        self.category =
            apply_optional_text_patch(self.category.take(), patch.category.as_deref());
        if let Some(deadline) = patch.deadline {
            self.deadline = Some(deadline);
        }
        self.target = target;
        self.current = current;
        self.is_completed = current == target;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub target_minor: i64,
    pub current_minor: i64,
    pub deadline: Option<DateTimeUtc>,
    pub category: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Goal> for ActiveModel {
    fn from(value: &Goal) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            target_minor: ActiveValue::Set(value.target.cents()),
            current_minor: ActiveValue::Set(value.current.cents()),
            deadline: ActiveValue::Set(value.deadline),
            category: ActiveValue::Set(value.category.clone()),
            is_completed: ActiveValue::Set(value.is_completed),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Goal {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "goal")?,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            target: MoneyCents::new(model.target_minor),
            current: MoneyCents::new(model.current_minor),
            deadline: model.deadline,
            category: model.category,
            is_completed: model.is_completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
