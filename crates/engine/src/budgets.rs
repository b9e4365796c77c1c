//! Budgets: per-category spending caps over a date range.
//!
//! A budget never stores how much of it has been spent. Consumption is always
//! derived from the user's expenses with [`compute_consumption`], so there is
//! nothing to keep in sync when expenses change.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Expense, MoneyCents, ResultEngine,
    util::{category_key, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub user_id: String,
    pub category: String,
    /// Spending cap for the period.
    pub amount: MoneyCents,
    pub start_date: DateTime<Utc>,
    /// Exclusive.
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// `true` when `date` falls in `[start_date, end_date)`.
    pub fn covers(&self, date: DateTime<Utc>) -> bool {
        self.start_date <= date && date < self.end_date
    }

    /// `true` when the expense counts against this budget.
    pub fn matches(&self, user_id: &str, expense: &Expense) -> bool {
        expense.user_id == user_id
            && self.covers(expense.date)
            && category_key(&expense.category) == category_key(&self.category)
    }
}

/// Validates the mutable fields of a budget.
pub(crate) fn validate_budget_fields(
    amount: MoneyCents,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> ResultEngine<()> {
    amount.require_positive("budget amount")?;
    if start_date >= end_date {
        return Err(EngineError::Validation(
            "budget start_date must be before end_date".to_string(),
        ));
    }
    Ok(())
}

/// A budget whose derived consumption exceeds its cap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetViolation {
    pub budget_id: Uuid,
    pub category: String,
    pub cap: MoneyCents,
    pub consumed: MoneyCents,
    /// `consumed - cap`, always > 0.
    pub overage: MoneyCents,
}

/// Progress of a single budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    pub consumed: MoneyCents,
    /// `cap - consumed`; negative once the budget is exceeded.
    pub remaining: MoneyCents,
    pub exceeded: bool,
}

/// Sums the amounts of `user_id`'s expenses that count against `budget`.
///
/// The sum saturates at the largest representable amount, so consumption,
/// `cap - consumed` and `consumed - cap` never overflow for a positive cap.
pub fn compute_consumption(user_id: &str, budget: &Budget, expenses: &[Expense]) -> MoneyCents {
    expenses
        .iter()
        .filter(|expense| budget.matches(user_id, expense))
        .fold(MoneyCents::ZERO, |total, expense| {
            total.saturating_add(expense.amount)
        })
}

/// Builds the status of every budget owned by `user_id`, in input order.
pub fn statuses(user_id: &str, budgets: &[Budget], expenses: &[Expense]) -> Vec<BudgetStatus> {
    budgets
        .iter()
        .filter(|budget| budget.user_id == user_id)
        .map(|budget| {
            let consumed = compute_consumption(user_id, budget, expenses);
            BudgetStatus {
                budget: budget.clone(),
                consumed,
                remaining: budget.amount - consumed,
                exceeded: consumed > budget.amount,
            }
        })
        .collect()
}

/// Returns one violation per exceeded budget owned by `user_id`.
///
/// Pure and deterministic: the same inputs always produce the same list, in
/// the order the budgets were given.
pub fn evaluate(user_id: &str, budgets: &[Budget], expenses: &[Expense]) -> Vec<BudgetViolation> {
    statuses(user_id, budgets, expenses)
        .into_iter()
        .filter(|status| status.exceeded)
        .map(|status| BudgetViolation {
            budget_id: status.budget.id,
            overage: status.consumed - status.budget.amount,
            category: status.budget.category,
            cap: status.budget.amount,
            consumed: status.consumed,
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount_minor: i64,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Budget> for ActiveModel {
    fn from(value: &Budget) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            user_id: ActiveValue::Set(value.user_id.clone()),
            category: ActiveValue::Set(value.category.clone()),
            amount_minor: ActiveValue::Set(value.amount.cents()),
            start_date: ActiveValue::Set(value.start_date),
            end_date: ActiveValue::Set(value.end_date),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl TryFrom<Model> for Budget {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "budget")?,
            user_id: model.user_id,
            category: model.category,
            amount: MoneyCents::new(model.amount_minor),
            start_date: model.start_date,
            end_date: model.end_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};

    use super::*;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    fn budget(category: &str, cap: i64) -> Budget {
        Budget {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            category: category.to_string(),
            amount: MoneyCents::new(cap),
            start_date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            created_at: day(1),
            updated_at: day(1),
        }
    }

    fn expense(user: &str, category: &str, amount: i64, date: DateTime<Utc>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            user_id: user.to_string(),
            amount: MoneyCents::new(amount),
            category: category.to_string(),
            description: None,
            date,
            wallet_id: None,
            tags: BTreeSet::new(),
            is_recurring: false,
            recurring_type: None,
            created_at: date,
            updated_at: date,
        }
    }

    #[test]
    fn consumption_sums_matching_category_and_period() {
        let food = budget("Food", 100_00);
        let expenses = vec![
            expense("alice", "food", 30_00, day(2)),
            expense("alice", " FOOD ", 20_00, day(20)),
            expense("alice", "rent", 500_00, day(2)),
            expense("bob", "food", 99_00, day(2)),
        ];
        assert_eq!(
            compute_consumption("alice", &food, &expenses),
            MoneyCents::new(50_00)
        );
    }

    #[test]
    fn huge_expenses_saturate_consumption() {
        let food = budget("food", 1);
        let expenses = vec![
            expense("alice", "food", i64::MAX, day(2)),
            expense("alice", "food", 1, day(3)),
        ];
        assert_eq!(
            compute_consumption("alice", &food, &expenses),
            MoneyCents::new(i64::MAX)
        );

        let violations = evaluate("alice", &[food], &expenses);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].overage, MoneyCents::new(i64::MAX - 1));
    }

    #[test]
    fn period_end_is_exclusive() {
        let food = budget("food", 100_00);
        let at_start = expense("alice", "food", 10_00, food.start_date);
        let at_end = expense("alice", "food", 10_00, food.end_date);
        assert_eq!(
            compute_consumption("alice", &food, &[at_start, at_end]),
            MoneyCents::new(10_00)
        );
    }

    #[test]
    fn expense_outside_range_never_changes_consumption() {
        let food = budget("food", 100_00);
        let mut expenses = vec![expense("alice", "food", 40_00, day(5))];
        let before = compute_consumption("alice", &food, &expenses);
        expenses.push(expense(
            "alice",
            "food",
            1_000_00,
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        ));
        assert_eq!(compute_consumption("alice", &food, &expenses), before);
    }

    #[test]
    fn evaluate_reports_overage_only_for_exceeded_budgets() {
        let food = budget("food", 50_00);
        let fun = budget("fun", 50_00);
        let exact = budget("rent", 30_00);
        let expenses = vec![
            expense("alice", "food", 80_00, day(3)),
            expense("alice", "fun", 10_00, day(3)),
            expense("alice", "rent", 30_00, day(3)),
        ];

        let violations = evaluate("alice", &[food.clone(), fun, exact], &expenses);
        assert_eq!(
            violations,
            vec![BudgetViolation {
                budget_id: food.id,
                category: "food".to_string(),
                cap: MoneyCents::new(50_00),
                consumed: MoneyCents::new(80_00),
                overage: MoneyCents::new(30_00),
            }]
        );
    }

    #[test]
    fn evaluate_is_deterministic() {
        let budgets = vec![budget("food", 10_00), budget("fun", 5_00)];
        let expenses = vec![
            expense("alice", "food", 25_00, day(3)),
            expense("alice", "fun", 6_00, day(4)),
        ];
        let first = evaluate("alice", &budgets, &expenses);
        let second = evaluate("alice", &budgets, &expenses);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].category, "food");
    }

    #[test]
    fn other_users_budgets_are_ignored() {
        let mut bobs = budget("food", 1_00);
        bobs.user_id = "bob".to_string();
        let expenses = vec![expense("alice", "food", 50_00, day(3))];
        assert!(evaluate("alice", &[bobs], &expenses).is_empty());
    }

    #[test]
    fn statuses_report_remaining() {
        let food = budget("food", 100_00);
        let expenses = vec![expense("alice", "food", 40_00, day(3))];
        let status = &statuses("alice", &[food], &expenses)[0];
        assert_eq!(status.consumed, MoneyCents::new(40_00));
        assert_eq!(status.remaining, MoneyCents::new(60_00));
        assert!(!status.exceeded);
    }

    #[test]
    fn fields_validation() {
        assert!(validate_budget_fields(MoneyCents::new(1), day(1), day(2)).is_ok());
        assert!(validate_budget_fields(MoneyCents::ZERO, day(1), day(2)).is_err());
        assert!(validate_budget_fields(MoneyCents::new(1), day(2), day(2)).is_err());
        assert!(validate_budget_fields(MoneyCents::new(1), day(3), day(2)).is_err());
    }
}
