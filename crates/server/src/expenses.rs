//! Expense API endpoints
//!
//! Every mutating endpoint answers with the wallet touched by the change and
//! the budgets of the caller that are exceeded afterwards.

use api_types::expense::{
    ExpenseDeleted, ExpenseListQuery, ExpenseNew, ExpenseOutcome, ExpenseUpdate, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{ExpenseListFilter, MoneyCents, NewExpenseCmd, UpdateExpenseCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

fn outcome(outcome: engine::ExpenseOutcome) -> ExpenseOutcome {
    ExpenseOutcome {
        expense: views::expense(outcome.expense),
        wallet: outcome.wallet.map(views::wallet),
        budget_violations: outcome
            .budget_violations
            .into_iter()
            .map(views::violation)
            .collect(),
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<Vec<ExpenseView>>, ServerError> {
    let filter = ExpenseListFilter {
        wallet_id: query.wallet_id,
        category: query.category,
        from: query.from,
        to: query.to,
        offset: query.offset.unwrap_or(0),
        limit: query.limit,
    };

    let expenses = state
        .engine
        .list_expenses(&filter, &user.username)
        .await?;
    Ok(Json(expenses.into_iter().map(views::expense).collect()))
}

/// Records an expense, debiting its wallet when one is given.
pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseOutcome>), ServerError> {
    let mut cmd = NewExpenseCmd::new(
        &user.username,
        MoneyCents::new(payload.amount_minor),
        payload.category,
        payload.date,
    )
    .tags(payload.tags);
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(wallet_id) = payload.wallet_id {
        cmd = cmd.wallet_id(wallet_id);
    }
    cmd.is_recurring = payload.is_recurring;
    cmd.recurring_type = payload.recurring_type.map(views::recurring_in);

    let recorded = state.engine.record_expense(cmd).await?;
    Ok((StatusCode::CREATED, Json(outcome(recorded))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(expense_id, &user.username).await?;
    Ok(Json(views::expense(expense)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseOutcome>, ServerError> {
    let mut cmd = UpdateExpenseCmd::new(expense_id, &user.username);
    cmd.amount = payload.amount_minor.map(MoneyCents::new);
    cmd.category = payload.category;
    cmd.date = payload.date;
    cmd.description = payload.description;
    cmd.wallet_id = payload.wallet_id;
    cmd.tags = payload.tags;
    cmd.is_recurring = payload.is_recurring;
    cmd.recurring_type = payload.recurring_type.map(views::recurring_in);

    let updated = state.engine.update_expense(cmd).await?;
    Ok(Json(outcome(updated)))
}

/// Deletes an expense and refunds its wallet.
pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseDeleted>, ServerError> {
    let deleted = outcome(
        state
            .engine
            .delete_expense(expense_id, &user.username)
            .await?,
    );

    Ok(Json(ExpenseDeleted {
        success: true,
        wallet: deleted.wallet,
        budget_violations: deleted.budget_violations,
    }))
}
