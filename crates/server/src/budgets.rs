//! Budget API endpoints

use api_types::{
    Success,
    budget::{BudgetNew, BudgetStatusView, BudgetUpdate, BudgetView, BudgetViolationView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{MoneyCents, NewBudgetCmd, UpdateBudgetCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetView>>, ServerError> {
    let budgets = state.engine.list_budgets(&user.username).await?;
    Ok(Json(budgets.into_iter().map(views::budget).collect()))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<BudgetNew>,
) -> Result<(StatusCode, Json<BudgetView>), ServerError> {
    let cmd = NewBudgetCmd::new(
        &user.username,
        payload.category,
        MoneyCents::new(payload.amount_minor),
        payload.start_date,
        payload.end_date,
    );
    let budget = state.engine.new_budget(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::budget(budget))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<BudgetView>, ServerError> {
    let budget = state.engine.budget(budget_id, &user.username).await?;
    Ok(Json(views::budget(budget)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
    Json(payload): Json<BudgetUpdate>,
) -> Result<Json<BudgetView>, ServerError> {
    let mut cmd = UpdateBudgetCmd::new(budget_id, &user.username);
    cmd.category = payload.category;
    cmd.amount = payload.amount_minor.map(MoneyCents::new);
    cmd.start_date = payload.start_date;
    cmd.end_date = payload.end_date;

    let budget = state.engine.update_budget(cmd).await?;
    Ok(Json(views::budget(budget)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(budget_id): Path<Uuid>,
) -> Result<Json<Success>, ServerError> {
    state.engine.delete_budget(budget_id, &user.username).await?;
    Ok(Json(Success { success: true }))
}

/// Consumption of every budget of the caller, exceeded or not.
pub async fn status(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetStatusView>>, ServerError> {
    let statuses = state.engine.budget_statuses(&user.username).await?;
    Ok(Json(statuses.into_iter().map(views::budget_status).collect()))
}

pub async fn violations(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<BudgetViolationView>>, ServerError> {
    let violations = state.engine.evaluate_budgets(&user.username).await?;
    Ok(Json(violations.into_iter().map(views::violation).collect()))
}
