//! Savings goal API endpoints

use api_types::{
    Success,
    goal::{FundGoal, GoalFunded, GoalNew, GoalUpdate, GoalView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{FundGoalCmd, GoalPatch, MoneyCents, NewGoalCmd, UpdateGoalCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<GoalView>>, ServerError> {
    let goals = state.engine.list_goals(&user.username).await?;
    Ok(Json(goals.into_iter().map(views::goal).collect()))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GoalNew>,
) -> Result<(StatusCode, Json<GoalView>), ServerError> {
    let mut cmd = NewGoalCmd::new(
        &user.username,
        payload.name,
        MoneyCents::new(payload.target_minor),
    );
    cmd.description = payload.description;
    cmd.deadline = payload.deadline;
    cmd.category = payload.category;

    let goal = state.engine.new_goal(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::goal(goal))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<GoalView>, ServerError> {
    let goal = state.engine.goal(goal_id, &user.username).await?;
    Ok(Json(views::goal(goal)))
}

/// Edits a goal directly. No wallet is touched.
pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<GoalUpdate>,
) -> Result<Json<GoalView>, ServerError> {
    let cmd = UpdateGoalCmd {
        goal_id,
        user_id: user.username,
        patch: GoalPatch {
            name: payload.name,
            description: payload.description,
            target: payload.target_minor.map(MoneyCents::new),
            current: payload.current_minor.map(MoneyCents::new),
            deadline: payload.deadline,
            category: payload.category,
            is_completed: payload.is_completed,
        },
    };

    let goal = state.engine.update_goal(cmd).await?;
    Ok(Json(views::goal(goal)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
) -> Result<Json<Success>, ServerError> {
    state.engine.delete_goal(goal_id, &user.username).await?;
    Ok(Json(Success { success: true }))
}

/// Moves money from one of the caller's wallets into the goal.
pub async fn add_funds(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(goal_id): Path<Uuid>,
    Json(payload): Json<FundGoal>,
) -> Result<Json<GoalFunded>, ServerError> {
    let cmd = FundGoalCmd::new(
        goal_id,
        payload.wallet_id,
        MoneyCents::new(payload.amount_minor),
        &user.username,
    );

    let funded = state.engine.fund_goal(cmd).await?;
    Ok(Json(GoalFunded {
        goal: views::goal(funded.goal),
        wallet: views::wallet(funded.wallet),
    }))
}
