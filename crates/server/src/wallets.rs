//! Wallet API endpoints

use api_types::{
    Success,
    wallet::{AddBalance, ShareRequest, WalletNew, WalletUpdate, WalletView},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{MoneyCents, NewWalletCmd, WalletUpdateCmd, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let wallets = state.engine.list_wallets(&user.username).await?;
    Ok(Json(wallets.into_iter().map(views::wallet).collect()))
}

/// Handle requests for creating a new wallet owned by the caller
pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<WalletView>), ServerError> {
    let mut cmd = NewWalletCmd::new(&user.username, payload.name)
        .initial_balance(MoneyCents::new(payload.initial_balance_minor.unwrap_or(0)))
        .shared_with(payload.shared_with);
    if let Some(kind) = payload.kind {
        cmd = cmd.kind(views::kind_in(kind));
    }
    if let Some(currency) = payload.currency {
        cmd = cmd.currency(views::currency_in(currency));
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }

    let wallet = state.engine.new_wallet(cmd).await?;
    Ok((StatusCode::CREATED, Json(views::wallet(wallet))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state.engine.wallet(wallet_id, &user.username).await?;
    Ok(Json(views::wallet(wallet)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletUpdate>,
) -> Result<Json<WalletView>, ServerError> {
    let mut cmd = WalletUpdateCmd::new(wallet_id, &user.username);
    if let Some(name) = payload.name {
        cmd = cmd.name(name);
    }
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    if let Some(kind) = payload.kind {
        cmd = cmd.kind(views::kind_in(kind));
    }

    let wallet = state.engine.update_wallet(cmd).await?;
    Ok(Json(views::wallet(wallet)))
}

/// Deletes a wallet. Expenses paid from it are kept, without a wallet.
pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<Success>, ServerError> {
    state.engine.delete_wallet(wallet_id, &user.username).await?;
    Ok(Json(Success { success: true }))
}

pub async fn add_balance(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<AddBalance>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .credit_wallet(
            wallet_id,
            MoneyCents::new(payload.amount_minor),
            &user.username,
        )
        .await?;
    Ok(Json(views::wallet(wallet)))
}

pub async fn share(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<ShareRequest>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .share_wallet(wallet_id, &payload.username, &user.username)
        .await?;
    Ok(Json(views::wallet(wallet)))
}

pub async fn unshare(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path((wallet_id, member)): Path<(Uuid, String)>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state
        .engine
        .unshare_wallet(wallet_id, &member, &user.username)
        .await?;
    Ok(Json(views::wallet(wallet)))
}
