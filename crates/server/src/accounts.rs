//! Accounts API endpoints.

use api_types::{
    Message,
    account::{Account, AccountNew, Balance, Deposit},
};
use axum::{
    Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState, validation};

fn map_account(account: engine::Account) -> Account {
    Account {
        id: account.id,
        user_id: account.user_id,
        balance: validation::to_decimal(account.balance),
        created_at: account.created_at,
        updated_at: account.updated_at,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<AccountNew>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), ServerError> {
    let Json(payload) = payload?;
    let (user_id, initial_balance) = validation::account_new(&payload)?;

    let account = state
        .engine
        .create_account(user_id, initial_balance)
        .await?;
    Ok((StatusCode::CREATED, Json(map_account(account))))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Account>, ServerError> {
    let Path(id) = id?;
    Ok(Json(map_account(state.engine.account(id).await?)))
}

pub async fn delete(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ServerError> {
    let Path(id) = id?;
    state.engine.delete_account(id).await?;
    Ok(Json(Message::new("Account deleted")))
}

pub async fn deposit(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<Deposit>, JsonRejection>,
) -> Result<Json<Account>, ServerError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let amount = validation::deposit(&payload)?;

    let account = state.engine.deposit(id, amount).await?;
    Ok(Json(map_account(account)))
}

pub async fn balance(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Balance>, ServerError> {
    let Path(id) = id?;
    let balance = state.engine.balance(id).await?;
    Ok(Json(Balance {
        balance: validation::to_decimal(balance),
    }))
}
