//! Users API endpoints.

use api_types::{
    Message,
    user::{User, UserNew},
};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
};

use crate::{ServerError, server::ServerState, validation};

pub(crate) fn map_user(user: engine::User) -> User {
    User {
        id: user.id,
        name: user.name,
    }
}

/// Serves both `POST /users` and `POST /register`.
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<UserNew>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ServerError> {
    let Json(payload) = payload?;
    let (name, password) = validation::user_new(&payload)?;

    let user = state
        .engine
        .create_user(&name, password.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(map_user(user))))
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<User>>, ServerError> {
    let users = state.engine.users().await?;
    Ok(Json(users.into_iter().map(map_user).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<User>, ServerError> {
    let Path(id) = id?;
    Ok(Json(map_user(state.engine.user(id).await?)))
}

/// Deletes the user with their account, records and sessions.
pub async fn delete(
    Extension(caller): Extension<engine::User>,
    State(state): State<ServerState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Message>, ServerError> {
    let Path(id) = id?;
    state.engine.delete_user(id).await?;
    tracing::info!(user_id = id, caller = caller.id, "user deleted via API");
    Ok(Json(Message::new("User deleted")))
}
