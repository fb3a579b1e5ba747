//! Bearer-token authentication.
//!
//! Tokens are opaque session ids handed out by `POST /login` and looked up in
//! the store on every protected request.

use api_types::auth::{Login, Token};
use axum::{
    Json,
    extract::{Request, State, rejection::JsonRejection},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::{TypedHeaderRejection, TypedHeaderRejectionReason},
};
use chrono::Utc;
use engine::SessionState;
use uuid::Uuid;

use crate::{AuthFailure, ServerError, server::ServerState, validation};

/// Resolve the bearer token and attach the caller as `Extension<engine::User>`.
pub(crate) async fn require_token(
    State(state): State<ServerState>,
    header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = match header {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) if matches!(rejection.reason(), TypedHeaderRejectionReason::Missing) => {
            return Err(ServerError::Unauthorized(AuthFailure::AuthorizationRequired));
        }
        Err(_) => return Err(ServerError::Unauthorized(AuthFailure::InvalidToken)),
    };
    let token = Uuid::parse_str(header.token())
        .map_err(|_| ServerError::Unauthorized(AuthFailure::InvalidToken))?;

    match state.engine.resolve_session(token, Utc::now()).await? {
        SessionState::Active(user) => {
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        SessionState::Expired => {
            tracing::info!("rejected expired token");
            Err(ServerError::Unauthorized(AuthFailure::TokenExpired))
        }
        SessionState::Unknown => {
            tracing::warn!("rejected unknown token");
            Err(ServerError::Unauthorized(AuthFailure::InvalidToken))
        }
    }
}

pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<Login>, JsonRejection>,
) -> Result<Json<Token>, ServerError> {
    let Json(payload) = payload?;
    let (name, password) = validation::login(&payload)?;

    let Some(user) = state.engine.authenticate(&name, &password).await? else {
        tracing::warn!("login with wrong credentials");
        return Err(ServerError::Unauthorized(AuthFailure::InvalidCredentials));
    };

    let session = state
        .engine
        .create_session(user.id, state.config.token_ttl)
        .await?;
    tracing::info!(user_id = user.id, "issued token");
    Ok(Json(Token {
        token: session.token,
        expires_at: session.expires_at,
    }))
}
