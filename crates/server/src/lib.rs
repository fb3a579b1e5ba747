use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;
use serde::Serialize;

pub use server::{
    AccountCreation, ServerConfig, ServerState, router, run, run_with_listener,
    spawn_with_listener,
};
pub use validation::FieldErrors;

mod accounts;
mod auth;
mod categories;
mod records;
mod server;
mod users;
mod validation;

/// Why a request was refused authentication. Rendered as the `error` tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    AuthorizationRequired,
    InvalidToken,
    TokenExpired,
    InvalidCredentials,
}

impl AuthFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationRequired => "authorization_required",
            Self::InvalidToken => "invalid_token",
            Self::TokenExpired => "token_expired",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Field-shape violations, reported all at once.
    Validation(FieldErrors),
    Unauthorized(AuthFailure),
    Timeout,
    /// A path that names no resource, such as a non-numeric id.
    NotFound,
    /// A body or query that could not be parsed at all.
    Generic(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    messages: Option<FieldErrors>,
}

pub(crate) fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
    let body = ErrorBody {
        error: error.to_string(),
        messages: None,
    };
    (status, Json(body)).into_response()
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_)
        | EngineError::InsufficientFunds(_)
        | EngineError::InvalidAmount(_)
        | EngineError::InvalidName(_)
        | EngineError::NoAccount(_) => StatusCode::BAD_REQUEST,
        EngineError::Contention(_) => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidDuration(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error, messages) = match self {
            ServerError::Engine(err) => {
                let status = status_for_engine_error(&err);
                match &err {
                    EngineError::Database(db_err) => tracing::error!("database error: {db_err}"),
                    EngineError::InvalidDuration(_) => tracing::error!("misconfigured: {err}"),
                    EngineError::Contention(_) => tracing::warn!("gave up on request: {err}"),
                    _ => {}
                }
                (status, err.to_string(), None)
            }
            ServerError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(fields),
            ),
            ServerError::Unauthorized(failure) => {
                (StatusCode::UNAUTHORIZED, failure.as_str().to_string(), None)
            }
            ServerError::Timeout => (
                StatusCode::SERVICE_UNAVAILABLE,
                "request_timeout".to_string(),
                None,
            ),
            ServerError::NotFound => (
                StatusCode::NOT_FOUND,
                "Resource not found".to_string(),
                None,
            ),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err, None),
        };

        (status, Json(ErrorBody { error, messages })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        tracing::debug!("unmatched path: {}", value.body_text());
        Self::NotFound
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_conflict_maps_to_400() {
        let res = ServerError::from(EngineError::ExistingKey("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ledger_rule_violations_map_to_400() {
        for err in [
            EngineError::InsufficientFunds("x".to_string()),
            EngineError::InvalidAmount("x".to_string()),
            EngineError::NoAccount("x".to_string()),
        ] {
            let res = ServerError::from(err).into_response();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn contention_and_timeout_map_to_503() {
        let res = ServerError::from(EngineError::Contention("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            ServerError::Timeout.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn database_faults_map_to_500() {
        let err = EngineError::Database(sea_orm_err("disk I/O error"));
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn out_of_range_durations_map_to_500() {
        let err = EngineError::InvalidDuration("token lifetime".to_string());
        let res = ServerError::from(err).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_failures_map_to_401() {
        let res = ServerError::Unauthorized(AuthFailure::TokenExpired).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn unmatched_paths_map_to_404() {
        let res = ServerError::NotFound.into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    fn sea_orm_err(message: &str) -> sea_orm::DbErr {
        sea_orm::DbErr::Custom(message.to_string())
    }
}
