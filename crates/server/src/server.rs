use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use crate::{
    ServerError, accounts,
    auth,
    categories, error_response, records, users,
};
use engine::Engine;

/// Who may call `POST /accounts`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCreation {
    Public,
    #[default]
    Authenticated,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub account_creation: AccountCreation,
    /// Lifetime of a token issued by `POST /login`.
    pub token_ttl: chrono::Duration,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            account_creation: AccountCreation::default(),
            token_ttl: chrono::Duration::hours(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub config: ServerConfig,
}

impl ServerState {
    pub fn new(engine: Engine, config: ServerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
        }
    }
}

async fn request_timeout(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(state.config.request_timeout, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%path, "request timed out");
            ServerError::Timeout.into_response()
        }
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Resource not found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Build the HTTP API.
///
/// Protected methods get the token layer through `route_layer` before any
/// public method on the same path is chained, so e.g. `GET /users` needs a
/// token while `POST /users` does not.
pub fn router(state: ServerState) -> Router {
    let auth = middleware::from_fn_with_state(state.clone(), auth::require_token);

    let create_account = match state.config.account_creation {
        AccountCreation::Public => post(accounts::create),
        AccountCreation::Authenticated => post(accounts::create).route_layer(auth.clone()),
    };

    Router::new()
        .route("/register", post(users::create))
        .route("/login", post(auth::login))
        .route(
            "/users",
            get(users::list).route_layer(auth.clone()).post(users::create),
        )
        .route(
            "/users/{id}",
            delete(users::delete).route_layer(auth.clone()).get(users::get),
        )
        .route("/accounts", create_account)
        .route(
            "/accounts/{id}",
            get(accounts::get).delete(accounts::delete).route_layer(auth.clone()),
        )
        .route(
            "/accounts/{id}/deposit",
            post(accounts::deposit).route_layer(auth.clone()),
        )
        .route(
            "/accounts/{id}/balance",
            get(accounts::balance).route_layer(auth.clone()),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::create).route_layer(auth.clone()),
        )
        .route(
            "/categories/{id}",
            get(categories::get).delete(categories::delete).route_layer(auth.clone()),
        )
        .route(
            "/records",
            get(records::list).post(records::create).route_layer(auth.clone()),
        )
        .route(
            "/records/{id}",
            get(records::get).route_layer(auth),
        )
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(state.clone(), request_timeout))
        .with_state(state)
}

pub async fn run(state: ServerState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    run_with_listener(state, listener).await
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
