use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::Engine;
use migration::MigratorTrait;
use server::{AccountCreation, ServerConfig, ServerState};

async fn app_with(config: ServerConfig) -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    server::router(ServerState::new(engine, config))
}

async fn app() -> Router {
    app_with(ServerConfig::default()).await
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers `name` and returns a fresh token for them.
async fn register_and_login(app: &Router, name: &str) -> (i64, String) {
    let (status, user) = send(
        app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": name, "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "name": name, "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        user["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn deposit_and_spend_through_the_api() {
    let app = app().await;
    let (alice, token) = register_and_login(&app, "Alice").await;

    let (status, account) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(&token),
        Some(json!({ "user_id": alice })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["balance"], json!(0.0));
    let account_id = account["id"].as_i64().unwrap();

    let (status, account) = send(
        &app,
        Method::POST,
        &format!("/accounts/{account_id}/deposit"),
        Some(&token),
        Some(json!({ "amount": 100 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance"], json!(100.0));

    let (status, food) = send(
        &app,
        Method::POST,
        "/categories",
        Some(&token),
        Some(json!({ "name": "Food" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, record) = send(
        &app,
        Method::POST,
        "/records",
        Some(&token),
        Some(json!({ "user_id": alice, "category_id": food["id"], "amount": 30 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["amount"], json!(30.0));
    assert!(record["date_time"].is_string());

    let (status, balance) = send(
        &app,
        Method::GET,
        &format!("/accounts/{account_id}/balance"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance, json!({ "balance": 70.0 }));

    let (_, records) = send(&app, Method::GET, "/records", Some(&token), None).await;
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn protected_routes_explain_missing_or_bad_tokens() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "authorization_required" }));

    let (status, body) = send(&app, Method::GET, "/users", Some("not-a-uuid"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let unknown = "0b6e1a70-6d2b-4f43-9a43-4f8f0fb4a6a1";
    let (status, body) = send(&app, Method::GET, "/records", Some(unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    // Same path, public method.
    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": "Bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, user) = send(&app, Method::GET, "/users/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user, json!({ "id": 1, "name": "Bob" }));
}

#[tokio::test]
async fn expired_tokens_are_refused() {
    let app = app_with(ServerConfig {
        token_ttl: chrono::Duration::seconds(-1),
        ..ServerConfig::default()
    })
    .await;
    let (_, token) = register_and_login(&app, "Alice").await;

    let (status, body) = send(&app, Method::GET, "/categories", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "token_expired");
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let app = app().await;
    register_and_login(&app, "Alice").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "name": "Alice", "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "name": "Nobody", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn validation_errors_list_every_field() {
    let app = app().await;
    let (_, token) = register_and_login(&app, "Alice").await;

    let (status, body) = send(&app, Method::POST, "/records", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation error");
    let messages = body["messages"].as_object().unwrap();
    assert!(messages.contains_key("user_id"));
    assert!(messages.contains_key("category_id"));
    assert!(messages.contains_key("amount"));

    let (status, body) = send(
        &app,
        Method::POST,
        "/accounts/1/deposit",
        Some(&token),
        Some(json!({ "amount": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["messages"]["amount"].is_array());
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/users")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_numeric_ids_are_not_found() {
    let app = app().await;
    let (_, token) = register_and_login(&app, "Alice").await;

    let (status, body) = send(&app, Method::GET, "/users/abc", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Resource not found" }));

    let (status, body) = send(&app, Method::GET, "/records/1.5", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Resource not found" }));
}

#[tokio::test]
async fn ledger_failures_map_to_client_errors() {
    let app = app().await;
    let (alice, token) = register_and_login(&app, "Alice").await;
    let (_, food) = send(
        &app,
        Method::POST,
        "/categories",
        Some(&token),
        Some(json!({ "name": "Food" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/records",
        Some(&token),
        Some(json!({ "user_id": alice, "category_id": food["id"], "amount": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("no account"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(&token),
        Some(json!({ "user_id": alice, "initial_balance": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        Method::POST,
        "/records",
        Some(&token),
        Some(json!({ "user_id": alice, "category_id": food["id"], "amount": 10.01 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Insufficient funds"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/records",
        Some(&token),
        Some(json!({ "user_id": 999, "category_id": food["id"], "amount": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        "/accounts",
        Some(&token),
        Some(json!({ "user_id": alice })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/accounts/1/balance", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], json!(10.0));
}

#[tokio::test]
async fn account_creation_can_be_public() {
    let app = app_with(ServerConfig {
        account_creation: AccountCreation::Public,
        ..ServerConfig::default()
    })
    .await;
    let (_, user) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": "Alice" })),
    )
    .await;

    let (status, account) = send(
        &app,
        Method::POST,
        "/accounts",
        None,
        Some(json!({ "user_id": user["id"], "initial_balance": 12.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(account["balance"], json!(12.5));

    // Reading it back still needs a token.
    let (status, _) = send(&app, Method::GET, "/accounts/1", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn account_creation_needs_a_token_by_default() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/accounts",
        None,
        Some(json!({ "user_id": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "authorization_required");
}

#[tokio::test]
async fn deleting_a_user_cascades() {
    let app = app().await;
    let (admin, token) = register_and_login(&app, "Admin").await;
    let (_, bob) = send(
        &app,
        Method::POST,
        "/users",
        None,
        Some(json!({ "name": "Bob" })),
    )
    .await;
    let bob_id = bob["id"].as_i64().unwrap();
    send(
        &app,
        Method::POST,
        "/accounts",
        Some(&token),
        Some(json!({ "user_id": bob_id, "initial_balance": 50 })),
    )
    .await;
    let (_, food) = send(
        &app,
        Method::POST,
        "/categories",
        Some(&token),
        Some(json!({ "name": "Food" })),
    )
    .await;
    for amount in [10, 20] {
        let (status, _) = send(
            &app,
            Method::POST,
            "/records",
            Some(&token),
            Some(json!({ "user_id": bob_id, "category_id": food["id"], "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/users/{bob_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "User deleted" }));

    let (status, _) = send(&app, Method::GET, &format!("/users/{bob_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, records) = send(
        &app,
        Method::GET,
        &format!("/records?user_id={bob_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(records, json!([]));

    let (status, users) = send(&app, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users, json!([{ "id": admin, "name": "Admin" }]));
}

#[tokio::test]
async fn unknown_routes_and_methods_get_json_errors() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Resource not found" }));

    let (status, body) = send(&app, Method::PUT, "/users", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn missing_entities_are_404() {
    let app = app().await;
    let (_, token) = register_and_login(&app, "Alice").await;

    for uri in ["/accounts/7", "/categories/7", "/records/7"] {
        let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["error"].as_str().unwrap().ends_with("not found"));
    }
}

#[tokio::test]
async fn records_cannot_be_deleted_on_their_own() {
    let app = app().await;
    let (_, token) = register_and_login(&app, "Alice").await;

    let (status, body) = send(&app, Method::DELETE, "/records/1", Some(&token), None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn slow_requests_are_cut_off_with_503() {
    let app = app_with(ServerConfig {
        request_timeout: Duration::ZERO,
        ..ServerConfig::default()
    })
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        None,
        Some(json!({ "name": "Alice", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "request_timeout" }));
}
