mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_list_users_as_admin() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server.get("/api/users").authorization_bearer(&token).await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["total"], 3);
    assert!(
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u.get("password_hash").is_none())
    );
}

#[tokio::test]
async fn test_user_endpoints_require_admin() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server.get("/api/users").authorization_bearer(&token).await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(common::error_code(&response.json::<Value>()), "forbidden");
}

#[tokio::test]
async fn test_create_user_normalizes_role() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .post("/api/users")
        .authorization_bearer(&token)
        .json(&json!({
            "username": "pedro",
            "email": "Pedro@Example.com",
            "password": "clave123",
            "role": "tecnico"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["role"], "Técnico");
    assert_eq!(body["email"], "pedro@example.com");

    common::login(&server, ("pedro", "clave123")).await;
}

#[tokio::test]
async fn test_create_user_short_password() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .post("/api/users")
        .authorization_bearer(&token)
        .json(&json!({
            "username": "pedro",
            "email": "pedro@example.com",
            "password": "123"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .post("/api/users")
        .authorization_bearer(&token)
        .json(&json!({
            "username": "otro",
            "email": "tecnico@rioclaro.gov.co",
            "password": "clave123"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_update_user_role() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .put("/api/users/3")
        .authorization_bearer(&token)
        .json(&json!({
            "username": "observador",
            "email": "observador@rioclaro.gov.co",
            "role": "Técnico"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["role"], "Técnico");
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .delete("/api/users/1")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_user() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    server
        .delete("/api/users/3")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/users/3")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_assign_stations_deduplicates() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .put("/api/users/3/stations")
        .authorization_bearer(&token)
        .json(&json!({ "station_ids": [3, 1, 3] }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["assigned_stations"], json!([1, 3]));
}

#[tokio::test]
async fn test_assign_unknown_station() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::ADMIN).await;

    let response = server
        .put("/api/users/3/stations")
        .authorization_bearer(&token)
        .json(&json!({ "station_ids": [1, 42] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["details"]["missing"],
        json!([42])
    );
}
