mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_list_alerts_defaults_to_active() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let body = server
        .get("/api/alerts")
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["station_id"], 3);
    assert_eq!(body["items"][0]["is_active"], true);
}

#[tokio::test]
async fn test_list_all_alerts() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let body = server
        .get("/api/alerts")
        .add_query_param("active_only", false)
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_resolve_alert() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/alerts/1/resolve")
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["is_active"], false);
    assert!(body["resolved_at"].is_string());

    let again = server
        .post("/api/alerts/1/resolve")
        .authorization_bearer(&token)
        .await;
    again.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_resolve_alert_requires_tecnico() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    server
        .post("/api/alerts/1/resolve")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_resolve_unknown_alert() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    server
        .post("/api/alerts/404/resolve")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_configurations_by_station() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let all = server
        .get("/api/alert-configurations")
        .authorization_bearer(&token)
        .await
        .json::<Vec<Value>>();
    assert_eq!(all.len(), 3);

    let for_station = server
        .get("/api/alert-configurations")
        .add_query_param("station_id", 2)
        .add_query_param("sensor_type", "water_level")
        .authorization_bearer(&token)
        .await
        .json::<Vec<Value>>();
    assert_eq!(for_station.len(), 1);
    assert_eq!(for_station[0]["thresholds"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_configuration() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/alert-configurations")
        .authorization_bearer(&token)
        .json(&json!({
            "station_id": 1,
            "sensor_type": "flow_rate",
            "sensor_unit": "m3/s",
            "thresholds": [
                { "level": "warning", "max_value": 40.0 },
                { "level": "critical", "max_value": 60.0 }
            ]
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["sensor_type"], "flow_rate");
    assert_eq!(body["is_active"], true);
    assert_eq!(body["thresholds"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_configuration_duplicate_sensor() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/alert-configurations")
        .authorization_bearer(&token)
        .json(&json!({
            "station_id": 1,
            "sensor_type": "water_level",
            "thresholds": [{ "level": "warning", "max_value": 2.0 }]
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_configuration_rejects_duplicated_levels() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/alert-configurations")
        .authorization_bearer(&token)
        .json(&json!({
            "station_id": 1,
            "sensor_type": "temperature",
            "thresholds": [
                { "level": "warning", "max_value": 20.0 },
                { "level": "warning", "max_value": 25.0 }
            ]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_configuration() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .patch("/api/alert-configurations/3")
        .authorization_bearer(&token)
        .json(&json!({ "is_active": false }))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["is_active"], false);

    server
        .delete("/api/alert-configurations/3")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/alert-configurations/3")
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_configuration_keeps_thresholds_on_empty_set() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .patch("/api/alert-configurations/1")
        .authorization_bearer(&token)
        .json(&json!({ "thresholds": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["message"],
        "Al menos un umbral es requerido"
    );

    let current = server
        .get("/api/alert-configurations/1")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert!(!current["thresholds"].as_array().unwrap().is_empty());
}
