mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;

#[tokio::test]
async fn test_latest_readings_newest_first() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .get("/api/measurements/latest")
        .add_query_param("station_id", 2)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let readings = response.json::<Vec<Value>>();
    assert_eq!(readings.len(), 24);
    assert!(readings.iter().all(|r| r["station_id"] == 2));
    assert!(readings[0]["timestamp"].as_str() >= readings[1]["timestamp"].as_str());
}

#[tokio::test]
async fn test_historical_filtered_by_station_and_variable() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .get("/api/measurements")
        .add_query_param("station_id", 1)
        .add_query_param("variable_type", "water_level")
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let readings = response.json::<Vec<Value>>();
    assert_eq!(readings.len(), 24);
    assert!(readings[0]["timestamp"].as_str() <= readings[23]["timestamp"].as_str());

    let none = server
        .get("/api/measurements")
        .add_query_param("station_id", 1)
        .add_query_param("variable_type", "flow_rate")
        .authorization_bearer(&token)
        .await
        .json::<Vec<Value>>();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_historical_rejects_inverted_range() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .get("/api/measurements")
        .add_query_param("start_date", "2026-02-01")
        .add_query_param("end_date", "2026-01-01")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_record_measurement_is_queued() {
    let (server, mut rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&json!({ "station_id": 2, "variable_type": "water_level", "value": 2.1 }))
        .await;

    response.assert_status(StatusCode::ACCEPTED);
    let body = response.json::<Value>();
    assert_eq!(body["status"], "queued");
    assert_eq!(body["station_id"], 2);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.station_id, 2);
    assert_eq!(event.value, 2.1);
    assert_eq!(event.submitted_by, Some(2));
}

#[tokio::test]
async fn test_record_measurement_requires_tecnico() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&json!({ "station_id": 2, "variable_type": "water_level", "value": 2.1 }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_record_measurement_invalid_variable_type() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;

    let response = server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&json!({ "station_id": 2, "variable_type": "Water Level!", "value": 2.1 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(common::error_code(&response.json::<Value>()), "validation_error");
}

#[tokio::test]
async fn test_record_measurement_queue_full() {
    let (state, _rx) = common::create_test_state(1);
    let server = common::create_test_server(state);
    let token = common::login(&server, common::TECNICO).await;
    let reading = json!({ "station_id": 1, "variable_type": "water_level", "value": 2.0 });

    server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&reading)
        .await
        .assert_status(StatusCode::ACCEPTED);

    let response = server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&reading)
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        common::error_code(&response.json::<Value>()),
        "service_unavailable"
    );
}

#[tokio::test]
async fn test_ingested_reading_updates_station_and_raises_alert() {
    let (server, _state) = common::setup_with_worker();
    let token = common::login(&server, common::TECNICO).await;

    server
        .post("/api/measurements")
        .authorization_bearer(&token)
        .json(&json!({ "station_id": 2, "variable_type": "water_level", "value": 3.8, "unit": "m" }))
        .await
        .assert_status(StatusCode::ACCEPTED);

    let mut station = Value::Null;
    for _ in 0..100 {
        station = server
            .get("/api/stations/2")
            .authorization_bearer(&token)
            .await
            .json::<Value>();
        if station["current_level"] == 3.8 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(station["current_level"], 3.8);

    let latest = server
        .get("/api/measurements/latest")
        .add_query_param("station_id", 2)
        .authorization_bearer(&token)
        .await
        .json::<Vec<Value>>();
    assert_eq!(latest[0]["value"], 3.8);
    assert_eq!(latest[0]["is_critical"], true);

    let alerts = server
        .get("/api/alerts")
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    let raised = alerts["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["station_id"] == 2)
        .cloned()
        .unwrap();
    assert_eq!(raised["severity"], "high");
    assert_eq!(raised["alert_type"], "emergency");
    assert_eq!(raised["threshold_value"], 3.5);
}
