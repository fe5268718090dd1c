mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::Value;

fn window() -> (String, String) {
    let today = Utc::now().date_naive();
    (
        (today - Duration::days(2)).to_string(),
        (today + Duration::days(1)).to_string(),
    )
}

#[tokio::test]
async fn test_daily_average_report() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;
    let (start, end) = window();

    let response = server
        .get("/api/reports/daily-average")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .add_query_param("station_id", 1)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    let items = body["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|r| r["station_id"] == 1));

    let readings: u64 = items
        .iter()
        .map(|r| r["measurement_count"].as_u64().unwrap())
        .sum();
    assert_eq!(readings, 24);
}

#[tokio::test]
async fn test_report_requires_dates() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .get("/api/reports/daily-average")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_daily_average_rejects_span_over_a_year() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;

    let response = server
        .get("/api/reports/daily-average")
        .add_query_param("start_date", "2024-01-01")
        .add_query_param("end_date", "2025-06-01")
        .authorization_bearer(&token)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_critical_events_empty_for_calm_rivers() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;
    let (start, end) = window();

    let body = server
        .get("/api/reports/critical-events")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_comparative_report_sorted_by_station_name() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;
    let (start, end) = window();

    let body = server
        .get("/api/reports/comparative")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await
        .json::<Value>();

    assert_eq!(body["total"], 3);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["station_name"].as_str().unwrap())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(body["items"].as_array().unwrap().iter().all(|r| r["measurement_count"] == 24));
}

#[tokio::test]
async fn test_export_csv() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;
    let (start, end) = window();

    let response = server
        .get("/api/reports/export")
        .add_query_param("type", "comparative")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    assert!(
        response
            .header("content-type")
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let disposition = response.header("content-disposition");
    let disposition = disposition.to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"reporte_"));
    assert!(disposition.ends_with(".csv\""));

    let text = response.text();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("Estación,"));
    assert_eq!(lines.count(), 3);
}

#[tokio::test]
async fn test_export_pdf() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;
    let (start, end) = window();

    let response = server
        .get("/api/reports/export")
        .add_query_param("type", "daily-average")
        .add_query_param("format", "pdf")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("content-type"), "application/pdf");
    let disposition = response.header("content-disposition");
    assert!(disposition.to_str().unwrap().ends_with(".pdf\""));
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_export_excel() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::TECNICO).await;
    let (start, end) = window();

    let response = server
        .get("/api/reports/export")
        .add_query_param("type", "comparative")
        .add_query_param("format", "excel")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("content-type"),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.header("content-disposition");
    assert!(disposition.to_str().unwrap().ends_with(".xlsx\""));
    assert!(response.as_bytes().starts_with(b"PK"));
}

#[tokio::test]
async fn test_export_requires_tecnico() {
    let (server, _rx) = common::setup();
    let token = common::login(&server, common::OBSERVADOR).await;
    let (start, end) = window();

    server
        .get("/api/reports/export")
        .add_query_param("type", "comparative")
        .add_query_param("start_date", &start)
        .add_query_param("end_date", &end)
        .authorization_bearer(&token)
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
