//! Ingestion against a local stand-in for the weather API.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use weather_report::config::WeatherConfig;
use weather_report::db::{ensure_schema, DatabaseClient, MockDatabaseClient, SqliteClient, Value};
use weather_report::error::ReportError;
use weather_report::pipeline::run_report;
use weather_report::weather::{ingest_current, WeatherClient};

const PAYLOAD: &str = r#"{
    "weather": [{"id": 803, "main": "Clouds", "description": "broken clouds"}],
    "main": {"temp": 17.2, "feels_like": 16.9, "pressure": 1018, "humidity": 64},
    "visibility": 10000,
    "wind": {"speed": 2.5, "deg": 190},
    "clouds": {"all": 75},
    "dt": 1143853200,
    "name": "New York"
}"#;

/// Answers a single request with `status_line` and `body`.
async fn serve_once(status_line: &'static str, body: &'static str) -> WeatherConfig {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    WeatherConfig {
        api_token: "test-token".to_string(),
        city: "New York".to_string(),
        api_url: format!("http://{addr}/data/2.5/weather"),
    }
}

#[tokio::test]
async fn test_ingest_inserts_one_observation() {
    let config = serve_once("200 OK", PAYLOAD).await;
    let client = WeatherClient::new(&config).unwrap();
    let db = MockDatabaseClient::new();

    let inserted = ingest_current(&db, &client, &config.city).await.unwrap();

    assert_eq!(inserted, 1);
    let rows = db.inserted();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].summary.as_deref(), Some("Clouds"));
    assert_eq!(rows[0].temperature_c, Some(17.2));
    assert_eq!(rows[0].visibility_km, Some(10.0));
}

#[tokio::test]
async fn test_ingested_row_is_queryable() {
    let config = serve_once("200 OK", PAYLOAD).await;
    let client = WeatherClient::new(&config).unwrap();
    let db = SqliteClient::in_memory().await.unwrap();
    ensure_schema(&db).await.unwrap();

    ingest_current(&db, &client, &config.city).await.unwrap();

    let result = db
        .execute_query(
            "SELECT \"Formatted Date\", \"Daily Summary\", \"Humidity\" FROM weather_history",
        )
        .await
        .unwrap();
    assert_eq!(result.row_count(), 1);
    assert_eq!(
        result.rows[0][0].to_display_string(),
        "2006-04-01 01:00:00"
    );
    assert_eq!(result.rows[0][1], Value::from("broken clouds"));
    assert_eq!(result.rows[0][2], Value::Float(0.64));
}

#[tokio::test]
async fn test_failed_fetch_inserts_nothing() {
    let config = serve_once(
        "500 Internal Server Error",
        r#"{"cod": 500, "message": "Internal error"}"#,
    )
    .await;
    let client = WeatherClient::new(&config).unwrap();
    let db = MockDatabaseClient::new();

    let err = ingest_current(&db, &client, &config.city).await.unwrap_err();

    assert!(matches!(err, ReportError::Fetch(_)));
    assert!(err.to_string().contains("500"), "{err}");
    assert!(db.inserted().is_empty());
}

#[tokio::test]
async fn test_report_on_fresh_database() {
    let config = serve_once("200 OK", PAYLOAD).await;
    let db = SqliteClient::in_memory().await.unwrap();
    let mut out = Vec::new();

    let summary = run_report(&db, &config, &mut out, (80, 20)).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.starts_with("Table created successfully.\n"), "{text}");
    assert!(!text.contains("Failed to fetch weather data"), "{text}");
    assert!(text.contains("broken clouds"), "{text}");
    assert!(text.contains("│ 2006-04-01 01:00:00 │ 17.2 "), "{text}");
    assert_eq!(summary.entries.len(), 9);
    assert_eq!(summary.failed(), 0, "{text}");
}
