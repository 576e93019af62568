//! PostgreSQL round trip.
//!
//! Skipped unless DATABASE_URL points at a scratch database.

use sqlx::postgres::PgPoolOptions;
use weather_report::db::{ensure_schema, DatabaseClient, PostgresClient};
use weather_report::pipeline::ReportPipeline;
use weather_report::query::definitions;

/// Helper to create a test client.
async fn get_test_client() -> Option<PostgresClient> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .ok()?;
    Some(PostgresClient::from_pool(pool))
}

#[tokio::test]
async fn test_catalog_runs_on_postgres() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    ensure_schema(&client).await.unwrap();
    client
        .insert_observations(&[super::observation(4, 15.5)])
        .await
        .unwrap();

    let mut pipeline = ReportPipeline::new(&client, Vec::new());
    let summary = pipeline.run(definitions()).await.unwrap();
    let text = String::from_utf8(pipeline.into_inner()).unwrap();

    assert_eq!(summary.failed(), 0, "{text}");
    assert!(text.contains("Temperature (C)"));

    client
        .execute_statement("DELETE FROM weather_history WHERE \"Formatted Date\" = '2006-04-01 04:00:00'")
        .await
        .unwrap();
    client.close().await.unwrap();
}
