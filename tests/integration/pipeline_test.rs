//! Full report runs against SQLite.

use pretty_assertions::assert_eq;
use weather_report::config::Config;
use weather_report::db::{self, schema, DatabaseClient, SqliteClient};
use weather_report::pipeline::{EntryOutcome, ReportPipeline, RunSummary};
use weather_report::query::definitions;
use weather_report::report::ChartOutcome;

use super::seeded_sqlite;

async fn run_catalog(db: &dyn DatabaseClient) -> (RunSummary, String) {
    let mut pipeline = ReportPipeline::new(db, Vec::new());
    let summary = pipeline.run(definitions()).await.unwrap();
    let text = String::from_utf8(pipeline.into_inner()).unwrap();
    (summary, text)
}

fn rows(outcome: &EntryOutcome) -> usize {
    match outcome {
        EntryOutcome::Reported { rows, .. } => *rows,
        other => panic!("expected rows, got {other:?}"),
    }
}

fn chart(outcome: &EntryOutcome) -> Option<&ChartOutcome> {
    match outcome {
        EntryOutcome::Reported { chart, .. } => chart.as_ref(),
        _ => None,
    }
}

/// Header cells of the first table after `title`.
fn headers_after(text: &str, title: &str) -> Vec<String> {
    let start = text.find(&format!("Query: {title}")).unwrap();
    text[start..]
        .lines()
        .find(|line| line.starts_with('│'))
        .map(|line| {
            line.trim_matches('│')
                .split('│')
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_full_catalog_on_seeded_database() {
    let db = seeded_sqlite().await;

    let (summary, text) = run_catalog(&db).await;
    let outcomes: Vec<&EntryOutcome> = summary.entries.iter().map(|(_, o)| o).collect();

    assert_eq!(outcomes.len(), 9);
    assert_eq!(summary.failed(), 0, "{text}");

    assert_eq!(rows(outcomes[0]), 15);
    assert_eq!(chart(outcomes[0]), None);

    assert_eq!(rows(outcomes[1]), 15);
    assert!(chart(outcomes[1]).is_some_and(ChartOutcome::is_rendered));

    assert_eq!(rows(outcomes[2]), 15);
    assert_eq!(rows(outcomes[3]), 8);

    // 15C..=20C covers hours 10 through 15
    assert_eq!(rows(outcomes[4]), 6);
    assert!(chart(outcomes[4]).is_some_and(ChartOutcome::is_rendered));

    assert_eq!(rows(outcomes[5]), 15);
    assert!(chart(outcomes[5]).is_some_and(ChartOutcome::is_rendered));

    assert_eq!(rows(outcomes[6]), 1);
    assert_eq!(chart(outcomes[6]), Some(&ChartOutcome::InsufficientData));
    assert!(text.contains("Insufficient data for plotting."));

    assert_eq!(rows(outcomes[7]), 1);
    assert!(text.contains("│ 15        │"), "{text}");

    // rain, snow and NULL
    assert_eq!(rows(outcomes[8]), 3);

    assert_eq!(summary.charts_rendered(), 3);
}

#[tokio::test]
async fn test_first_entry_shows_every_column() {
    let db = seeded_sqlite().await;

    let (_, text) = run_catalog(&db).await;

    let expected: Vec<String> = schema::column_names().map(String::from).collect();
    assert_eq!(headers_after(&text, "Selecting top 15 records"), expected);
    assert_eq!(expected.len(), 12);
}

#[tokio::test]
async fn test_transcript_follows_catalog_order() {
    let db = seeded_sqlite().await;

    let (_, text) = run_catalog(&db).await;

    let positions: Vec<usize> = definitions()
        .iter()
        .map(|d| text.find(&format!("Query: {}\n", d.title)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    assert_eq!(text.matches(&"-".repeat(50)).count(), 9);
}

#[tokio::test]
async fn test_missing_table_fails_every_entry_independently() {
    let db = SqliteClient::in_memory().await.unwrap();

    let (summary, text) = run_catalog(&db).await;

    assert_eq!(summary.entries.len(), 9);
    assert_eq!(summary.failed(), 9);
    assert_eq!(text.matches("Error executing query:").count(), 9);
    assert!(text.contains("no such table"));
    for def in definitions() {
        assert!(text.contains(&format!("Query: {}", def.title)));
    }
}

#[tokio::test]
async fn test_empty_table_reports_no_records() {
    let db = SqliteClient::in_memory().await.unwrap();
    db::ensure_schema(&db).await.unwrap();

    let (summary, text) = run_catalog(&db).await;

    assert_eq!(summary.failed(), 0, "{text}");
    // Plain aggregates over an empty table still return one row.
    let empty: Vec<usize> = summary
        .entries
        .iter()
        .enumerate()
        .filter(|(_, (_, o))| *o == EntryOutcome::Empty)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(empty, vec![0, 1, 2, 3, 4, 5, 8]);
    assert_eq!(text.matches("No records found.").count(), 7);
    assert_eq!(summary.charts_rendered(), 0);
    assert!(text.contains("Insufficient data for plotting."));
}

#[tokio::test]
async fn test_runs_from_environment_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weather.db");
    let path_str = path.to_string_lossy().into_owned();

    let config = Config::from_lookup(|key| match key {
        "DB_BACKEND" => Some("sqlite".to_string()),
        "DB_DATABASE" => Some(path_str.clone()),
        "WEATHER_API_TOKEN" => Some("unused".to_string()),
        _ => None,
    })
    .unwrap();

    let client = db::connect(&config.database).await.unwrap();
    db::ensure_schema(client.as_ref()).await.unwrap();
    client
        .insert_observations(&[super::observation(9, 16.5)])
        .await
        .unwrap();

    let (summary, text) = run_catalog(client.as_ref()).await;
    client.close().await.unwrap();

    assert_eq!(summary.failed(), 0, "{text}");
    assert!(text.contains("16.5"));
    assert!(path.exists());
}
