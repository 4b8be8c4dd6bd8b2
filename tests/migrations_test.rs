use serde_json::json;
use site_admin::migrations::{probe_tables, MigrationTarget, Migrator, EXEC_SQL_FUNCTION};
use site_admin::database::Table;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

#[tokio::test]
async fn test_rpc_applies_every_migration_in_order() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("POST"))
        .and(path(format!("/rpc/{}", EXEC_SQL_FUNCTION)))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&mock_server)
        .await;

    let report = Migrator::new().apply(MigrationTarget::Rpc(&client)).await;

    assert!(report.is_clean());
    let labels: Vec<&str> = report.outcomes().iter().map(|o| o.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["001_content_schema", "002_project_media", "003_updated_at_triggers"]
    );
}

#[tokio::test]
async fn test_missing_exec_sql_skips_remaining_migrations() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/rpc/exec_sql"))
        .respond_with(ResponseTemplate::new(404).set_body_json(postgrest_error(
            "PGRST202",
            "Could not find the function public.exec_sql(sql) in the schema cache",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = Migrator::new().apply(MigrationTarget::Rpc(&client)).await;

    assert_eq!(report.len(), 3);
    assert_eq!(report.skipped(), 3);
    assert_eq!(report.failed(), 0);
}

#[tokio::test]
async fn test_failed_migration_does_not_stop_later_ones() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("POST"))
        .and(path("/rpc/exec_sql"))
        .respond_with(ResponseTemplate::new(400).set_body_json(postgrest_error(
            "42601",
            "syntax error at or near \"CREAT\"",
        )))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rpc/exec_sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(null)))
        .mount(&mock_server)
        .await;

    let report = Migrator::new().apply(MigrationTarget::Rpc(&client)).await;

    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.outcomes()[0].glyph(), "❌");
}

#[tokio::test]
async fn test_probe_reports_missing_tables_as_skipped() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("GET"))
        .and(path("/analytics"))
        .respond_with(ResponseTemplate::new(404).set_body_json(postgrest_error(
            "PGRST205",
            "Could not find the table 'public.analytics' in the schema cache",
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let report = probe_tables(&client).await;

    assert_eq!(report.len(), Table::ALL.len());
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);
    let analytics = report.outcomes().iter().find(|o| o.label == "analytics").unwrap();
    assert_eq!(analytics.glyph(), "⚠️");
}
