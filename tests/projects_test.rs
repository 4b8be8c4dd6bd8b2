use serde_json::json;
use site_admin::projects::{
    map_project_from_database, map_project_to_database, ListInput, ProjectPatch, ProjectRecord,
    ProjectRepository,
};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::*;

const PROJECT_ID: &str = "33333333-3333-3333-3333-333333333333";

#[test]
fn test_mapping_round_trip_keeps_every_field() {
    let record: ProjectRecord = serde_json::from_value(project_row(PROJECT_ID, "company-site", 1)).unwrap();
    let project = map_project_from_database(Some(&record)).unwrap();

    let row = map_project_to_database(&project.to_patch());
    let stored: ProjectRecord = serde_json::from_value(serde_json::Value::Object(row)).unwrap();
    let again = map_project_from_database(Some(&stored)).unwrap();

    assert_eq!(again.slug, project.slug);
    assert_eq!(again.title_en, project.title_en);
    assert_eq!(again.title_id, project.title_id);
    assert_eq!(again.video_url, project.video_url);
    assert_eq!(again.progress, 80);
    assert_eq!(again.featured, 1);
    assert_eq!(again.tech_stack, vec!["React", "Rust"]);
    assert!(again.features.is_empty());
}

#[test]
fn test_text_lists_are_split() {
    let patch = ProjectPatch {
        tech_stack: Some(Some(ListInput::from(" React, ,Node.js ,Postgres"))),
        ..Default::default()
    };
    let row = map_project_to_database(&patch);

    assert_eq!(row.len(), 1);
    assert_eq!(row["tech_stack"], json!(["React", "Node.js", "Postgres"]));
}

#[tokio::test]
async fn test_list_falls_back_when_category_join_is_missing() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("select", "*,categories(name_en,name_id)"))
        .respond_with(ResponseTemplate::new(400).set_body_json(postgrest_error(
            "PGRST200",
            "Could not find a relationship between 'projects' and 'categories' in the schema cache",
        )))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("select", "*"))
        .and(query_param("order", "sort_order.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_row(PROJECT_ID, "company-site", 1),
            project_row("44444444-4444-4444-4444-444444444444", "mobile-shop", 0)
        ])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let repository = ProjectRepository::new(&client);

    let projects = repository.list().await.unwrap();
    assert_eq!(projects.len(), 2);
    assert!(projects[0].category_name.is_none());

    let featured = repository.featured().await.unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].slug, "company-site");
}

#[tokio::test]
async fn test_list_keeps_joined_category_names() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    let mut row = project_row(PROJECT_ID, "company-site", 0);
    row["categories"] = json!({"name_en": "Web Development", "name_id": "Pengembangan Web"});

    Mock::given(method("GET"))
        .and(path("/projects"))
        .and(query_param("select", "*,categories(name_en,name_id)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let projects = ProjectRepository::new(&client).list().await.unwrap();
    let category = projects[0].category_name.as_ref().unwrap();
    assert_eq!(category.name_id.as_deref(), Some("Pengembangan Web"));
}

#[tokio::test]
async fn test_other_list_errors_propagate() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("GET"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(postgrest_error("PGRST301", "JWT expired")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = ProjectRepository::new(&client).list().await.unwrap_err();
    assert_eq!(err.api_error().map(|e| e.status), Some(401));
}

#[tokio::test]
async fn test_update_writes_only_supplied_fields() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);
    let id = Uuid::parse_str(PROJECT_ID).unwrap();

    let mut returned = project_row(PROJECT_ID, "company-site", 1);
    returned["video_url"] = json!("https://www.youtube.com/embed/j8XdRefF7M8");

    Mock::given(method("PATCH"))
        .and(path("/projects"))
        .and(query_param("id", format!("eq.{}", PROJECT_ID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([returned])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let patch = ProjectPatch {
        video_url: Some(Some("https://youtu.be/j8XdRefF7M8".to_string())),
        ..Default::default()
    };
    let updated = ProjectRepository::new(&client).update(id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.video_url, "https://www.youtube.com/embed/j8XdRefF7M8");

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let mut keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["updated_at", "video_url"]);
    assert_eq!(body["video_url"], "https://www.youtube.com/embed/j8XdRefF7M8");
}

#[tokio::test]
async fn test_explicit_null_clears_stored_links() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);
    let id = Uuid::parse_str(PROJECT_ID).unwrap();

    let mut returned = project_row(PROJECT_ID, "company-site", 0);
    returned["video_url"] = json!(null);
    returned["category_id"] = json!(null);

    Mock::given(method("PATCH"))
        .and(path("/projects"))
        .and(query_param("id", format!("eq.{}", PROJECT_ID).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([returned])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let patch: ProjectPatch =
        serde_json::from_value(json!({"videoUrl": null, "categoryId": null})).unwrap();
    let updated = ProjectRepository::new(&client).update(id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.video_url, "");
    assert_eq!(updated.category_id, None);

    let requests = mock_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["video_url"], serde_json::Value::Null);
    assert_eq!(body["category_id"], serde_json::Value::Null);
    assert!(body.as_object().unwrap().contains_key("video_url"));
    assert!(!body.as_object().unwrap().contains_key("demo_url"));
}

#[tokio::test]
async fn test_invalid_progress_is_rejected_before_sending() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let patch = ProjectPatch {
        title_en: Some("Too far".to_string()),
        progress: Some(140),
        ..Default::default()
    };
    assert!(ProjectRepository::new(&client).create(&patch).await.is_err());
}

#[tokio::test]
async fn test_set_featured_on_unknown_project() {
    let mock_server = MockServer::start().await;
    let client = mock_client(&mock_server);

    Mock::given(method("PATCH"))
        .and(path("/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let result = ProjectRepository::new(&client)
        .set_featured(Uuid::new_v4(), true)
        .await
        .unwrap();
    assert!(result.is_none());
}
