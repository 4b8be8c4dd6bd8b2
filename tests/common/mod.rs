#![allow(dead_code)]

use serde_json::{json, Value};
use site_admin::postgrest::RestClient;
use std::time::Duration;
use wiremock::MockServer;

pub const TEST_KEY: &str = "test-service-key";

/// REST client pointed at the mock server, as if it were `{SUPABASE_URL}/rest/v1`.
pub fn mock_client(server: &MockServer) -> RestClient {
    RestClient::with_key(&server.uri(), TEST_KEY, Duration::from_secs(5))
        .expect("Failed to build test client")
}

/// PostgREST error body.
pub fn postgrest_error(code: &str, message: &str) -> Value {
    json!({
        "code": code,
        "message": message,
        "details": null,
        "hint": null
    })
}

pub fn missing_table(table: &str) -> Value {
    postgrest_error("42P01", &format!("relation \"public.{}\" does not exist", table))
}

pub fn project_row(id: &str, slug: &str, featured: i32) -> Value {
    json!({
        "id": id,
        "slug": slug,
        "title": slug,
        "title_en": format!("{} (en)", slug),
        "title_id": format!("{} (id)", slug),
        "description_en": "A project",
        "description_id": "Sebuah proyek",
        "video_url": "https://www.youtube.com/embed/dQw4w9WgXcQ",
        "project_type": "web",
        "progress": 80,
        "status": "active",
        "featured": featured,
        "tech_stack": ["React", "Rust"],
        "features": null,
        "gallery": [],
        "sort_order": 1,
        "created_at": "2024-03-01T10:00:00Z",
        "updated_at": "2024-03-02T10:00:00Z"
    })
}
