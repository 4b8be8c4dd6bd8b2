//! Translation between the stored project row (snake_case columns) and the
//! shape the admin dashboard and site work with (camelCase).

use crate::error::SiteError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_STATUS: &str = "active";

/// A project row as stored. List columns are JSONB and may be `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: Option<Uuid>,
    pub slug: Option<String>,
    pub title: Option<String>,
    pub title_en: Option<String>,
    pub title_id: Option<String>,
    pub description: Option<String>,
    pub description_en: Option<String>,
    pub description_id: Option<String>,
    pub category: Option<String>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub demo_url: Option<String>,
    pub github_url: Option<String>,
    pub client: Option<String>,
    pub project_type: Option<String>,
    pub progress: Option<i32>,
    pub status: Option<String>,
    pub featured: Option<i32>,
    pub tech_stack: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub gallery: Option<Vec<String>>,
    pub sort_order: Option<i32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Embedded `categories(name_en, name_id)` when the list query joins it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CategoryName>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryName {
    pub name_en: Option<String>,
    pub name_id: Option<String>,
}

/// Fully populated project as the application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Option<Uuid>,
    pub slug: String,
    pub title: String,
    pub title_en: String,
    pub title_id: String,
    pub description: String,
    pub description_en: String,
    pub description_id: String,
    pub category: String,
    pub category_id: Option<Uuid>,
    pub category_name: Option<CategoryName>,
    pub image_url: String,
    pub video_url: String,
    pub demo_url: String,
    pub github_url: String,
    pub client: String,
    pub project_type: String,
    pub progress: i32,
    pub status: String,
    pub featured: i32,
    pub tech_stack: Vec<String>,
    pub features: Vec<String>,
    pub gallery: Vec<String>,
    pub sort_order: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// List field input: the dashboard sends either `"React, Node"` or `["React", "Node"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListInput {
    Text(String),
    Items(Vec<String>),
}

impl ListInput {
    /// Trimmed, non-empty entries.
    pub fn normalize(&self) -> Vec<String> {
        let items: Box<dyn Iterator<Item = &str> + '_> = match self {
            ListInput::Text(text) => Box::new(text.split(',')),
            ListInput::Items(items) => Box::new(items.iter().map(String::as_str)),
        };
        items
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl From<Vec<String>> for ListInput {
    fn from(items: Vec<String>) -> Self {
        ListInput::Items(items)
    }
}

impl From<&str> for ListInput {
    fn from(text: &str) -> Self {
        ListInput::Text(text.to_string())
    }
}

/// Partial project in application shape. `None` means "not supplied" and
/// the column is left alone. Clearable columns are `Option<Option<_>>`:
/// `Some(None)` comes from an explicit `null` and clears the column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub title_en: Option<String>,
    pub title_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description_en: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub description_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub video_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub demo_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub github_url: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub client: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub project_type: Option<Option<String>>,
    pub progress: Option<i32>,
    pub status: Option<String>,
    pub featured: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub tech_stack: Option<Option<ListInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub features: Option<Option<ListInput>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub gallery: Option<Option<ListInput>>,
    pub sort_order: Option<i32>,
}

/// Values accepted by the `project_type` CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Web,
    Mobile,
    Desktop,
    Api,
    Other,
}

impl ProjectType {
    pub const ALL: [ProjectType; 5] = [
        ProjectType::Web,
        ProjectType::Mobile,
        ProjectType::Desktop,
        ProjectType::Api,
        ProjectType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Mobile => "mobile",
            ProjectType::Desktop => "desktop",
            ProjectType::Api => "api",
            ProjectType::Other => "other",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SiteError::ValidationError(format!("Invalid project type: {}", s)))
    }
}

impl ProjectPatch {
    /// Checks the values the database would reject with a CHECK violation.
    pub fn validate(&self) -> Result<(), SiteError> {
        if let Some(Some(project_type)) = &self.project_type {
            project_type.parse::<ProjectType>()?;
        }
        if let Some(progress) = self.progress {
            if !(0..=100).contains(&progress) {
                return Err(SiteError::ValidationError(format!(
                    "Progress must be between 0 and 100, got {}",
                    progress
                )));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == ProjectPatch::default()
    }
}

/// Maps only the supplied fields to their column names.
pub fn map_project_to_database(patch: &ProjectPatch) -> Map<String, Value> {
    let mut row = Map::new();

    put(&mut row, "slug", &patch.slug);
    put(&mut row, "title", &patch.title);
    put(&mut row, "title_en", &patch.title_en);
    put(&mut row, "title_id", &patch.title_id);
    put_nullable(&mut row, "description", &patch.description);
    put_nullable(&mut row, "description_en", &patch.description_en);
    put_nullable(&mut row, "description_id", &patch.description_id);
    put_nullable(&mut row, "category", &patch.category);
    put_nullable(
        &mut row,
        "category_id",
        &patch.category_id.map(|id| id.map(|id| id.to_string())),
    );
    put_nullable(&mut row, "image_url", &patch.image_url);
    put_nullable(&mut row, "video_url", &patch.video_url);
    put_nullable(&mut row, "demo_url", &patch.demo_url);
    put_nullable(&mut row, "github_url", &patch.github_url);
    put_nullable(&mut row, "client", &patch.client);
    put_nullable(&mut row, "project_type", &patch.project_type);
    put(&mut row, "progress", &patch.progress);
    put(&mut row, "status", &patch.status);
    put(&mut row, "featured", &patch.featured);
    put(&mut row, "sort_order", &patch.sort_order);

    for (column, list) in [
        ("tech_stack", &patch.tech_stack),
        ("features", &patch.features),
        ("gallery", &patch.gallery),
    ] {
        let normalized = list
            .as_ref()
            .map(|list| list.as_ref().map(ListInput::normalize));
        put_nullable(&mut row, column, &normalized);
    }

    row
}

/// Total mapping from a stored row; `None` in, `None` out.
pub fn map_project_from_database(record: Option<&ProjectRecord>) -> Option<Project> {
    let record = record?;
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    Some(Project {
        id: record.id,
        slug: text(&record.slug),
        title: text(&record.title),
        title_en: text(&record.title_en),
        title_id: text(&record.title_id),
        description: text(&record.description),
        description_en: text(&record.description_en),
        description_id: text(&record.description_id),
        category: text(&record.category),
        category_id: record.category_id,
        category_name: record.categories.clone(),
        image_url: text(&record.image_url),
        video_url: text(&record.video_url),
        demo_url: text(&record.demo_url),
        github_url: text(&record.github_url),
        client: text(&record.client),
        project_type: text(&record.project_type),
        progress: record.progress.unwrap_or(0),
        status: record
            .status
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
        featured: record.featured.unwrap_or(0),
        tech_stack: record.tech_stack.clone().unwrap_or_default(),
        features: record.features.clone().unwrap_or_default(),
        gallery: record.gallery.clone().unwrap_or_default(),
        sort_order: record.sort_order.unwrap_or(0),
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

impl Project {
    /// Every mappable field as a patch.
    pub fn to_patch(&self) -> ProjectPatch {
        ProjectPatch {
            slug: Some(self.slug.clone()),
            title: Some(self.title.clone()),
            title_en: Some(self.title_en.clone()),
            title_id: Some(self.title_id.clone()),
            description: Some(Some(self.description.clone())),
            description_en: Some(Some(self.description_en.clone())),
            description_id: Some(Some(self.description_id.clone())),
            category: Some(Some(self.category.clone())),
            category_id: Some(self.category_id),
            image_url: Some(Some(self.image_url.clone())),
            video_url: Some(Some(self.video_url.clone())),
            demo_url: Some(Some(self.demo_url.clone())),
            github_url: Some(Some(self.github_url.clone())),
            client: Some(Some(self.client.clone())),
            project_type: Some(Some(self.project_type.clone())),
            progress: Some(self.progress),
            status: Some(self.status.clone()),
            featured: Some(self.featured),
            tech_stack: Some(Some(ListInput::Items(self.tech_stack.clone()))),
            features: Some(Some(ListInput::Items(self.features.clone()))),
            gallery: Some(Some(ListInput::Items(self.gallery.clone()))),
            sort_order: Some(self.sort_order),
        }
    }

    pub fn is_featured(&self) -> bool {
        self.featured != 0
    }
}

fn put<T: Clone + Into<Value>>(row: &mut Map<String, Value>, column: &str, value: &Option<T>) {
    if let Some(value) = value {
        row.insert(column.to_string(), value.clone().into());
    }
}

/// `Some(None)` is written as `null` so the column is cleared.
fn put_nullable<T: Clone + Into<Value>>(
    row: &mut Map<String, Value>,
    column: &str,
    value: &Option<Option<T>>,
) {
    if let Some(value) = value {
        let value = value.clone().map(Into::into).unwrap_or(Value::Null);
        row.insert(column.to_string(), value);
    }
}
