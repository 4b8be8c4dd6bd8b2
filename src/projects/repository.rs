use crate::database::models::Category;
use crate::database::Table;
use crate::error::SiteError;
use crate::media::youtube;
use crate::postgrest::RestClient;
use crate::projects::mapper::{
    map_project_from_database, map_project_to_database, Project, ProjectPatch, ProjectRecord,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

const JOINED_SELECT: &str = "*, categories(name_en, name_id)";

/// Project reads and writes in application shape.
pub struct ProjectRepository<'a> {
    client: &'a RestClient,
}

impl<'a> ProjectRepository<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// All projects by `sort_order`, with category names when the join is
    /// available. Falls back to plain rows if the relationship is missing.
    pub async fn list(&self) -> Result<Vec<Project>, SiteError> {
        let joined = self
            .client
            .from(Table::Projects)
            .select(JOINED_SELECT)
            .order("sort_order", true)
            .fetch_as::<ProjectRecord>()
            .await;

        let records = match joined {
            Ok(records) => records,
            Err(err) if err.is_missing_relation() || err.is_missing_column() => {
                warn!("⚠️ Category join unavailable, listing projects without it: {}", err);
                self.client
                    .from(Table::Projects)
                    .select("*")
                    .order("sort_order", true)
                    .fetch_as::<ProjectRecord>()
                    .await?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(records
            .iter()
            .filter_map(|record| map_project_from_database(Some(record)))
            .collect())
    }

    pub async fn featured(&self) -> Result<Vec<Project>, SiteError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(Project::is_featured)
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Project>, SiteError> {
        let row = self
            .client
            .from(Table::Projects)
            .select("*")
            .eq("id", id)
            .fetch_one()
            .await?;
        Ok(map_project_from_database(parse_record(row)?.as_ref()))
    }

    pub async fn create(&self, patch: &ProjectPatch) -> Result<Project, SiteError> {
        patch.validate()?;
        let mut row = map_project_to_database(&normalize_media(patch));
        let now = Value::from(Utc::now().to_rfc3339());
        row.entry("created_at").or_insert_with(|| now.clone());
        row.entry("updated_at").or_insert(now);

        let created = self.client.from(Table::Projects).insert(&Value::Object(row)).await?;
        let project = first_project(created)?
            .ok_or_else(|| SiteError::ValidationError("Insert returned no project".to_string()))?;
        info!("✅ Created project {}", project.title_en);
        Ok(project)
    }

    /// Writes only the supplied fields and stamps `updated_at`.
    pub async fn update(&self, id: Uuid, patch: &ProjectPatch) -> Result<Option<Project>, SiteError> {
        patch.validate()?;
        if patch.is_empty() {
            return self.get(id).await;
        }

        let mut row = map_project_to_database(&normalize_media(patch));
        row.insert("updated_at".to_string(), Value::from(Utc::now().to_rfc3339()));

        let updated = self
            .client
            .from(Table::Projects)
            .eq("id", id)
            .update(&Value::Object(row))
            .await?;
        first_project(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, SiteError> {
        let deleted = self.client.from(Table::Projects).eq("id", id).delete().await?;
        Ok(!deleted.is_empty())
    }

    pub async fn set_featured(&self, id: Uuid, featured: bool) -> Result<Option<Project>, SiteError> {
        let patch = ProjectPatch {
            featured: Some(i32::from(featured)),
            ..Default::default()
        };
        self.update(id, &patch).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, SiteError> {
        Ok(self
            .client
            .from(Table::Categories)
            .select("*")
            .order("sort_order", true)
            .fetch_as::<Category>()
            .await?)
    }
}

/// Video links are stored in embeddable form.
fn normalize_media(patch: &ProjectPatch) -> ProjectPatch {
    let mut patch = patch.clone();
    if let Some(Some(video_url)) = &patch.video_url {
        patch.video_url = Some(Some(youtube::to_embed_url(video_url.trim())));
    }
    patch
}

fn parse_record(row: Option<Value>) -> Result<Option<ProjectRecord>, SiteError> {
    row.map(serde_json::from_value).transpose().map_err(SiteError::from)
}

fn first_project(rows: Vec<Value>) -> Result<Option<Project>, SiteError> {
    let record = parse_record(rows.into_iter().next())?;
    Ok(map_project_from_database(record.as_ref()))
}
