use crate::database::models::{Setting, Technology, TechnologyCategory};
use crate::database::Table;
use crate::error::SiteError;
use crate::postgrest::{ApiResult, RestClient};
use chrono::Utc;
use serde_json::{json, Value};

/// Technologies grouped under their category, as the tech-stack section shows them.
#[derive(Debug, Clone)]
pub struct TechnologyGroup {
    pub category: TechnologyCategory,
    pub technologies: Vec<Technology>,
}

/// Active categories in `sort_order`, each with its active technologies.
/// Technologies whose category is missing or inactive are left out.
pub async fn load_technology_catalog(client: &RestClient) -> ApiResult<Vec<TechnologyGroup>> {
    let categories = client
        .from(Table::TechnologyCategories)
        .select("*")
        .eq("is_active", true)
        .order("sort_order", true)
        .fetch_as::<TechnologyCategory>()
        .await?;

    let technologies = client
        .from(Table::Technologies)
        .select("*")
        .eq("is_active", true)
        .order("sort_order", true)
        .fetch_as::<Technology>()
        .await?;

    Ok(group_technologies(categories, technologies))
}

pub fn group_technologies(
    categories: Vec<TechnologyCategory>,
    technologies: Vec<Technology>,
) -> Vec<TechnologyGroup> {
    let mut groups: Vec<TechnologyGroup> = categories
        .into_iter()
        .map(|category| TechnologyGroup {
            category,
            technologies: Vec::new(),
        })
        .collect();

    for technology in technologies {
        let Some(category_id) = technology.category_id else {
            continue;
        };
        if let Some(group) = groups.iter_mut().find(|g| g.category.id == category_id) {
            group.technologies.push(technology);
        }
    }

    groups
}

/// Key/value site settings (contact email, social links, hero copy ...).
pub struct SettingsStore<'a> {
    client: &'a RestClient,
}

impl<'a> SettingsStore<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    pub async fn all(&self) -> ApiResult<Vec<Setting>> {
        self.client
            .from(Table::Settings)
            .select("*")
            .order("key", true)
            .fetch_as::<Setting>()
            .await
    }

    pub async fn get(&self, key: &str) -> ApiResult<Option<Setting>> {
        Ok(self
            .client
            .from(Table::Settings)
            .select("*")
            .eq("key", key)
            .limit(1)
            .fetch_as::<Setting>()
            .await?
            .into_iter()
            .next())
    }

    /// Creates or replaces one setting, keyed on `key`.
    pub async fn set(&self, key: &str, value: Value) -> Result<Setting, SiteError> {
        let row = json!({
            "key": key,
            "value": value,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let saved = self.client.from(Table::Settings).upsert(&row, "key").await?;
        let first = saved
            .into_iter()
            .next()
            .ok_or_else(|| SiteError::ValidationError(format!("Saving setting {} returned no row", key)))?;
        Ok(serde_json::from_value(first)?)
    }
}
