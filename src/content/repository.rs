use crate::batch::BatchReport;
use crate::database::{ActivityColumn, Table};
use crate::error::{ApiError, SiteError};
use crate::postgrest::{ApiResult, RestClient};
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

/// CRUD for any content table, the way the dashboard's per-table dialogs use it.
pub struct ContentRepository<'a> {
    client: &'a RestClient,
    table: Table,
}

impl<'a> ContentRepository<'a> {
    pub fn new(client: &'a RestClient, table: Table) -> Self {
        Self { client, table }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Rows in presentation order, newest first for tables without one.
    pub async fn list(&self) -> ApiResult<Vec<Value>> {
        let query = self.client.from(self.table).select("*");
        let query = match self.table.order_column() {
            Some(column) => query.order(column, true),
            None => query.order("created_at", false),
        };
        query.fetch().await
    }

    pub async fn get(&self, id: &str) -> ApiResult<Option<Value>> {
        self.client.from(self.table).select("*").eq("id", id).fetch_one().await
    }

    pub async fn create(&self, row: Map<String, Value>) -> Result<Value, SiteError> {
        let row = stamp(row, true);
        let created = self.client.from(self.table).insert(&Value::Object(row)).await?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| SiteError::ValidationError(format!("Insert into {} returned no row", self.table)))
    }

    pub async fn update(&self, id: &str, patch: Map<String, Value>) -> ApiResult<Option<Value>> {
        let patch = stamp(patch, false);
        let updated = self
            .client
            .from(self.table)
            .eq("id", id)
            .update(&Value::Object(patch))
            .await?;
        Ok(updated.into_iter().next())
    }

    /// Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> ApiResult<bool> {
        let deleted = self.client.from(self.table).eq("id", id).delete().await?;
        let removed = !deleted.is_empty();
        if removed {
            info!("Deleted {} row {}", self.table, id);
        }
        Ok(removed)
    }

    /// Shows or hides a row on the site.
    pub async fn set_active(&self, id: &str, active: bool) -> Result<Option<Value>, SiteError> {
        let patch = activity_patch(self.table, active)?;
        Ok(self.update(id, patch).await?)
    }

    /// Writes the order column so that `ids[i]` gets position `i + 1`.
    /// One request per row; failures are recorded and the rest still run.
    pub async fn reorder(&self, ids: &[String]) -> Result<BatchReport<Value>, SiteError> {
        let column = self.table.order_column().ok_or_else(|| {
            SiteError::ValidationError(format!("{} has no order column", self.table))
        })?;

        let mut report = BatchReport::new(format!("reorder {}", self.table));
        for (position, id) in ids.iter().enumerate() {
            let mut patch = Map::new();
            patch.insert(column.to_string(), Value::from(position + 1));

            let result = self.update(id, patch).await.and_then(|row| {
                row.ok_or_else(|| ApiError::new(404, format!("no row with id {}", id)))
            });
            report.record(format!("{} → {}", id, position + 1), result);
        }
        Ok(report)
    }
}

fn stamp(mut row: Map<String, Value>, creating: bool) -> Map<String, Value> {
    let now = Value::from(Utc::now().to_rfc3339());
    if creating {
        row.entry("created_at").or_insert_with(|| now.clone());
    }
    row.insert("updated_at".to_string(), now);
    row
}

fn activity_patch(table: Table, active: bool) -> Result<Map<String, Value>, SiteError> {
    let mut patch = Map::new();
    match table.activity_column() {
        Some(ActivityColumn::IsActive) => {
            patch.insert("is_active".to_string(), Value::Bool(active));
        }
        Some(ActivityColumn::Status) => {
            let status = if active { "active" } else { "inactive" };
            patch.insert("status".to_string(), Value::from(status));
        }
        None => {
            return Err(SiteError::ValidationError(format!(
                "{} rows cannot be activated or deactivated",
                table
            )))
        }
    }
    Ok(patch)
}
