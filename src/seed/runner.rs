use crate::batch::BatchReport;
use crate::database::{ParentRef, Table};
use crate::postgrest::{ApiResult, RestClient};
use crate::seed::dataset::{SeedDataset, SeedMode, TableSeed};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

/// Writes seed rows one request at a time, in parent-before-child order.
///
/// Nothing is rolled back: a failed row is recorded and the run moves on,
/// so a partial run leaves whatever already succeeded in place.
pub struct SeedRunner<'a> {
    client: &'a RestClient,
}

impl<'a> SeedRunner<'a> {
    pub fn new(client: &'a RestClient) -> Self {
        Self { client }
    }

    /// Seeds every table in the dataset, or just `only`.
    pub async fn run(&self, dataset: &SeedDataset, only: Option<Table>) -> BatchReport<Value> {
        let mut report = BatchReport::new("seed");

        for table in dataset.tables() {
            if only.is_some_and(|wanted| wanted != table) {
                continue;
            }
            let Some(seed) = dataset.table(table) else {
                continue;
            };

            info!("Seeding {} ({} rows)", table, seed.rows.len());
            self.seed_table(table, seed, &mut report).await;
        }

        report.log_summary();
        report
    }

    async fn seed_table(&self, table: Table, seed: &TableSeed, report: &mut BatchReport<Value>) {
        let references = match table.parent() {
            Some(parent) if seed.rows.iter().any(|row| row.contains_key(parent.seed_key)) => {
                match self.reference_map(parent).await {
                    Ok(map) => Some((parent, map)),
                    Err(err) => {
                        report.record(
                            format!("{} (resolving {})", table, parent.parent),
                            Err::<Value, _>(err),
                        );
                        return;
                    }
                }
            }
            _ => None,
        };

        for (index, row) in seed.rows.iter().enumerate() {
            let label = row_label(table, index, row);

            let row = match &references {
                Some((parent, map)) => match resolve_reference(row, parent, map) {
                    Ok(row) => row,
                    Err(reason) => {
                        report.push_skipped(label, reason);
                        continue;
                    }
                },
                None => row.clone(),
            };
            let row = stamp(row, seed.mode);

            match self.write_row(table, seed.mode, &row).await {
                Ok(written) => {
                    report.push_ok(label, written.into_iter().next().unwrap_or(Value::Object(row)))
                }
                Err(err) if err.is_missing_relation() => {
                    let remaining = seed.rows.len() - index;
                    report.push_skipped(
                        table.name(),
                        format!("table does not exist, {} rows not seeded", remaining),
                    );
                    return;
                }
                Err(err) if err.is_conflict() && seed.mode == SeedMode::Insert => {
                    report.push_skipped(label, "already exists");
                }
                Err(err) => report.record(label, Err(err)),
            }
        }
    }

    async fn write_row(&self, table: Table, mode: SeedMode, row: &Map<String, Value>) -> ApiResult<Vec<Value>> {
        let query = self.client.from(table);
        match (mode, table.conflict_key()) {
            (SeedMode::Upsert, Some(key)) => query.upsert(&[row], key).await,
            _ => query.insert(&[row]).await,
        }
    }

    /// Maps the parent's lookup column to its id, e.g. `Frontend` → uuid.
    async fn reference_map(&self, parent: ParentRef) -> ApiResult<HashMap<String, Value>> {
        let rows = self
            .client
            .from(parent.parent)
            .select(&format!("id,{}", parent.lookup_column))
            .fetch()
            .await?;

        let map: HashMap<String, Value> = rows
            .into_iter()
            .filter_map(|row| {
                let key = row.get(parent.lookup_column).map(text)?;
                let id = row.get("id")?.clone();
                Some((key, id))
            })
            .collect();

        debug!("Resolved {} {} rows by {}", map.len(), parent.parent, parent.lookup_column);
        Ok(map)
    }

    /// Row counts for the given tables. Missing tables are reported as skipped.
    pub async fn verify(&self, tables: &[Table]) -> BatchReport<u64> {
        let mut report = BatchReport::new("verify");
        for table in tables {
            match self.client.from(*table).count().await {
                Ok(count) => report.push_ok(format!("{}: {} rows", table, count), count),
                Err(err) => report.record(table.name(), Err(err)),
            }
        }
        report
    }
}

/// Replaces `category: Frontend` with `category_id: <id>`.
fn resolve_reference(
    row: &Map<String, Value>,
    parent: &ParentRef,
    ids: &HashMap<String, Value>,
) -> Result<Map<String, Value>, String> {
    let mut row = row.clone();
    let Some(reference) = row.remove(parent.seed_key) else {
        return Ok(row);
    };

    let key = text(&reference);
    match ids.get(&key) {
        Some(id) => {
            row.insert(parent.fk_column.to_string(), id.clone());
            Ok(row)
        }
        None => Err(format!("unknown {} '{}'", parent.parent, key)),
    }
}

fn stamp(mut row: Map<String, Value>, mode: SeedMode) -> Map<String, Value> {
    let now = Value::from(Utc::now().to_rfc3339());
    if mode == SeedMode::Insert {
        row.entry("created_at").or_insert_with(|| now.clone());
    }
    row.entry("updated_at").or_insert(now);
    row
}

fn row_label(table: Table, index: usize, row: &Map<String, Value>) -> String {
    table
        .conflict_key()
        .and_then(|key| row.get(key))
        .map(|value| format!("{} {}", table, text(value)))
        .unwrap_or_else(|| format!("{} #{}", table, index + 1))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
