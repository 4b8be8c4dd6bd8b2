//! Schema migrations.
//!
//! SQL scripts are compiled into the binary and applied in version order,
//! either over a direct Postgres connection or through an `exec_sql` RPC
//! function on the REST endpoint when only API keys are available.

use crate::batch::BatchReport;
use crate::database::{Database, Table};
use crate::postgrest::RestClient;
use serde_json::json;
use tracing::{info, warn};

pub const EXEC_SQL_FUNCTION: &str = "exec_sql";

/// Install once in the SQL editor to let the REST path run migrations.
pub const EXEC_SQL_BOOTSTRAP: &str = "CREATE OR REPLACE FUNCTION exec_sql(sql TEXT) RETURNS VOID \
LANGUAGE plpgsql SECURITY DEFINER AS $$ BEGIN EXECUTE sql; END; $$;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

impl Migration {
    pub fn label(&self) -> String {
        format!("{:03}_{}", self.version, self.name)
    }
}

const EMBEDDED: [Migration; 3] = [
    Migration {
        version: 1,
        name: "content_schema",
        sql: include_str!("../migrations/001_content_schema.sql"),
    },
    Migration {
        version: 2,
        name: "project_media",
        sql: include_str!("../migrations/002_project_media.sql"),
    },
    Migration {
        version: 3,
        name: "updated_at_triggers",
        sql: include_str!("../migrations/003_updated_at_triggers.sql"),
    },
];

/// Where migrations are executed.
pub enum MigrationTarget<'a> {
    Direct(&'a Database),
    Rpc(&'a RestClient),
}

pub struct Migrator {
    migrations: Vec<Migration>,
}

impl Migrator {
    pub fn new() -> Self {
        Self::with_migrations(EMBEDDED.to_vec())
    }

    pub fn with_migrations(mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|m| m.version);
        Self { migrations }
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    /// Applies every migration in order. A failed migration is recorded and
    /// the next one is still attempted.
    pub async fn apply(&self, target: MigrationTarget<'_>) -> BatchReport<String> {
        match target {
            MigrationTarget::Direct(database) => self.apply_direct(database).await,
            MigrationTarget::Rpc(client) => self.apply_via_rpc(client).await,
        }
    }

    async fn apply_direct(&self, database: &Database) -> BatchReport<String> {
        let mut report = BatchReport::new("migrations");
        for migration in &self.migrations {
            let label = migration.label();
            info!("Applying migration {} over direct connection", label);
            match database.execute_script(migration.sql).await {
                Ok(()) => report.push_ok(label.clone(), label),
                Err(e) => report.push_failed(label, e.to_string()),
            }
        }
        report
    }

    async fn apply_via_rpc(&self, client: &RestClient) -> BatchReport<String> {
        let mut report = BatchReport::new("migrations");
        let mut pending = self.migrations.iter();

        while let Some(migration) = pending.next() {
            let label = migration.label();
            info!("Applying migration {} via {}()", label, EXEC_SQL_FUNCTION);

            match client.rpc(EXEC_SQL_FUNCTION, &json!({ "sql": migration.sql })).await {
                Ok(_) => report.push_ok(label.clone(), label),
                Err(err) if err.is_missing_function() => {
                    warn!(
                        "{}() is not installed; run the migration files in the SQL editor or install it with:\n{}",
                        EXEC_SQL_FUNCTION, EXEC_SQL_BOOTSTRAP
                    );
                    let reason = format!("{}() not available, run manually", EXEC_SQL_FUNCTION);
                    report.push_skipped(label, reason.clone());
                    for rest in pending.by_ref() {
                        report.push_skipped(rest.label(), reason.clone());
                    }
                }
                Err(err) => report.push_failed(label, err.to_string()),
            }
        }
        report
    }
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads one row from each table. Missing tables come back as skipped.
pub async fn probe_tables(client: &RestClient) -> BatchReport<Table> {
    let mut report = BatchReport::new("schema probe");
    for table in Table::ALL {
        match client.from(table).select("*").limit(1).fetch().await {
            Ok(_) => report.push_ok(table.name(), table),
            Err(err) if err.is_missing_relation() => {
                report.push_skipped(table.name(), "table does not exist")
            }
            Err(err) => report.push_failed(table.name(), err.to_string()),
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_order() {
        let migrator = Migrator::new();
        let versions: Vec<u32> = migrator.migrations().iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
        assert_eq!(migrator.migrations()[0].label(), "001_content_schema");
    }

    #[test]
    fn test_sorted_on_construction() {
        let migrator = Migrator::with_migrations(vec![EMBEDDED[2], EMBEDDED[0], EMBEDDED[1]]);
        assert_eq!(migrator.migrations()[0].version, 1);
        assert_eq!(migrator.migrations()[2].version, 3);
    }

    #[test]
    fn test_schema_covers_every_table() {
        let schema = EMBEDDED[0].sql;
        for table in Table::ALL {
            assert!(
                schema.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table.name())),
                "missing table {}",
                table
            );
        }
        assert!(schema.contains("CHECK (progress BETWEEN 0 AND 100)"));
    }

    #[test]
    fn test_conflict_keys_are_unique_columns() {
        let schema = EMBEDDED[0].sql;
        for table in Table::ALL {
            if let Some(key) = table.conflict_key() {
                let start = schema
                    .find(&format!("CREATE TABLE IF NOT EXISTS {} (", table.name()))
                    .unwrap();
                let body = &schema[start..];
                let body = &body[..body.find(");").unwrap()];
                assert!(
                    body.lines().any(|line| line.trim_start().starts_with(&format!("{} ", key))
                        && line.contains("UNIQUE")),
                    "{}.{} must be UNIQUE",
                    table,
                    key
                );
            }
        }
    }
}
