use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use site_admin::api_keys::ApiKeyService;
use site_admin::config::AppConfig;
use site_admin::content::{load_technology_catalog, ContentRepository, SettingsStore};
use site_admin::database::{Database, Table};
use site_admin::i18n::{I18n, Locale};
use site_admin::media::{self, ThumbnailQuality};
use site_admin::migrations::{probe_tables, MigrationTarget, Migrator};
use site_admin::postgrest::RestClient;
use site_admin::projects::ProjectRepository;
use site_admin::seed::{SeedDataset, SeedRunner};
use site_admin::SiteError;

#[derive(Parser)]
#[command(name = "site-admin")]
#[command(about = "Schema, seed and content administration for the marketing site")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update the database schema
    Migrate {
        /// Only check which tables exist
        #[arg(long)]
        probe: bool,

        /// Use the exec_sql RPC even when DATABASE_URL is set
        #[arg(long)]
        rpc: bool,
    },
    /// Load seed data into the content tables
    Seed {
        /// Directory of *.yml seed files (defaults to the configured seed dir)
        #[arg(short, long)]
        dir: Option<String>,

        /// Use the built-in dataset instead of seed files
        #[arg(long, conflicts_with = "dir")]
        embedded: bool,

        /// Seed a single table
        #[arg(long)]
        only: Option<String>,

        /// Print row counts afterwards
        #[arg(long)]
        verify: bool,
    },
    /// YouTube link helpers (no credentials needed)
    Youtube {
        #[command(subcommand)]
        action: YoutubeAction,
    },
    /// Projects as shown on the site
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Generic content table operations
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },
    /// Site settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Dashboard API keys
    ApiKeys {
        #[command(subcommand)]
        action: ApiKeyAction,
    },
}

#[derive(Subcommand)]
enum YoutubeAction {
    /// Print the video id
    Id { url: String },
    /// Print the embeddable URL
    Embed { url: String },
    /// Exit non-zero unless the URL looks like a YouTube video
    Valid { url: String },
    /// Print the thumbnail URL
    Thumbnail {
        url: String,

        /// default, medium, high, standard or maxres
        #[arg(long, default_value = "high")]
        quality: String,
    },
}

#[derive(Args)]
struct LocaleArg {
    /// en or id (defaults to the configured locale)
    #[arg(short, long)]
    locale: Option<String>,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects in display order
    List {
        #[command(flatten)]
        locale: LocaleArg,

        /// Only featured projects
        #[arg(long)]
        featured: bool,
    },
    /// Mark a project as featured
    Feature {
        id: Uuid,

        /// Remove the featured flag instead
        #[arg(long)]
        off: bool,
    },
    /// Delete a project
    Delete { id: Uuid },
}

#[derive(Subcommand)]
enum ContentAction {
    /// List rows of a table in display order
    List {
        table: String,

        #[command(flatten)]
        locale: LocaleArg,
    },
    /// Delete one row
    Delete { table: String, id: String },
    /// Show a row on the site (or hide it with --off)
    Activate {
        table: String,
        id: String,

        #[arg(long)]
        off: bool,
    },
    /// Rewrite display order to follow the given ids
    Reorder {
        table: String,

        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Technologies grouped by category
    Technologies {
        #[command(flatten)]
        locale: LocaleArg,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    List,
    Get { key: String },
    /// Set a value; parsed as JSON, or stored as a string if it is not JSON
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum ApiKeyAction {
    /// Create a key and print it once
    Create {
        name: String,

        #[arg(short, long = "permission")]
        permissions: Vec<String>,
    },
    List,
    Revoke { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Commands::Youtube { action } = &cli.command {
        return run_youtube(action);
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(SiteError::MissingCredential(name)) => {
            error!("❌ {} is not set. Add it to .env or the environment.", name);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };
    info!("Configuration loaded for {}", config.supabase_url);

    let client = RestClient::new(&config)?;
    let i18n = I18n::new(config.default_locale);

    match cli.command {
        Commands::Migrate { probe, rpc } => run_migrate(&config, &client, probe, rpc).await,
        Commands::Seed {
            dir,
            embedded,
            only,
            verify,
        } => run_seed(&config, &client, dir, embedded, only, verify).await,
        Commands::Projects { action } => run_projects(&client, &i18n, action).await,
        Commands::Content { action } => run_content(&client, &i18n, action).await,
        Commands::Settings { action } => run_settings(&client, action).await,
        Commands::ApiKeys { action } => run_api_keys(&client, action).await,
        Commands::Youtube { .. } => Ok(()),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_filter = if quiet {
        "site_admin=error"
    } else if verbose {
        "site_admin=debug"
    } else {
        "site_admin=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run_youtube(action: &YoutubeAction) -> Result<()> {
    match action {
        YoutubeAction::Id { url } => match media::extract_video_id(url) {
            Some(id) => println!("{}", id),
            None => return Err(anyhow!("No YouTube video id in {}", url)),
        },
        YoutubeAction::Embed { url } => println!("{}", media::to_embed_url(url)),
        YoutubeAction::Valid { url } => {
            if media::is_valid_youtube_url(url) {
                println!("✅ valid");
            } else {
                return Err(anyhow!("Not a YouTube video URL: {}", url));
            }
        }
        YoutubeAction::Thumbnail { url, quality } => {
            let quality: ThumbnailQuality = quality.parse()?;
            match media::thumbnail_url(url, quality) {
                Some(thumbnail) => println!("{}", thumbnail),
                None => return Err(anyhow!("No YouTube video id in {}", url)),
            }
        }
    }
    Ok(())
}

async fn run_migrate(config: &AppConfig, client: &RestClient, probe: bool, rpc: bool) -> Result<()> {
    if probe {
        let report = probe_tables(client).await;
        println!("{}", report);
        return Ok(());
    }

    let migrator = Migrator::new();
    let report = match (&config.database_url, rpc) {
        (Some(url), false) => {
            let database = Database::connect(url)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            let report = migrator.apply(MigrationTarget::Direct(&database)).await;
            database.close().await;
            report
        }
        _ => migrator.apply(MigrationTarget::Rpc(client)).await,
    };

    report.log_summary();
    println!("{}", report);
    Ok(())
}

async fn run_seed(
    config: &AppConfig,
    client: &RestClient,
    dir: Option<String>,
    embedded: bool,
    only: Option<String>,
    verify: bool,
) -> Result<()> {
    let only: Option<Table> = only.map(|name| name.parse()).transpose()?;

    let dataset = if embedded {
        SeedDataset::embedded_default()?
    } else {
        match dir {
            Some(dir) => SeedDataset::load_from_directory(Path::new(&dir))?,
            None if config.seed_dir.is_dir() => SeedDataset::load_from_directory(&config.seed_dir)?,
            None => {
                warn!(
                    "⚠️ Seed directory {:?} not found, using the built-in dataset",
                    config.seed_dir
                );
                SeedDataset::embedded_default()?
            }
        }
    };

    let runner = SeedRunner::new(client);
    let report = runner.run(&dataset, only).await;
    println!("{}", report);

    if verify {
        let tables: Vec<Table> = match only {
            Some(table) => vec![table],
            None => dataset.tables(),
        };
        let counts = runner.verify(&tables).await;
        println!("{}", counts);
    }
    Ok(())
}

async fn run_projects(client: &RestClient, i18n: &I18n, action: ProjectAction) -> Result<()> {
    let repository = ProjectRepository::new(client);
    match action {
        ProjectAction::List { locale, featured } => {
            let locale = resolve_locale(i18n, &locale)?;
            println!("# {}", locale.native_name());
            let projects = if featured {
                repository.featured().await?
            } else {
                repository.list().await?
            };

            for project in projects {
                let row = serde_json::json!({
                    "title_en": project.title_en,
                    "title_id": project.title_id,
                    "title": project.title,
                });
                let title = i18n.localized(&row, "title", locale).unwrap_or_default();
                let star = if project.is_featured() { "★" } else { " " };
                let id = project.id.map(|id| id.to_string()).unwrap_or_default();
                println!("{} {:<36} {:<8} {:>3}%  {}", star, id, project.status, project.progress, title);
            }
        }
        ProjectAction::Feature { id, off } => match repository.set_featured(id, !off).await? {
            Some(project) => println!("✅ {} featured = {}", project.title_en, project.featured),
            None => return Err(anyhow!("No project with id {}", id)),
        },
        ProjectAction::Delete { id } => {
            if repository.delete(id).await? {
                println!("✅ Deleted project {}", id);
            } else {
                return Err(anyhow!("No project with id {}", id));
            }
        }
    }
    Ok(())
}

async fn run_content(client: &RestClient, i18n: &I18n, action: ContentAction) -> Result<()> {
    match action {
        ContentAction::List { table, locale } => {
            let table: Table = table.parse()?;
            let locale = resolve_locale(i18n, &locale)?;
            println!("# {}", locale.native_name());
            let rows = ContentRepository::new(client, table).list().await?;
            for row in &rows {
                let id = row.get("id").map(value_text).unwrap_or_default();
                println!("{:<36} {}", id, display_name(i18n, row, locale));
            }
            println!("{} rows", rows.len());
        }
        ContentAction::Delete { table, id } => {
            let table: Table = table.parse()?;
            if ContentRepository::new(client, table).delete(&id).await? {
                println!("✅ Deleted {} {}", table, id);
            } else {
                return Err(anyhow!("No {} row with id {}", table, id));
            }
        }
        ContentAction::Activate { table, id, off } => {
            let table: Table = table.parse()?;
            match ContentRepository::new(client, table).set_active(&id, !off).await? {
                Some(_) => println!("✅ {} {} {}", table, id, if off { "hidden" } else { "visible" }),
                None => return Err(anyhow!("No {} row with id {}", table, id)),
            }
        }
        ContentAction::Reorder { table, ids } => {
            let table: Table = table.parse()?;
            let report = ContentRepository::new(client, table).reorder(&ids).await?;
            println!("{}", report);
        }
        ContentAction::Technologies { locale } => {
            let locale = resolve_locale(i18n, &locale)?;
            println!("# {}", locale.native_name());
            for group in load_technology_catalog(client).await? {
                let category = serde_json::to_value(&group.category)?;
                println!("{}", display_name(i18n, &category, locale));
                for technology in group.technologies {
                    println!("  - {}", technology.name);
                }
            }
        }
    }
    Ok(())
}

async fn run_settings(client: &RestClient, action: SettingsAction) -> Result<()> {
    let store = SettingsStore::new(client);
    match action {
        SettingsAction::List => {
            for setting in store.all().await? {
                println!("{:<24} {}", setting.key, setting.value);
            }
        }
        SettingsAction::Get { key } => match store.get(&key).await? {
            Some(setting) => println!("{}", setting.value),
            None => return Err(anyhow!("No setting named {}", key)),
        },
        SettingsAction::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let saved = store.set(&key, value).await?;
            println!("✅ {} = {}", saved.key, saved.value);
        }
    }
    Ok(())
}

async fn run_api_keys(client: &RestClient, action: ApiKeyAction) -> Result<()> {
    let service = ApiKeyService::new(client);
    match action {
        ApiKeyAction::Create { name, permissions } => {
            let (record, key) = service.create(&name, &permissions).await?;
            println!("✅ Created API key '{}' ({})", record.name, record.id);
            println!("   {}", key.plaintext);
            println!("   Store it now; it cannot be shown again.");
        }
        ApiKeyAction::List => {
            for record in service.list().await? {
                let state = if record.is_active { "active" } else { "revoked" };
                println!("{} {:<12}… {:<8} {}", record.id, record.key_prefix, state, record.name);
            }
        }
        ApiKeyAction::Revoke { id } => {
            if service.revoke(id).await? {
                println!("✅ Revoked API key {}", id);
            } else {
                return Err(anyhow!("No API key with id {}", id));
            }
        }
    }
    Ok(())
}

fn resolve_locale(i18n: &I18n, arg: &LocaleArg) -> Result<Locale> {
    Ok(match &arg.locale {
        Some(raw) => raw.parse()?,
        None => i18n.default_locale(),
    })
}

/// Best human label for a row: a localized title/name/question/label, else a plain key.
fn display_name(i18n: &I18n, row: &Value, locale: Locale) -> String {
    ["title", "name", "question", "label", "key", "email", "event"]
        .iter()
        .find_map(|field| i18n.localized(row, field, locale))
        .unwrap_or_else(|| "(untitled)".to_string())
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
