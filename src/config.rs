use crate::error::SiteError;
use crate::i18n::Locale;
use config::{Config, Environment, File};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONFIG_FILE: &str = "site-admin";
const DEFAULT_SEED_DIR: &str = "seeds";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection and tooling settings.
///
/// Credentials only ever come from the environment (optionally via `.env`)
/// or from the config file; nothing is compiled in.
#[derive(Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub anon_key: String,
    pub service_role_key: Option<String>,
    pub database_url: Option<String>,
    pub seed_dir: PathBuf,
    pub request_timeout: Duration,
    pub default_locale: Locale,
}

impl AppConfig {
    /// Loads `.env`, then `site-admin.toml` (or `$SITE_ADMIN_CONFIG`), then the environment.
    pub fn load() -> Result<Self, SiteError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => return Err(SiteError::ConfigError(format!("Failed to read .env: {}", e))),
        }

        let file = std::env::var("SITE_ADMIN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let settings = Config::builder()
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::default())
            .build()
            .map_err(|e| SiteError::ConfigError(format!("Failed to build configuration: {}", e)))?;

        Self::from_settings(&settings)
    }

    /// Reads the process environment only, without `.env` or config files.
    pub fn from_env_only() -> Result<Self, SiteError> {
        let settings = Config::builder()
            .add_source(Environment::default())
            .build()
            .map_err(|e| SiteError::ConfigError(format!("Failed to read environment: {}", e)))?;

        Self::from_settings(&settings)
    }

    /// Builds the config from already-layered settings. Keys are the
    /// lowercased environment names; file-friendly aliases are accepted too.
    pub fn from_settings(settings: &Config) -> Result<Self, SiteError> {
        let supabase_url = lookup(settings, &["vite_supabase_url", "supabase_url"])
            .ok_or_else(|| SiteError::MissingCredential("VITE_SUPABASE_URL".to_string()))?;
        let anon_key = lookup(settings, &["vite_supabase_anon_key", "supabase_anon_key"])
            .ok_or_else(|| SiteError::MissingCredential("VITE_SUPABASE_ANON_KEY".to_string()))?;

        let service_role_key = lookup(settings, &["supabase_service_role_key", "service_role_key"]);
        let database_url = lookup(settings, &["database_url"]);

        let seed_dir = lookup(settings, &["site_admin_seed_dir", "seed_dir"])
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_DIR));

        let request_timeout = match lookup(settings, &["site_admin_timeout_secs", "timeout_secs"]) {
            Some(raw) => Duration::from_secs(raw.parse().map_err(|e| {
                SiteError::ConfigError(format!("Invalid timeout '{}': {}", raw, e))
            })?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let default_locale = match lookup(settings, &["site_admin_default_locale", "default_locale"]) {
            Some(raw) => raw.parse()?,
            None => Locale::En,
        };

        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(SiteError::ConfigError(format!(
                "Supabase URL must be http(s): {}",
                supabase_url
            )));
        }

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
            database_url,
            seed_dir,
            request_timeout,
            default_locale,
        })
    }

    /// Key used for writes: the service-role key when present, else the anon key.
    pub fn write_key(&self) -> &str {
        self.service_role_key.as_deref().unwrap_or(&self.anon_key)
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.supabase_url)
    }
}

fn lookup(settings: &Config, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| settings.get_string(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{}…", visible)
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("supabase_url", &self.supabase_url)
            .field("anon_key", &redact(&self.anon_key))
            .field("service_role_key", &self.service_role_key.as_deref().map(redact))
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("seed_dir", &self.seed_dir)
            .field("request_timeout", &self.request_timeout)
            .field("default_locale", &self.default_locale)
            .finish()
    }
}
