use serde::Deserialize;
use std::fmt;
use thiserror::Error;

impl From<serde_json::Error> for SiteError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for SiteError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(format!("YAML error: {}", err))
    }
}

impl From<reqwest::Error> for SiteError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(format!("HTTP error: {}", err))
    }
}

impl From<sqlx::Error> for SiteError {
    fn from(err: sqlx::Error) -> Self {
        Self::MigrationError(format!("Database error: {}", err))
    }
}

impl From<std::io::Error> for SiteError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<ApiError> for SiteError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("{0}")]
    Api(ApiError),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Seed error: {0}")]
    SeedError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl SiteError {
    /// Returns the underlying REST error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Error body returned by PostgREST, plus the HTTP status it came with.
///
/// A status of `0` means the request never produced a response
/// (connection refused, timeout, invalid URL).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        Self::new(0, format!("request failed: {}", err))
    }

    /// Parses a PostgREST error body, keeping the raw text when it is not JSON.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ApiError>(body) {
            Ok(mut parsed) if !parsed.message.is_empty() || parsed.code.is_some() => {
                parsed.status = status;
                parsed
            }
            _ => {
                let message = if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.trim().to_string()
                };
                Self::new(status, message)
            }
        }
    }

    fn code_is(&self, codes: &[&str]) -> bool {
        self.code
            .as_deref()
            .map(|code| codes.contains(&code))
            .unwrap_or(false)
    }

    fn message_mentions(&self, subject: &str, tail: &str) -> bool {
        let message = self.message.to_lowercase();
        message.contains(subject) && message.contains(tail)
    }

    /// The table (or a joined table) does not exist.
    pub fn is_missing_relation(&self) -> bool {
        self.code_is(&["42P01", "PGRST205", "PGRST200"])
            || self.message_mentions("relation", "does not exist")
            || self.message.contains("Could not find the table")
            || self.message.contains("Could not find a relationship")
    }

    /// A selected or written column does not exist.
    pub fn is_missing_column(&self) -> bool {
        self.code_is(&["42703", "PGRST204"]) || self.message_mentions("column", "does not exist")
    }

    /// An RPC target function does not exist.
    pub fn is_missing_function(&self) -> bool {
        self.code_is(&["42883", "PGRST202"])
            || self.message_mentions("function", "does not exist")
            || self.message.contains("Could not find the function")
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409 || self.code_is(&["23505"])
    }

    /// Schema drift the tooling is expected to tolerate and route around.
    pub fn is_recoverable(&self) -> bool {
        self.is_missing_relation() || self.is_missing_column() || self.is_missing_function()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API error ({})", self.status)?;
        if let Some(code) = &self.code {
            write!(f, " [{}]", code)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

pub type Result<T> = std::result::Result<T, SiteError>;
