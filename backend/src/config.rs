//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use chrono::{DateTime, Utc};
use std::env;
use std::fmt;

/// Largest accepted `PUT /api/invoices/:id` body, base64 attachment included
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Relational store configuration
    pub database: DatabaseConfig,
    /// Remote blob store configuration
    pub blob_store: BlobStoreConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Body size limit for requests that carry an attachment
    pub max_upload_bytes: usize,
}

/// Relational store configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
}

/// Target of the remote content API used to store attachment bytes
///
/// Passed explicitly into the blob store so tests can point it anywhere.
#[derive(Clone)]
pub struct BlobStoreConfig {
    /// Base URL of the REST contents API
    pub api_base_url: String,
    /// Base URL of the public raw-file endpoint
    pub raw_base_url: String,
    /// Repository identity in `owner/name` form
    pub repository: String,
    /// Branch every blob is written to and served from
    pub branch: String,
    /// Directory inside the repository that holds uploads
    pub upload_prefix: String,
    /// Bearer credential for the contents API
    pub token: Option<String>,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.github.com".to_string(),
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            repository: String::new(),
            branch: "main".to_string(),
            upload_prefix: "uploads".to_string(),
            token: None,
            user_agent: format!("invoice-tracker-backend/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// Keeps the token out of startup logs.
impl fmt::Debug for BlobStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStoreConfig")
            .field("api_base_url", &self.api_base_url)
            .field("raw_base_url", &self.raw_base_url)
            .field("repository", &self.repository)
            .field("branch", &self.branch)
            .field("upload_prefix", &self.upload_prefix)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl BlobStoreConfig {
    /// Blob path for a new upload of `file_name` taken at `at`
    ///
    /// The nanosecond timestamp keeps two uploads of the same name apart.
    /// Characters outside `[A-Za-z0-9._-]` are replaced so the path can be
    /// used in URLs as-is.
    pub fn upload_path(&self, file_name: &str, at: DateTime<Utc>) -> String {
        let stamp = at
            .timestamp_nanos_opt()
            .unwrap_or_else(|| at.timestamp_millis());
        let prefix = self.upload_prefix.trim_matches('/');
        let name = sanitize_file_name(file_name);
        if prefix.is_empty() {
            format!("{}-{}", stamp, name)
        } else {
            format!("{}/{}-{}", prefix, stamp, name)
        }
    }

    /// Publicly retrievable URL of the blob at `path`
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.raw_base_url.trim_end_matches('/'),
            self.repository,
            self.branch,
            path.trim_start_matches('/')
        )
    }

    /// Contents API URL of the blob at `path`
    pub fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/contents/{}",
            self.api_base_url.trim_end_matches('/'),
            self.repository,
            path.trim_start_matches('/')
        )
    }
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = BlobStoreConfig::default();
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            },
            database: DatabaseConfig {
                path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/invoices.db".to_string()),
            },
            blob_store: BlobStoreConfig {
                api_base_url: env::var("GITHUB_API_URL").unwrap_or(defaults.api_base_url),
                raw_base_url: env::var("GITHUB_RAW_URL").unwrap_or(defaults.raw_base_url),
                repository: env::var("GITHUB_REPO").unwrap_or(defaults.repository),
                branch: env::var("GITHUB_BRANCH").unwrap_or(defaults.branch),
                upload_prefix: env::var("GITHUB_UPLOADS_PATH").unwrap_or(defaults.upload_prefix),
                token: env::var("GITHUB_TOKEN").ok().filter(|t| !t.trim().is_empty()),
                user_agent: defaults.user_agent,
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
