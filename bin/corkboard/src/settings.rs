//! Server settings: `config/default`, then `config/<APP_ENV>`, then
//! `CORKBOARD_*` environment variables, later sources winning.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Where uploaded image payloads are kept.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageBackend {
    /// BLOB column next to boards and posts.
    Database,
    /// Sharded files under `upload_dir`.
    Filesystem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_image_backend")]
    pub image_backend: ImageBackend,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default)]
    pub workers: Option<usize>,

    /// Base URL of the client bundle (`board.css`, `board.js`) linked from the shell page.
    #[serde(default)]
    pub client_assets: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_database_url() -> String {
    "sqlite:corkboard.db".to_string()
}
fn default_image_backend() -> ImageBackend {
    ImageBackend::Database
}
fn default_upload_dir() -> PathBuf {
    PathBuf::from("./data/images")
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let env_name = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{env_name}")).required(false))
            .add_source(
                Environment::with_prefix("CORKBOARD")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_origins"),
            )
            .build()?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Self = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("database_url cannot be empty");
        }
        if self.port == 0 {
            errors.push("port must be non-zero");
        }
        if self.max_upload_bytes == 0 {
            errors.push("max_upload_bytes must be non-zero");
        }
        if self.workers == Some(0) {
            errors.push("workers must be non-zero when set");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }
}
