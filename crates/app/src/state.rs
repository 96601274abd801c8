use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "docshelf";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the app server (UI + API combined)
    #[serde(default = "default_app_port")]
    pub app_port: u16,
    /// Which hosted directory backend to use
    #[serde(default)]
    pub backend: BackendConfig,
    /// Which auth backend to use
    #[serde(default)]
    pub auth: AuthConfig,
    /// Object-storage upload endpoint
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

fn default_app_port() -> u16 {
    8080
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_port: default_app_port(),
            backend: BackendConfig::default(),
            auth: AuthConfig::default(),
            object_store: ObjectStoreConfig::default(),
        }
    }
}

/// Configuration for the document directory backend.
/// Both hosted dialects carry the same contract; `memory` keeps everything
/// in-process for local use and tests.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process directory (default, nothing leaves the machine)
    #[default]
    Memory,

    /// Postgres-backed realtime service (REST + row level security)
    Relational {
        /// Project base URL (e.g. "https://xyzcompany.supabase.co")
        base_url: Url,
        /// Publishable (anon) API key
        api_key: String,
    },

    /// Document-oriented realtime service
    Document {
        /// API base URL
        #[serde(default = "default_document_base_url")]
        base_url: Url,
        /// Hosting project id
        project_id: String,
        /// Application id scoping the collection path
        app_id: String,
        /// Web API key
        api_key: String,
    },
}

fn default_document_base_url() -> Url {
    Url::parse("https://firestore.googleapis.com/v1").expect("hardcoded URL must parse")
}

/// Configuration for the auth backend.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    /// In-process identities (default)
    #[default]
    Memory,

    /// Hosted identity service
    Rest {
        /// Auth endpoint root (e.g. "https://xyzcompany.supabase.co/auth/v1")
        base_url: Url,
        /// Publishable API key
        api_key: String,
        /// Optional custom token to sign in with instead of anonymously
        #[serde(default, skip_serializing_if = "Option::is_none")]
        custom_token: Option<String>,
        /// Optional access token saved from a previous run
        #[serde(default, skip_serializing_if = "Option::is_none")]
        restored_token: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Unsigned upload endpoint, e.g.
    /// "https://api.cloudinary.com/v1_1/{cloud}/auto/upload"
    pub upload_url: Url,
    /// Name of the unsigned upload policy
    #[serde(default = "default_upload_preset")]
    pub upload_preset: String,
}

fn default_upload_preset() -> String {
    "docs_unsigned".to_string()
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            upload_url: Url::parse("https://api.cloudinary.com/v1_1/demo/auto/upload")
                .expect("hardcoded URL must parse"),
            upload_preset: default_upload_preset(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the docshelf directory (~/.docshelf)
    pub app_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the docshelf directory path (custom or default ~/.docshelf)
    pub fn app_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new docshelf state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if app_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }
        fs::create_dir_all(&app_dir)?;

        let config = config.unwrap_or_default();
        let config_path = app_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            app_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the docshelf directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let app_dir = Self::app_dir(custom_path)?;

        if !app_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = app_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            app_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("docshelf directory not initialized. Run 'docshelf init' first")]
    NotInitialized,

    #[error("docshelf directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load_round_trips_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf");

        let state = AppState::init(Some(path.clone()), None).unwrap();
        assert!(matches!(state.config.backend, BackendConfig::Memory));

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config.app_port, state.config.app_port);
    }

    #[test]
    fn test_double_init_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelf");

        AppState::init(Some(path.clone()), None).unwrap();
        let result = AppState::init(Some(path), None);
        assert!(matches!(result, Err(StateError::AlreadyInitialized)));
    }

    #[test]
    fn test_load_without_init() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppState::load(Some(dir.path().join("missing")));
        assert!(matches!(result, Err(StateError::NotInitialized)));
    }

    #[test]
    fn test_backend_config_parses_tagged_variants() {
        let config: AppConfig = toml::from_str(
            r#"
            app_port = 9999

            [backend]
            type = "relational"
            base_url = "https://project.example.co"
            api_key = "anon-key"

            [auth]
            type = "rest"
            base_url = "https://project.example.co/auth/v1"
            api_key = "anon-key"

            [object_store]
            upload_url = "https://api.cloudinary.com/v1_1/acme/auto/upload"
            upload_preset = "docs_unsigned"
            "#,
        )
        .unwrap();

        assert_eq!(config.app_port, 9999);
        assert!(matches!(config.backend, BackendConfig::Relational { .. }));
        assert!(matches!(config.auth, AuthConfig::Rest { .. }));
    }
}
