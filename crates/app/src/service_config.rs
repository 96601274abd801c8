use std::path::PathBuf;

use crate::state::{AuthConfig, BackendConfig, ObjectStoreConfig};

#[derive(Debug, Clone)]
pub struct Config {
    // backend configuration
    /// Directory backend to record documents in
    pub backend: BackendConfig,
    /// Auth backend to resolve identities against
    pub auth: AuthConfig,
    /// Object-storage upload endpoint
    pub object_store: ObjectStoreConfig,

    // http server configuration
    /// Port for the app server (UI + API combined)
    pub app_port: u16,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
