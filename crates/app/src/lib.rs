// Service modules (app server functionality)
pub mod backend;
pub mod http_server;
pub mod process;
pub mod service_config;
pub mod service_state;
pub mod ui;
pub mod version;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers
pub use backend::{BackendError, DirectoryHandle};
pub use process::{spawn_service, start_service, ShutdownHandle};
pub use service_config::Config as ServiceConfig;
pub use service_state::{CommandError, State as ServiceState};
pub use state::{AppConfig, AppState, AuthConfig, BackendConfig, ObjectStoreConfig, StateError};
