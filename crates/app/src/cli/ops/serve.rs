use clap::Args;

use docshelf_app::state::AppState;
use docshelf_app::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override app server port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<std::path::PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    State(#[from] docshelf_app::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.docshelf)
        let state = AppState::load(ctx.config_path.clone())?;

        let config = ServiceConfig {
            backend: state.config.backend.clone(),
            auth: state.config.auth.clone(),
            object_store: state.config.object_store.clone(),
            app_port: self.port.unwrap_or(state.config.app_port),
            log_level: tracing::Level::DEBUG,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await;
        Ok("app server stopped".to_string())
    }
}
