use clap::Args;

use docshelf_app::state::AppState;

#[derive(Args, Debug, Clone)]
pub struct Init;

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("state error: {0}")]
    State(#[from] docshelf_app::StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::init(ctx.config_path.clone(), None)?;
        Ok(format!(
            "Initialized docshelf at {}. Edit {} to point at your backends.",
            state.app_dir.display(),
            state.config_path.display()
        ))
    }
}
