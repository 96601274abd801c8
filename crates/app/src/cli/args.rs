pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "docshelf")]
#[command(about = "Upload, list and share documents from your terminal")]
pub struct Args {
    /// Remote app server to talk to (defaults to the local instance)
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    /// Path to the docshelf config directory (defaults to ~/.docshelf)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
