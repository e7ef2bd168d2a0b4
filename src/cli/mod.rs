use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the syncboard server
#[derive(Parser)]
#[command(name = "syncboard")]
#[command(about = "Clipboard to WebDAV synchronization server for rooted Android devices")]
#[command(version)]
pub struct Cli {
    /// HTTP server port
    #[arg(short, long, default_value_t = 8964)]
    pub port: u16,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory of static WebUI assets
    #[arg(long)]
    pub webui: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
