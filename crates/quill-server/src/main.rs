//! Quill server binary
//!
//! Starts the HTTP server for the blog.

use clap::Parser;
use quill_server::{config::ServerConfig, start_server, ServerError};
use std::path::PathBuf;
use std::process;

/// Quill - a small blog with ownership-checked articles and comments
#[derive(Debug, Parser)]
#[command(name = "quill-server", version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => {
            eprintln!("Warning: No config file specified, using default test configuration");
            eprintln!("Usage: quill-server --config <path-to-config.toml>");
            eprintln!();
            ServerConfig::default_test_config()
        }
    };

    start_server(config).await
}
