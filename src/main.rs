//! Security header gateway.
//!
//! A reverse proxy that sits in front of a web application and applies its
//! response security headers.
//!
//! ```text
//!     Client ──▶ request id ─▶ trace ─▶ compression ─▶ security headers ─▶ limit/timeout ─▶ forward ──▶ App
//!     Client ◀── request id ◀─ trace ◀─ compression ◀─ security headers ◀───────────────── response ◀── App
//! ```
//!
//! For every response the security layer:
//! - strips `X-Powered-By` (unless `security.powered_by_header = true`)
//! - applies the static `security.header_rules` whose source matches
//! - if the path passes the middleware filter and is not a static asset,
//!   sets `X-Frame-Options`, `X-Content-Type-Options` and `Referrer-Policy`

use std::path::PathBuf;

use clap::Parser;

use header_gateway::config::load_config;
use header_gateway::lifecycle::{startup, StartupOptions};

#[derive(Parser)]
#[command(name = "header-gateway")]
#[command(about = "Reverse proxy that applies security response headers", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "HEADER_GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long, requires = "config")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.check {
        if let Some(path) = &cli.config {
            load_config(path)?;
            println!("{}: configuration OK", path.display());
        }
        return Ok(());
    }

    startup::run(StartupOptions {
        config_path: cli.config,
    })
    .await
}
