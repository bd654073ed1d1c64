//! csrf-relay
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  CSRF RELAY                  │
//!   Browser request     │  ┌────────┐   ┌────────┐   ┌─────────────┐   │
//!   ────────────────────┼─▶│ server │──▶│ target │──▶│ csrf issuer │───┼──▶ GET /csrf/
//!    /api/{path}        │  └────────┘   └────────┘   └──────┬──────┘   │
//!                       │                                   ▼          │
//!                       │               ┌──────────┐   ┌─────────┐     │
//!                       │               │forwarder │◀──│ cookies │     │
//!                       │               └────┬─────┘   └─────────┘     │
//!                       │                    ▼                         │
//!   Relayed response    │  ┌──────────┐   ┌──────────┐                 │
//!   ◀───────────────────┼──│ response │◀──│sanitizer │◀────────────────┼─── Backend
//!    + csrftoken expiry │  └──────────┘   └──────────┘                 │     /api/{path}/
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use csrf_relay::config::{load_config, ConfigOverrides};
use csrf_relay::lifecycle;

#[derive(Parser)]
#[command(name = "csrf-relay")]
#[command(about = "Relay /api requests to a backend with a fresh CSRF token", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base URL. Overrides PUBLIC_SERVER_URL.
    #[arg(short, long)]
    endpoint: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        bind_address: cli.bind,
        endpoint: cli.endpoint,
    };
    let config = load_config(cli.config.as_deref(), &overrides)?;

    lifecycle::start(config).await?;
    Ok(())
}
