//! Genseqdid - didactic sequence service

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use genseqdid::{config::Args, server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("genseqdid={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Genseqdid - didactic sequence service");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Default language: {}", args.default_lang());
    info!("Audit capacity: {}", args.audit_capacity);
    info!("Demo data: {}", if args.seed_demo_data { "seeded" } else { "empty" });
    if args.maintenance {
        warn!("Maintenance: ENABLED");
    }
    info!("======================================");

    let state = Arc::new(AppState::new(args)?);
    server::run(state).await?;

    Ok(())
}
