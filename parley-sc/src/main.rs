//! parley-sc - Session Coordination service
//!
//! Coordinates the live discussion-session lifecycle: capacity-bounded
//! admission via access tokens, venue booking, peer-ranking collection,
//! bias-corrected scoring, and level promotion.

use anyhow::Result;
use clap::Parser;
use parley_common::config::{self, ServiceConfig};
use parley_common::events::EventBus;
use std::path::PathBuf;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use parley_sc::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "parley-sc", about = "Parley session coordinator")]
struct Args {
    /// Data directory (overrides PARLEY_DATA and the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Starting parley-sc (Session Coordinator)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let data_dir = config::resolve_data_dir(args.data_dir.as_deref());
    config::ensure_data_dir(&data_dir)?;

    let service_config = ServiceConfig::load(args.config.as_deref())?;

    let db_path = config::database_path(&data_dir);
    info!("Database: {}", db_path.display());
    let db_pool = parley_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(service_config.event_capacity);

    let state = AppState::new(db_pool, event_bus, service_config.clone());

    // Background sweep: deactivate access tokens past expiry. Pure
    // maintenance, idempotent, no business effect beyond preventing future
    // consumption.
    let sweep_pool = state.db.clone();
    let sweep_interval = Duration::from_secs(service_config.sweep_interval_secs);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        loop {
            interval.tick().await;
            match parley_sc::services::admission::sweep_expired_tokens(&sweep_pool).await {
                Ok(0) => {}
                Ok(n) => info!(deactivated = n, "Expired access tokens swept"),
                Err(e) => warn!(error = %e, "Token sweep failed"),
            }
        }
    });

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&service_config.bind_addr).await?;
    info!("Listening on http://{}", service_config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
