//! paneltrack-server - Panel scheduling and tracking service
//!
//! Administrative REST service for scheduling panel and carousel
//! discernment events: candidates, advisers, task timelines, worship
//! schedules, printing checklists, spreadsheet import, and reporting.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use paneltrack_server::AppState;

#[derive(Parser, Debug)]
#[command(name = "paneltrack-server", version, about = "Panel scheduling and tracking service")]
struct Args {
    /// Root folder holding the database (overrides env and config file)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Listen port (overrides config file)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting paneltrack-server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve root folder: CLI > env > config file > platform default
    let config = paneltrack_common::config::load_server_config()?;
    let root_folder =
        paneltrack_common::config::resolve_root_folder(args.root_folder.as_deref(), &config);
    let db_path = paneltrack_common::config::ensure_root_folder(&root_folder)?;
    info!("Database: {}", db_path.display());

    let db_pool = paneltrack_common::db::init::init_database(&db_path).await?;
    info!("Database connection established");

    let state = AppState::new(db_pool);
    let app = paneltrack_server::build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", config.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
