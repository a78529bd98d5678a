//! Todo List PDF Server
//!
//! Accepts a list of todo items and returns a rendered PDF report: a table
//! of the items plus a trend chart.
//!
//! ## Architecture
//!
//! Rendering is CPU-bound, so handlers never run it themselves. Each request
//! is validated, submitted to a fixed-size render pool, and awaited; the
//! async runtime stays free to answer other requests (including `/health`)
//! while every slot is busy.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use render_pool::{PoolConfig, WorkerPool};
use report_engine::ReportWorker;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod storage;
#[cfg(test)]
mod tests;

use api::{handle_api, handle_generate_pdf, handle_health};

/// Command-line arguments for the todo PDF server
#[derive(Parser, Debug)]
#[command(name = "todo-pdf-server")]
#[command(about = "Renders todo lists into PDF reports")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Number of render slots
    #[arg(long, env = "PDF_POOL_SIZE", default_value = "2")]
    pool_size: usize,

    /// Directory that receives a copy of every generated PDF
    #[arg(long, env = "PDF_OUTPUT_DIR", default_value = "pdfs")]
    output_dir: PathBuf,

    /// Do not keep copies of generated PDFs
    #[arg(long)]
    no_persist: bool,

    /// Front-end build output (index.html and assets/)
    #[arg(long, env = "STATIC_DIR", default_value = "dist/static")]
    static_dir: PathBuf,

    /// Give up waiting for a render after this many milliseconds
    #[arg(long, env = "RENDER_TIMEOUT_MS")]
    render_timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: WorkerPool<ReportWorker>,
    /// Where report copies go; `None` disables persistence
    pub output_dir: Option<PathBuf>,
    pub render_timeout: Option<Duration>,
}

/// Build the router over `state`, serving the front end from `static_dir`
pub fn app(state: AppState, static_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api", get(handle_api))
        .route("/pdf", post(handle_generate_pdf))
        // Front end
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .nest_service("/assets", ServeDir::new(static_dir.join("assets")))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting todo PDF server on {}:{}", args.host, args.port);

    let pool = WorkerPool::start(PoolConfig::with_size(args.pool_size), ReportWorker::new).await?;
    info!("Render pool ready with {} slots", pool.size());

    let state = AppState {
        pool: pool.clone(),
        output_dir: (!args.no_persist).then(|| args.output_dir.clone()),
        render_timeout: args.render_timeout_ms.map(Duration::from_millis),
    };

    match &state.output_dir {
        Some(dir) => info!("Saving report copies to {}", dir.display()),
        None => info!("Report persistence disabled"),
    }
    if let Some(limit) = state.render_timeout {
        info!("Render timeout: {:?}", limit);
    }

    let router = app(state, &args.static_dir);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining render pool");
    pool.shutdown().await;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
