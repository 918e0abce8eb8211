//! This file defines the episerve binary entry point.

use episerve::app;
use episerve::app_state::AppState;
use episerve::cli;
use episerve::metrics;
use episerve::server;
use episerve::tracing;

use std::sync::Arc;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = cli::parse();
    tracing::init_tracing();
    metrics::register_metrics();
    let state = Arc::new(AppState::new(&args));
    let router = app::router(state);
    server::serve(&args, router).await;
}
