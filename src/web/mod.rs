//! Dashboard server
//!
//! Serves the charts and result tables of one finished analysis. Nothing is
//! recomputed per request.

mod routes;

use anyhow::Result;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::AnalysisReport;
use crate::charts::RenderedCharts;
use crate::config::Config;

pub struct AppState {
    pub report: AnalysisReport,
    pub charts: RenderedCharts,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/charts/:name", get(routes::chart_page))
        // API endpoints
        .route("/api/daily", get(routes::api_daily))
        .route("/api/weekday", get(routes::api_weekday))
        .route("/api/areas", get(routes::api_areas))
        .route("/api/devices", get(routes::api_devices))
        .route("/api/summary", get(routes::api_summary))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: &Config, report: AnalysisReport, charts: RenderedCharts) -> Result<()> {
    let state = Arc::new(AppState { report, charts });
    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    info!("Dashboard starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
