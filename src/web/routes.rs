//! HTTP routes over the materialized analysis

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::AppState;
use crate::analysis::daily::{DailyVolume, WeekdayGroup};
use crate::analysis::ranking::{AreaCodeRanking, DeviceRanking};
use crate::analysis::stats::VolumeSummary;
use crate::charts::ChartKind;
use crate::engine::ingest::IngestReport;

/// Serve the dashboard page with all four charts
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.charts.dashboard().to_string())
}

/// Serve a single chart as a standalone page
pub async fn chart_page(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    let chart = name
        .parse::<ChartKind>()
        .ok()
        .and_then(|kind| state.charts.get(kind));

    match chart {
        Some(chart) => Html(chart.page.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, format!("No chart named '{name}'")).into_response(),
    }
}

/// API: daily totals in date order
pub async fn api_daily(State(state): State<Arc<AppState>>) -> Json<Vec<DailyVolume>> {
    Json(state.report.daily.clone())
}

/// API: weekday groups with box statistics
pub async fn api_weekday(State(state): State<Arc<AppState>>) -> Json<Vec<WeekdayGroup>> {
    Json(state.report.weekdays.clone())
}

pub async fn api_areas(State(state): State<Arc<AppState>>) -> Json<Vec<AreaCodeRanking>> {
    Json(state.report.areas.clone())
}

#[derive(Debug, Serialize)]
pub struct DevicesResponse {
    pub area_code: String,
    pub top_n: u32,
    pub devices: Vec<DeviceRanking>,
}

pub async fn api_devices(State(state): State<Arc<AppState>>) -> Json<DevicesResponse> {
    Json(DevicesResponse {
        area_code: state.report.area_code.clone(),
        top_n: state.report.top_n,
        devices: state.report.devices.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub ingest: IngestReport,
    pub daily: VolumeSummary,
}

/// API: ingest accounting and daily volume statistics
pub async fn api_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        ingest: state.report.ingest.clone(),
        daily: state.report.summary.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::router;
    use super::*;
    use crate::analysis::tests::sample_report;
    use crate::charts::RenderedCharts;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app() -> axum::Router {
        let report = sample_report().await;
        let charts = RenderedCharts::render(&report);
        router(Arc::new(AppState { report, charts }))
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let response = app()
            .await
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_serves_dashboard() {
        let (status, body) = get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("IPDR Usage Analysis"));
        assert!(body.contains("chart-weekday"));
    }

    #[tokio::test]
    async fn chart_pages_by_name() {
        let (status, body) = get("/charts/areas").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Top Area Codes by Avg GB Downloaded"));

        let (status, _) = get("/charts/pie").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_returns_materialized_tables() {
        let (status, body) = get("/api/daily").await;
        assert_eq!(status, StatusCode::OK);
        let daily: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(daily[0]["date"], "2017-10-01");
        assert_eq!(daily[0]["download_gb"], 3.0);

        let (_, body) = get("/api/devices").await;
        let devices: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(devices["area_code"], "cg");
        assert_eq!(devices["devices"].as_array().unwrap().len(), 2);

        let (_, body) = get("/api/summary").await;
        let summary: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(summary["ingest"]["rows_dropped"], 1);
        assert_eq!(summary["daily"]["download_gb"]["count"], 3);
    }
}
