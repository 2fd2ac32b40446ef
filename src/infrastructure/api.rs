//! API Server (Cold Path)
//!
//! REST API over the latest scan report, the live rate graph and the
//! feed metrics. The only write is the fee toggle.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::Level;

use crate::core::CurrencySet;
use crate::exchanges::stream::{shutdown_requested, FeedMonitor};
use crate::hot_path::{Cycle, RateGraph, RateSource, ScanReport, ScanStats};
use crate::infrastructure::metrics::{MetricsCollector, MetricsSnapshot};
use crate::ws::ConnectionState;
use crate::{log_api, ArbError};

/// Cycle as shown to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDto {
    /// Currency names, start repeated at the end
    pub path: Vec<String>,
    pub label: String,
    pub rates: [f64; 3],
    pub product: f64,
    pub spread: f64,
    pub profitable: bool,
}

impl CycleDto {
    fn new(cycle: &Cycle, currencies: &CurrencySet) -> Self {
        Self {
            path: cycle
                .path
                .iter()
                .map(|c| currencies.name(*c).to_string())
                .collect(),
            label: cycle.label(currencies),
            rates: cycle.rates,
            product: cycle.product,
            spread: cycle.spread,
            profitable: cycle.profitable,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatsDto {
    pub total: u64,
    pub profitable: u64,
}

impl From<ScanStats> for StatsDto {
    fn from(stats: ScanStats) -> Self {
        Self {
            total: stats.total,
            profitable: stats.profitable,
        }
    }
}

/// Latest scan
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CyclesDto {
    pub cycles: Vec<CycleDto>,
    pub threshold: f64,
    pub include_fees: bool,
    pub stats: StatsDto,
}

/// System status information
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub connected: bool,
    pub feed_state: ConnectionState,
    pub include_fees: bool,
    pub fee_rate: f64,
    pub currencies: Vec<String>,
    pub known_edges: usize,
    pub stats: StatsDto,
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct RateDto {
    pub from: String,
    pub to: String,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct FeesRequest {
    pub enabled: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<RateGraph>,
    pub reports: watch::Receiver<Arc<ScanReport>>,
    pub metrics: Arc<MetricsCollector>,
    pub feed: FeedMonitor,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/cycles", get(get_cycles))
        .route("/api/status", get(get_status))
        .route("/api/rates", get(get_rates))
        .route("/api/fees", post(post_fees))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the API until `shutdown` flips to true
pub async fn start_server(
    state: AppState,
    port: u16,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ArbError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_api!(Level::INFO, %addr, "API Server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown_requested(&mut shutdown).await })
        .await?;

    log_api!(Level::INFO, "API Server stopped");
    Ok(())
}

/// Handler for GET /api/cycles
pub async fn get_cycles(State(state): State<AppState>) -> Json<CyclesDto> {
    let report = state.reports.borrow().clone();
    let currencies = state.graph.currencies();

    Json(CyclesDto {
        cycles: report
            .cycles
            .iter()
            .map(|c| CycleDto::new(c, currencies))
            .collect(),
        threshold: report.threshold,
        include_fees: report.include_fees,
        stats: report.stats.into(),
    })
}

/// Handler for GET /api/status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusDto> {
    Json(status(&state))
}

/// Handler for GET /api/rates
pub async fn get_rates(State(state): State<AppState>) -> Json<Vec<RateDto>> {
    let currencies = state.graph.currencies();
    let rates = state
        .graph
        .edges()
        .into_iter()
        .map(|e| RateDto {
            from: currencies.name(e.from).to_string(),
            to: currencies.name(e.to).to_string(),
            rate: e.rate,
        })
        .collect();
    Json(rates)
}

/// Handler for POST /api/fees
pub async fn post_fees(
    State(state): State<AppState>,
    Json(req): Json<FeesRequest>,
) -> Json<StatusDto> {
    state.graph.set_fees(req.enabled);
    log_api!(Level::INFO, enabled = req.enabled, "Fee adjustment toggled");
    Json(status(&state))
}

fn status(state: &AppState) -> StatusDto {
    let stats = state.reports.borrow().stats;
    StatusDto {
        connected: state.feed.is_connected(),
        feed_state: state.feed.state(),
        include_fees: state.graph.includes_fees(),
        fee_rate: state.graph.fee_rate(),
        currencies: state.graph.currencies().names().to_vec(),
        known_edges: state.graph.known_edges(),
        stats: stats.into(),
        metrics: state.metrics.snapshot(),
    }
}
