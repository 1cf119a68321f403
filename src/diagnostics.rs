//! HTTP endpoint exposing the last run's statistics.
//!
//! The server is an explicit value handed to [`app::run`](crate::app::run);
//! nothing is registered on process-wide state.

use crate::error::{Result, WordFreqError};
use crate::pipeline::{FileSummary, StageReport, WordDistribution};
use crate::rank::ChartValue;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Summary of one run as served on `/debug/stats`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunStats {
    pub total_words: u64,
    pub distinct_words: usize,
    pub files: FileSummary,
    pub elapsed_ms: f64,
    pub stages: Vec<StageReport>,
}

impl RunStats {
    pub fn from_distribution(dist: &WordDistribution) -> Self {
        Self {
            total_words: dist.total(),
            distinct_words: dist.table.distinct(),
            files: dist.files,
            elapsed_ms: dist.elapsed.as_secs_f64() * 1000.0,
            stages: dist.stages.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct DiagnosticState {
    stats: RunStats,
    top: Vec<ChartValue>,
}

/// Diagnostic HTTP server bound to a fixed address
#[derive(Debug)]
pub struct DiagnosticServer {
    addr: SocketAddr,
    state: Arc<DiagnosticState>,
}

impl DiagnosticServer {
    /// A server with no run attached yet
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            state: Arc::new(DiagnosticState::default()),
        }
    }

    /// Attach the results of a finished run
    pub fn with_report(self, dist: &WordDistribution, top: Vec<ChartValue>) -> Self {
        Self {
            addr: self.addr,
            state: Arc::new(DiagnosticState {
                stats: RunStats::from_distribution(dist),
                top,
            }),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .route("/debug/stats", get(stats))
            .route("/debug/top", get(top))
            .with_state(Arc::clone(&self.state))
    }

    /// Bind and serve until the process exits
    pub async fn serve(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(WordFreqError::Diagnostics)?;
        info!(addr = %self.addr, "diagnostic server listening");
        axum::serve(listener, self.router())
            .await
            .map_err(WordFreqError::Diagnostics)
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn stats(State(state): State<Arc<DiagnosticState>>) -> Json<RunStats> {
    Json(state.stats.clone())
}

async fn top(State(state): State<Arc<DiagnosticState>>) -> Json<Vec<ChartValue>> {
    Json(state.top.clone())
}
