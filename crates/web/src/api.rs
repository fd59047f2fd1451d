//! JSON API: portfolio lookup, trade insights, health and Prometheus metrics.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use common::config::Config;
use common::llm::{ChatClient, LlmError};
use common::sei::SeiClient;
use common::types::Network;
use metrics_exporter_prometheus::PrometheusHandle;
use portfolio::insights::{generate_insight, InsightKind, InsightResponse};
use portfolio::model::{PortfolioResponse, PortfolioSnapshot};
use portfolio::pipeline::{fetch_portfolio, request_fallback};
use portfolio::trade_data::TradeData;
use portfolio::validation::{validate_request, ValidationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
    /// Resolved from `[llm].api_key_env` at startup.
    pub llm_api_key: Option<String>,
    pub metrics: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, http: reqwest::Client, metrics: Option<PrometheusHandle>) -> Self {
        let llm_api_key = config.llm.api_key();
        Self {
            config,
            http,
            llm_api_key,
            metrics,
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortfolioRequest {
    wallet_address: Option<String>,
    network: Option<String>,
}

async fn portfolio(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PortfolioResponse>, ApiError> {
    let req: PortfolioRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            return Ok(Json(request_fallback(
                "unknown",
                Network::Mainnet,
                &e.to_string(),
                &state.config.portfolio,
                Utc::now(),
            )));
        }
    };

    let (address, network) =
        validate_request(req.wallet_address.as_deref(), req.network.as_deref())?;
    info!(
        wallet = %address,
        network = network.as_str(),
        "fetching portfolio from Sei REST API"
    );

    let client = SeiClient::new(
        state.http.clone(),
        state.config.networks.endpoint(network),
        &state.config.fetch,
    );
    let resp = fetch_portfolio(
        &client,
        &address,
        network,
        &state.config.portfolio,
        state.config.fetch.tx_limit,
        Utc::now(),
    )
    .await;
    Ok(Json(resp))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TradeSummaryRequest {
    trade_data: Option<TradeData>,
    /// Alternative to `tradeData`: statistics are derived from the snapshot.
    portfolio: Option<PortfolioSnapshot>,
    #[serde(rename = "type")]
    kind: InsightKind,
}

async fn trade_summary(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<InsightResponse>, ApiError> {
    let req: TradeSummaryRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))?;

    let symbol = &state.config.portfolio.display_symbol;
    let trade_data = match (req.trade_data, req.portfolio) {
        (Some(data), _) => data,
        (None, Some(snapshot)) => TradeData::from_snapshot(&snapshot, symbol),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "tradeData or portfolio is required".to_string(),
            ));
        }
    };

    let api_key = state
        .llm_api_key
        .clone()
        .ok_or_else(|| LlmError::MissingApiKey(state.config.llm.api_key_env.clone()))?;
    let client = ChatClient::new(state.http.clone(), &state.config.llm, api_key);

    match generate_insight(&client, req.kind, &trade_data).await {
        Ok(content) => {
            info!(kind = req.kind.as_str(), "analysis completed");
            Ok(Json(InsightResponse { content }))
        }
        Err(e) => {
            error!(kind = req.kind.as_str(), error = %e, "trade summary failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => {
            handle.run_upkeep();
            (
                [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
                handle.render(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/portfolio", post(portfolio))
        .route("/api/trade-summary", post(trade_summary))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
