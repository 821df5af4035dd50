use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::types::*;
use super::AppState;
use crate::analysis::types::{BatchReport, ContractAnalysisResult};
use crate::approvals::types::WalletScanResult;
use crate::error::EngineError;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

fn engine_error(e: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if e.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else if matches!(e, EngineError::NotAContract) {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    };
    api_error(status, e.to_string())
}

// ============================================================
// Health & Chains
// ============================================================

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let endpoints = [
        ("health", "GET /health"),
        ("chains", "GET /api/v1/chains"),
        ("scan", "GET /api/v1/scan?wallet=0x...&chains=ethereum,base"),
        ("analyze", "GET /api/v1/analyze?contract=0x...&chain=ethereum"),
        ("batch", "POST /api/v1/analyze/batch"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    let services = BTreeMap::from([
        ("decompiler".to_string(), state.decompiler_url.clone()),
        ("analyzer".to_string(), state.analyzer_url.clone()),
    ]);

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "approval-sentinel".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
        services,
    })
}

pub async fn chains(State(state): State<Arc<AppState>>) -> Json<ChainsResponse> {
    let chains = state.engine.supported_chains().to_vec();
    Json(ChainsResponse {
        count: chains.len(),
        chains,
    })
}

// ============================================================
// Scan & Analysis
// ============================================================

pub async fn scan_wallet(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScanParams>,
) -> ApiResult<WalletScanResult> {
    let wallet = params
        .wallet
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "wallet parameter required"))?;
    state
        .engine
        .scan_wallet(&wallet, params.chains.as_deref())
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn analyze_contract(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AnalyzeParams>,
) -> ApiResult<ContractAnalysisResult> {
    let contract = params
        .contract
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "contract parameter required"))?;
    state
        .engine
        .analyze_contract(&contract, params.chain.as_deref())
        .await
        .map(Json)
        .map_err(engine_error)
}

pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> ApiResult<BatchReport> {
    state
        .engine
        .analyze_batch(request.contracts)
        .await
        .map(Json)
        .map_err(engine_error)
}
