use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::batch::BatchItem;
use crate::chain::Chain;

// ============================================================
// Query params & bodies
// ============================================================

#[derive(Debug, Deserialize)]
pub struct ScanParams {
    pub wallet: Option<String>,
    pub chains: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub contract: Option<String>,
    pub chain: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub contracts: Vec<BatchItem>,
}

// ============================================================
// Response types
// ============================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub endpoints: BTreeMap<String, String>,
    pub services: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ChainsResponse {
    pub chains: Vec<Chain>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
