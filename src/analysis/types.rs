use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;

/// Structural summary returned by the decompiler service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompilerResponse {
    pub success: bool,
    pub opcodes: Vec<String>,
    pub functions: Vec<String>,
    pub selectors: Vec<String>,
    pub is_proxy: bool,
    pub has_sstore: bool,
    pub has_call: bool,
    pub complexity: u32,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VulnerabilityHit {
    pub id: String,
    pub name: String,
    pub severity: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternMatch {
    pub pattern: String,
    pub description: String,
    pub is_malicious: bool,
}

/// Security report returned by the analyzer service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerResponse {
    pub risk_score: u32,
    pub risk_level: String,
    pub vulnerabilities: Vec<VulnerabilityHit>,
    pub patterns: Vec<PatternMatch>,
    pub recommendations: Vec<String>,
}

/// Request body for the decompiler: bare hex, no `0x`.
#[derive(Debug, Serialize)]
pub(crate) struct DecompileRequest {
    pub bytecode: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalyzeRequest {
    pub address: String,
    pub chain: Chain,
    pub bytecode: String,
}

/// Merged outcome of one contract analysis. Stage fields are `None` when that
/// stage failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractAnalysisResult {
    pub address: Address,
    pub chain: Chain,
    pub bytecode_size: usize,
    pub decompilation: Option<DecompilerResponse>,
    pub security_report: Option<AnalyzerResponse>,
    pub overall_risk: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub analyzed_at: DateTime<Utc>,
}

/// One failed batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemError {
    pub address: String,
    pub chain: String,
    pub error: String,
}

/// Combined report of a batch analysis. Entries keep input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<ContractAnalysisResult>,
    pub errors: Vec<BatchItemError>,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}
