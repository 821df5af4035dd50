use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::chain::Chain;
use crate::risk::classifier::RiskLevel;

/// One active approval-changed event after decoding, before any enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalEvent {
    pub token: Address,
    pub spender: Address,
    pub allowance: U256,
    pub block_number: Option<u64>,
}

/// One economic grant of spending rights, fully resolved and classified.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub chain: Chain,
    pub token_address: Address,
    pub token_symbol: String,
    pub spender_address: Address,
    pub spender_name: String,
    #[serde(serialize_with = "as_decimal")]
    pub allowance_raw: U256,
    pub allowance_human: String,
    pub is_unlimited: bool,
    pub risk_level: RiskLevel,
    pub risk_reasons: Vec<String>,
    /// Contribution of this approval to the wallet score.
    pub risk_score: u32,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,
}

/// Per-contract findings attached to a scan.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRisk {
    pub address: String,
    pub chain: Option<Chain>,
    pub is_verified: bool,
    pub is_proxy: bool,
    pub has_mint: bool,
    pub has_blacklist: bool,
    pub has_pause: bool,
    pub is_honeypot: bool,
    pub hidden_fee: f64,
    pub owner_privileges: Vec<String>,
    pub risk_score: u32,
    pub risk_level: Option<RiskLevel>,
    pub vulnerabilities: Vec<String>,
}

/// Outcome of one chain's traversal during a scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum ChainStatus {
    Ok { chain: Chain, approvals: usize },
    Degraded { chain: Chain, error: String },
}

impl ChainStatus {
    pub fn chain(&self) -> Chain {
        match self {
            Self::Ok { chain, .. } | Self::Degraded { chain, .. } => *chain,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Aggregate of one completed wallet scan. Built once, never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletScanResult {
    pub wallet_address: Address,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub scan_timestamp: DateTime<Utc>,
    pub overall_risk_score: u32,
    pub total_approvals: usize,
    pub critical_risks: usize,
    pub warnings: usize,
    pub chains_scanned: Vec<Chain>,
    pub chain_status: Vec<ChainStatus>,
    pub approvals: Vec<Approval>,
    pub contract_risks: Vec<ContractRisk>,
    pub recommendations: Vec<String>,
}

fn as_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}
