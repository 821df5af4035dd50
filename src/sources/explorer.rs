use alloy::primitives::{Address, Bytes, B256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::time::Duration;

use super::decoder::Approval;
use super::{ChainDataSource, RawApprovalLog};
use crate::chain::Chain;
use crate::config::SecondaryProviderConfig;

/// Secondary provider: block-explorer query-parameter API keyed by numeric chain id.
pub struct ExplorerSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Explorer envelope. `result` is either a JSON array or a status string such as
/// "No records found".
#[derive(Debug, Deserialize)]
struct ExplorerEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: JsonValue,
    #[serde(default)]
    error: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExplorerLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(default)]
    block_number: Option<String>,
}

impl ExplorerSource {
    pub fn from_config(config: &SecondaryProviderConfig) -> eyre::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("approval-sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| eyre::eyre!("Failed to build explorer HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn chain_id(&self, chain: Chain) -> eyre::Result<u64> {
        chain
            .explorer_chain_id()
            .ok_or_else(|| eyre::eyre!("Chain {} not supported by explorer", chain))
    }

    async fn query(&self, chain: Chain, params: &[(&str, String)]) -> eyre::Result<ExplorerEnvelope> {
        let chain_id = self.chain_id(chain)?.to_string();
        let mut query: Vec<(&str, String)> = vec![("chainid", chain_id)];
        query.extend(params.iter().cloned());
        query.push(("apikey", self.api_key.clone()));

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| eyre::eyre!("Explorer API call failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(eyre::eyre!("Explorer API returned HTTP {}", status));
        }

        response
            .json::<ExplorerEnvelope>()
            .await
            .map_err(|e| eyre::eyre!("Failed to decode explorer response: {}", e))
    }

    /// Proxy-module calls answer with a hex string in `result`.
    async fn proxy_hex(&self, chain: Chain, params: &[(&str, String)]) -> eyre::Result<Bytes> {
        let envelope = self.query(chain, params).await?;
        if let Some(error) = envelope.error {
            return Err(eyre::eyre!("Explorer proxy error: {}", error));
        }
        match envelope.result.as_str() {
            Some(hex_str) if hex_str.starts_with("0x") => Bytes::from_str(hex_str)
                .map_err(|e| eyre::eyre!("Invalid hex in explorer result: {}", e)),
            Some(other) => Err(eyre::eyre!("Explorer proxy returned: {}", other)),
            None => Err(eyre::eyre!("Explorer proxy returned no result")),
        }
    }
}

/// Turn an explorer envelope into logs. Status strings mean "no results".
fn parse_logs(chain: Chain, envelope: ExplorerEnvelope) -> Vec<RawApprovalLog> {
    if let Some(message) = envelope.result.as_str() {
        tracing::info!(chain = %chain, message, "Explorer returned message instead of logs");
        return Vec::new();
    }

    let status = envelope.status.as_deref().unwrap_or("");
    let message = envelope.message.as_deref().unwrap_or("");
    if status != "1" && message != "No records found" {
        tracing::info!(chain = %chain, status, message, "Explorer returned non-success status");
        return Vec::new();
    }

    let entries: Vec<ExplorerLog> = match serde_json::from_value(envelope.result) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(chain = %chain, error = %e, "Failed to parse explorer logs");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let token = Address::from_str(&entry.address).ok()?;
            let topics = entry
                .topics
                .iter()
                .map(|t| B256::from_str(t))
                .collect::<Result<Vec<_>, _>>()
                .ok()?;
            let data = Bytes::from_str(&entry.data).unwrap_or_default();
            let block_number = entry
                .block_number
                .as_deref()
                .and_then(|b| u64::from_str_radix(b.trim_start_matches("0x"), 16).ok());
            Some(RawApprovalLog {
                token,
                topics,
                data,
                block_number,
            })
        })
        .collect()
}

#[async_trait]
impl ChainDataSource for ExplorerSource {
    fn name(&self) -> &str {
        "explorer"
    }

    fn supports(&self, chain: Chain) -> bool {
        chain.explorer_chain_id().is_some()
    }

    async fn approval_logs(&self, chain: Chain, owner: Address) -> eyre::Result<Vec<RawApprovalLog>> {
        let params = [
            ("module", "logs".to_string()),
            ("action", "getLogs".to_string()),
            ("fromBlock", "0".to_string()),
            ("toBlock", "latest".to_string()),
            ("topic0", format!("{:#x}", Approval::SIGNATURE_HASH)),
            ("topic1", format!("{:#x}", owner.into_word())),
        ];
        let envelope = self.query(chain, &params).await?;
        Ok(parse_logs(chain, envelope))
    }

    async fn bytecode(&self, chain: Chain, address: Address) -> eyre::Result<Bytes> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_getCode".to_string()),
            ("address", format!("{:#x}", address)),
            ("tag", "latest".to_string()),
        ];
        self.proxy_hex(chain, &params).await
    }

    async fn call(&self, chain: Chain, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let params = [
            ("module", "proxy".to_string()),
            ("action", "eth_call".to_string()),
            ("to", format!("{:#x}", to)),
            ("data", format!("0x{}", hex::encode(&data))),
            ("tag", "latest".to_string()),
        ];
        self.proxy_hex(chain, &params).await
    }
}
