use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use std::time::Duration;

use super::types::{AnalyzeRequest, AnalyzerResponse, DecompileRequest, DecompilerResponse};
use crate::chain::Chain;
use crate::config::AnalysisConfig;

/// Bytecode decompiler collaborator.
#[async_trait]
pub trait Decompiler: Send + Sync {
    async fn decompile(&self, bytecode: &Bytes) -> eyre::Result<DecompilerResponse>;
}

/// Security analyzer collaborator.
#[async_trait]
pub trait SecurityAnalyzer: Send + Sync {
    async fn analyze(&self, address: Address, chain: Chain, bytecode: &Bytes) -> eyre::Result<AnalyzerResponse>;
}

fn http_client(timeout: Duration) -> eyre::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| eyre::eyre!("Failed to build HTTP client: {}", e))
}

/// POST `body` as JSON and decode a JSON reply, surfacing non-200 bodies.
async fn post_json<B, T>(client: &reqwest::Client, url: &str, service: &str, body: &B) -> eyre::Result<T>
where
    B: serde::Serialize + ?Sized,
    T: serde::de::DeserializeOwned,
{
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| eyre::eyre!("{} request failed: {}", service, e))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(eyre::eyre!("{} error ({}): {}", service, status.as_u16(), text));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| eyre::eyre!("Failed to decode {} response: {}", service, e))
}

pub struct HttpDecompiler {
    client: reqwest::Client,
    url: String,
}

impl HttpDecompiler {
    pub fn new(base_url: &str, timeout: Duration) -> eyre::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url: format!("{}/analyze", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> eyre::Result<Self> {
        Self::new(&config.decompiler_url, Duration::from_secs(config.service_timeout_secs))
    }
}

#[async_trait]
impl Decompiler for HttpDecompiler {
    async fn decompile(&self, bytecode: &Bytes) -> eyre::Result<DecompilerResponse> {
        tracing::debug!(bytes = bytecode.len(), "Sending bytecode to decompiler");
        let request = DecompileRequest {
            bytecode: hex::encode(bytecode),
        };
        post_json(&self.client, &self.url, "decompiler", &request).await
    }
}

pub struct HttpSecurityAnalyzer {
    client: reqwest::Client,
    url: String,
}

impl HttpSecurityAnalyzer {
    pub fn new(base_url: &str, timeout: Duration) -> eyre::Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url: format!("{}/api/analyze", base_url.trim_end_matches('/')),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> eyre::Result<Self> {
        Self::new(&config.analyzer_url, Duration::from_secs(config.service_timeout_secs))
    }
}

#[async_trait]
impl SecurityAnalyzer for HttpSecurityAnalyzer {
    async fn analyze(&self, address: Address, chain: Chain, bytecode: &Bytes) -> eyre::Result<AnalyzerResponse> {
        tracing::debug!(%address, chain = %chain, "Sending contract to analyzer");
        let request = AnalyzeRequest {
            address: format!("{:#x}", address),
            chain,
            bytecode: hex::encode(bytecode),
        };
        post_json(&self.client, &self.url, "analyzer", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_built_from_base_url() {
        let d = HttpDecompiler::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(d.url, "http://localhost:3000/analyze");
        let a = HttpSecurityAnalyzer::new("http://localhost:5000", Duration::from_secs(5)).unwrap();
        assert_eq!(a.url, "http://localhost:5000/api/analyze");
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(DecompileRequest {
            bytecode: hex::encode([0x60u8, 0x80]),
        })
        .unwrap();
        assert_eq!(body["bytecode"], "6080");

        let body = serde_json::to_value(AnalyzeRequest {
            address: "0xabc".to_string(),
            chain: Chain::Base,
            bytecode: String::new(),
        })
        .unwrap();
        assert_eq!(body["chain"], "base");
    }
}
