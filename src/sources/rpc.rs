use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{BlockNumberOrTag, Filter, TransactionRequest};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::IntoFuture;
use std::time::Duration;

use super::decoder::Approval;
use super::{ChainDataSource, RawApprovalLog};
use crate::chain::Chain;
use crate::config::PrimaryProviderConfig;

/// Primary provider: one JSON-RPC endpoint per chain.
pub struct RpcSource {
    providers: HashMap<Chain, DynProvider>,
    request_timeout: Duration,
    call_timeout: Duration,
}

impl RpcSource {
    pub fn from_config(config: &PrimaryProviderConfig) -> eyre::Result<Self> {
        let mut providers = HashMap::new();
        for (chain, url) in config.endpoints()? {
            let url = url
                .parse()
                .map_err(|e| eyre::eyre!("Invalid RPC URL for {}: {}", chain, e))?;
            let provider = ProviderBuilder::new().connect_http(url).erased();
            providers.insert(chain, provider);
        }

        tracing::info!(chains = providers.len(), "Primary RPC providers configured");
        Ok(Self {
            providers,
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
        })
    }

    fn provider(&self, chain: Chain) -> eyre::Result<&DynProvider> {
        self.providers
            .get(&chain)
            .ok_or_else(|| eyre::eyre!("No RPC endpoint configured for {}", chain))
    }
}

/// Bound an RPC future by `limit`, flattening transport and timeout errors.
async fn with_timeout<T, E, F>(limit: Duration, what: &str, fut: F) -> eyre::Result<T>
where
    F: IntoFuture<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(eyre::eyre!("{} failed: {}", what, e)),
        Err(_) => Err(eyre::eyre!("{} timed out after {}s", what, limit.as_secs())),
    }
}

#[async_trait]
impl ChainDataSource for RpcSource {
    fn name(&self) -> &str {
        "rpc"
    }

    fn supports(&self, chain: Chain) -> bool {
        self.providers.contains_key(&chain)
    }

    async fn approval_logs(&self, chain: Chain, owner: Address) -> eyre::Result<Vec<RawApprovalLog>> {
        let provider = self.provider(chain)?;

        let filter = Filter::new()
            .event_signature(Approval::SIGNATURE_HASH)
            .topic1(owner.into_word())
            .from_block(BlockNumberOrTag::Earliest)
            .to_block(BlockNumberOrTag::Latest);

        let logs = with_timeout(self.request_timeout, "eth_getLogs", provider.get_logs(&filter)).await?;

        Ok(logs
            .into_iter()
            .map(|log| RawApprovalLog {
                token: log.inner.address,
                topics: log.inner.data.topics().to_vec(),
                data: log.inner.data.data.clone(),
                block_number: log.block_number,
            })
            .collect())
    }

    async fn bytecode(&self, chain: Chain, address: Address) -> eyre::Result<Bytes> {
        let provider = self.provider(chain)?;
        let code = with_timeout(
            self.request_timeout,
            "eth_getCode",
            provider.get_code_at(address),
        )
        .await?;

        tracing::debug!(chain = %chain, %address, bytes = code.len(), "Fetched bytecode");
        Ok(code)
    }

    async fn call(&self, chain: Chain, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let provider = self.provider(chain)?;
        let tx = TransactionRequest::default().with_to(to).with_input(data);
        with_timeout(self.call_timeout, "eth_call", provider.call(tx)).await
    }
}
