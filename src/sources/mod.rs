pub mod decoder;
pub mod explorer;
pub mod rpc;

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use std::sync::Arc;

use crate::chain::Chain;

/// An approval-changed log as returned by any provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawApprovalLog {
    pub token: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
}

/// A chain-data provider: log queries, code reads and read-only calls.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    fn name(&self) -> &str;

    fn supports(&self, chain: Chain) -> bool;

    /// All historical approval events where `owner` is the approving wallet.
    async fn approval_logs(&self, chain: Chain, owner: Address) -> eyre::Result<Vec<RawApprovalLog>>;

    async fn bytecode(&self, chain: Chain, address: Address) -> eyre::Result<Bytes>;

    async fn call(&self, chain: Chain, to: Address, data: Bytes) -> eyre::Result<Bytes>;
}

/// Ordered list of providers tried one after another.
///
/// Approval queries move on when a provider errors or returns nothing; code
/// reads and calls move on only on error. Providers that do not cover a chain
/// are skipped without counting as a failure.
pub struct FallbackSource {
    sources: Vec<Arc<dyn ChainDataSource>>,
}

impl FallbackSource {
    pub fn new(sources: Vec<Arc<dyn ChainDataSource>>) -> Self {
        Self { sources }
    }

    fn candidates(&self, chain: Chain) -> impl Iterator<Item = &Arc<dyn ChainDataSource>> {
        self.sources.iter().filter(move |s| s.supports(chain))
    }
}

#[async_trait]
impl ChainDataSource for FallbackSource {
    fn name(&self) -> &str {
        "fallback"
    }

    fn supports(&self, chain: Chain) -> bool {
        self.sources.iter().any(|s| s.supports(chain))
    }

    async fn approval_logs(&self, chain: Chain, owner: Address) -> eyre::Result<Vec<RawApprovalLog>> {
        let mut last_error = None;
        let mut any_answered = false;

        for source in self.candidates(chain) {
            match source.approval_logs(chain, owner).await {
                Ok(logs) if !logs.is_empty() => {
                    tracing::info!(
                        chain = %chain,
                        source = source.name(),
                        events = logs.len(),
                        "Fetched approval events"
                    );
                    return Ok(logs);
                }
                Ok(_) => {
                    any_answered = true;
                    tracing::info!(
                        chain = %chain,
                        source = source.name(),
                        "No approval events, trying next provider"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        chain = %chain,
                        source = source.name(),
                        error = %e,
                        "Approval query failed, trying next provider"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    async fn bytecode(&self, chain: Chain, address: Address) -> eyre::Result<Bytes> {
        let mut last_error = None;
        for source in self.candidates(chain) {
            match source.bytecode(chain, address).await {
                Ok(code) => return Ok(code),
                Err(e) => {
                    tracing::warn!(
                        chain = %chain,
                        source = source.name(),
                        error = %e,
                        "Bytecode fetch failed, trying next provider"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| eyre::eyre!("No provider configured for chain {}", chain)))
    }

    async fn call(&self, chain: Chain, to: Address, data: Bytes) -> eyre::Result<Bytes> {
        let mut last_error = None;
        for source in self.candidates(chain) {
            match source.call(chain, to, data.clone()).await {
                Ok(out) => return Ok(out),
                Err(e) => {
                    tracing::debug!(
                        chain = %chain,
                        source = source.name(),
                        error = %e,
                        "Contract call failed, trying next provider"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| eyre::eyre!("No provider configured for chain {}", chain)))
    }
}
