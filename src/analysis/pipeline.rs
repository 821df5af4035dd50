use alloy::primitives::Address;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::services::{Decompiler, SecurityAnalyzer};
use super::types::ContractAnalysisResult;
use crate::cache::ExpiringCache;
use crate::chain::Chain;
use crate::error::EngineError;
use crate::sources::ChainDataSource;

/// Cache-checked bytecode fetch, decompile and security analysis.
///
/// Only the bytecode fetch can fail the pipeline. A failed decompile or
/// analysis leaves its field empty and the result is still cached.
pub struct ContractAnalyzer {
    source: Arc<dyn ChainDataSource>,
    decompiler: Arc<dyn Decompiler>,
    analyzer: Arc<dyn SecurityAnalyzer>,
    cache: ExpiringCache<(Chain, Address), ContractAnalysisResult>,
}

impl ContractAnalyzer {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        decompiler: Arc<dyn Decompiler>,
        analyzer: Arc<dyn SecurityAnalyzer>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            source,
            decompiler,
            analyzer,
            cache: ExpiringCache::new(cache_ttl),
        }
    }

    pub async fn analyze(&self, address: Address, chain: Chain) -> Result<ContractAnalysisResult, EngineError> {
        let key = (chain, address);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(chain = %chain, %address, "Analysis cache hit");
            return Ok(cached);
        }

        let bytecode = self
            .source
            .bytecode(chain, address)
            .await
            .map_err(|e| EngineError::Bytecode {
                chain,
                message: e.to_string(),
            })?;
        if bytecode.is_empty() {
            tracing::info!(chain = %chain, %address, "No bytecode at address");
            return Err(EngineError::NotAContract);
        }

        let decompilation = match self.decompiler.decompile(&bytecode).await {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::warn!(chain = %chain, %address, error = %e, "Decompiler stage failed, continuing");
                None
            }
        };

        let security_report = match self.analyzer.analyze(address, chain, &bytecode).await {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(chain = %chain, %address, error = %e, "Analyzer stage failed, continuing");
                None
            }
        };

        let result = ContractAnalysisResult {
            address,
            chain,
            bytecode_size: bytecode.len(),
            overall_risk: security_report.as_ref().map(|r| r.risk_score).unwrap_or(0),
            decompilation,
            security_report,
            analyzed_at: Utc::now(),
        };

        self.cache.set(key, result.clone()).await;
        tracing::info!(
            chain = %chain,
            %address,
            bytes = result.bytecode_size,
            risk = result.overall_risk,
            "Contract analysis complete"
        );
        Ok(result)
    }
}
