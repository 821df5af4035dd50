use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::analysis::batch::{BatchCoordinator, BatchItem};
use crate::analysis::pipeline::ContractAnalyzer;
use crate::analysis::services::{Decompiler, HttpDecompiler, HttpSecurityAnalyzer, SecurityAnalyzer};
use crate::analysis::types::{BatchReport, ContractAnalysisResult};
use crate::approvals::types::WalletScanResult;
use crate::chain::{parse_address, parse_chain_list, Chain};
use crate::config::Config;
use crate::error::EngineError;
use crate::scan::orchestrator::Scanner;
use crate::scan::rate_limit::{self, RateLimiter};
use crate::sources::explorer::ExplorerSource;
use crate::sources::rpc::RpcSource;
use crate::sources::{ChainDataSource, FallbackSource};
use crate::spenders::registry::SpenderRegistry;
use crate::tokens::registry::{TokenRegistry, TokenResolver};

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub scan: Duration,
    pub analyze: Duration,
    pub batch: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            scan: Duration::from_secs(30),
            analyze: Duration::from_secs(60),
            batch: Duration::from_secs(120),
        }
    }
}

/// Everything the engine is assembled from.
pub struct EngineParts {
    pub source: Arc<dyn ChainDataSource>,
    pub decompiler: Arc<dyn Decompiler>,
    pub analyzer: Arc<dyn SecurityAnalyzer>,
    pub tokens: TokenRegistry,
    pub spenders: SpenderRegistry,
    pub limiter: Arc<dyn RateLimiter>,
    pub symbol_cache_ttl: Duration,
    pub analysis_cache_ttl: Duration,
}

/// Entry point for every exposed operation. Validates input before any network
/// call and bounds each operation by its deadline. A scan that reaches its
/// deadline still returns the chains it finished.
pub struct RiskEngine {
    scanner: Scanner,
    analyzer: Arc<ContractAnalyzer>,
    batch: BatchCoordinator,
    deadlines: Deadlines,
}

impl RiskEngine {
    pub fn new(parts: EngineParts, deadlines: Deadlines) -> Self {
        let tokens = Arc::new(TokenResolver::new(
            Arc::new(parts.tokens),
            parts.source.clone(),
            parts.symbol_cache_ttl,
        ));
        let scanner = Scanner::new(
            parts.source.clone(),
            tokens,
            Arc::new(parts.spenders),
            parts.limiter,
        );
        let analyzer = Arc::new(ContractAnalyzer::new(
            parts.source,
            parts.decompiler,
            parts.analyzer,
            parts.analysis_cache_ttl,
        ));

        Self {
            scanner,
            batch: BatchCoordinator::new(analyzer.clone()),
            analyzer,
            deadlines,
        }
    }

    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        let mut sources: Vec<Arc<dyn ChainDataSource>> =
            vec![Arc::new(RpcSource::from_config(&config.providers.primary)?)];
        if config.providers.secondary.enabled {
            if config.providers.secondary.api_key.is_empty() {
                tracing::warn!("Explorer fallback enabled without an API key");
            }
            sources.push(Arc::new(ExplorerSource::from_config(&config.providers.secondary)?));
        }

        let parts = EngineParts {
            source: Arc::new(FallbackSource::new(sources)),
            decompiler: Arc::new(HttpDecompiler::from_config(&config.analysis)?),
            analyzer: Arc::new(HttpSecurityAnalyzer::from_config(&config.analysis)?),
            tokens: TokenRegistry::from_config(&config.tokens)?,
            spenders: SpenderRegistry::from_config(&config.spenders)?,
            limiter: rate_limit::from_config(&config.scan),
            symbol_cache_ttl: Duration::from_secs(config.scan.symbol_cache_ttl_secs),
            analysis_cache_ttl: Duration::from_secs(config.analysis.cache_ttl_secs),
        };
        let deadlines = Deadlines {
            scan: Duration::from_secs(config.scan.timeout_secs),
            analyze: Duration::from_secs(config.analysis.timeout_secs),
            batch: Duration::from_secs(config.analysis.batch_timeout_secs),
        };

        Ok(Self::new(parts, deadlines))
    }

    pub fn supported_chains(&self) -> &'static [Chain] {
        &Chain::ALL
    }

    pub async fn scan_wallet(&self, wallet: &str, chains: Option<&str>) -> Result<WalletScanResult, EngineError> {
        let wallet = parse_address(wallet)?;
        let chains = parse_chain_list(chains)?;
        let deadline = tokio::time::Instant::now() + self.deadlines.scan;
        Ok(self.scanner.scan(wallet, &chains, deadline).await)
    }

    pub async fn analyze_contract(
        &self,
        contract: &str,
        chain: Option<&str>,
    ) -> Result<ContractAnalysisResult, EngineError> {
        let address = parse_address(contract)?;
        let chain = match chain.filter(|c| !c.trim().is_empty()) {
            Some(raw) => raw.parse::<Chain>()?,
            None => Chain::Ethereum,
        };
        with_deadline(
            "contract analysis",
            self.deadlines.analyze,
            self.analyzer.analyze(address, chain),
        )
        .await
    }

    /// Always returns a report for a correctly sized batch; per-item failures and
    /// timeouts are itemized inside it.
    pub async fn analyze_batch(&self, items: Vec<BatchItem>) -> Result<BatchReport, EngineError> {
        self.batch.run(items, self.deadlines.batch).await
    }
}

async fn with_deadline<T, F>(operation: &'static str, after: Duration, fut: F) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, EngineError>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, deadline_secs = after.as_secs(), "Operation deadline exceeded");
            Err(EngineError::Timeout { operation, after })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::rate_limit::FixedDelay;
    use crate::testing::{approval_log, MockAnalyzer, MockDecompiler, ScriptedSource};
    use alloy::primitives::{address, Bytes, U256};

    fn engine(source: ScriptedSource, decompiler: MockDecompiler, deadlines: Deadlines) -> RiskEngine {
        RiskEngine::new(
            EngineParts {
                source: Arc::new(source),
                decompiler: Arc::new(decompiler),
                analyzer: Arc::new(MockAnalyzer::scoring(10)),
                tokens: TokenRegistry::builtin(),
                spenders: SpenderRegistry::builtin(),
                limiter: Arc::new(FixedDelay::new(Duration::from_millis(100))),
                symbol_cache_ttl: Duration::from_secs(300),
                analysis_cache_ttl: Duration::from_secs(600),
            },
            deadlines,
        )
    }

    #[tokio::test]
    async fn test_input_rejected_before_network() {
        let source = ScriptedSource::new("rpc");
        let probe = Arc::new(source);
        let engine = RiskEngine::new(
            EngineParts {
                source: probe.clone(),
                decompiler: Arc::new(MockDecompiler::ok()),
                analyzer: Arc::new(MockAnalyzer::scoring(10)),
                tokens: TokenRegistry::builtin(),
                spenders: SpenderRegistry::builtin(),
                limiter: Arc::new(FixedDelay::new(Duration::ZERO)),
                symbol_cache_ttl: Duration::from_secs(300),
                analysis_cache_ttl: Duration::from_secs(600),
            },
            Deadlines::default(),
        );

        let err = engine.scan_wallet("0x1234", None).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAddress(_)));

        let err = engine
            .scan_wallet("0x1111111111111111111111111111111111111111", Some("ethereum,tron"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedChains(ref s) if s == "tron"));

        let err = engine
            .analyze_contract("0xdac17f958d2ee523a2206206994597c13d831ec7", Some("solana"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedChain(_)));

        assert_eq!(probe.approval_calls(), 0);
        assert_eq!(probe.bytecode_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_selected_chains() {
        let engine = engine(ScriptedSource::new("rpc"), MockDecompiler::ok(), Deadlines::default());
        let result = engine
            .scan_wallet("0x1111111111111111111111111111111111111111", Some("base,ethereum"))
            .await
            .unwrap();
        assert_eq!(result.chains_scanned, vec![Chain::Base, Chain::Ethereum]);
        assert_eq!(result.overall_risk_score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_deadline_returns_partial_result() {
        let deadlines = Deadlines {
            scan: Duration::from_millis(150),
            ..Deadlines::default()
        };
        let engine = engine(ScriptedSource::new("rpc"), MockDecompiler::ok(), deadlines);
        // Three chains at 100ms spacing outlast a 150ms deadline.
        let result = engine
            .scan_wallet(
                "0x1111111111111111111111111111111111111111",
                Some("ethereum,arbitrum,optimism"),
            )
            .await
            .unwrap();
        assert_eq!(result.chains_scanned.len(), 3);
        assert!(!result.chain_status[0].is_degraded());
        assert!(!result.chain_status[1].is_degraded());
        assert!(result.chain_status[2].is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_chain_does_not_discard_finished_chains() {
        let source = ScriptedSource::new("rpc")
            .with_logs(vec![approval_log(
                address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
                address!("7a250d5630b4cf539739df2c5dacb4c659f2488d"),
                U256::from(10),
            )])
            .hanging_chain(Chain::Polygon, Duration::from_secs(60));
        let engine = engine(source, MockDecompiler::ok(), Deadlines::default());
        let result = engine
            .scan_wallet(
                "0x1111111111111111111111111111111111111111",
                Some("ethereum,polygon,base"),
            )
            .await
            .unwrap();
        assert_eq!(result.total_approvals, 1);
        assert_eq!(result.approvals[0].chain, Chain::Ethereum);
        assert!(result.chain_status[1].is_degraded());
        assert!(result.chain_status[2].is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_defaults_to_ethereum_and_times_out() {
        let source = ScriptedSource::new("rpc").with_code(Bytes::from_static(&[0x60]));
        let fast = engine(source, MockDecompiler::ok(), Deadlines::default());
        let result = fast
            .analyze_contract("0xdac17f958d2ee523a2206206994597c13d831ec7", None)
            .await
            .unwrap();
        assert_eq!(result.chain, Chain::Ethereum);

        let deadlines = Deadlines {
            analyze: Duration::from_secs(1),
            ..Deadlines::default()
        };
        let source = ScriptedSource::new("rpc").with_code(Bytes::from_static(&[0x60]));
        let slow = engine(source, MockDecompiler::ok().with_delay(Duration::from_secs(5)), deadlines);
        let err = slow
            .analyze_contract("0xdac17f958d2ee523a2206206994597c13d831ec7", Some("polygon"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { operation: "contract analysis", .. }));
    }
}
