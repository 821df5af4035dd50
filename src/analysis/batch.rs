use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::pipeline::ContractAnalyzer;
use super::types::{BatchItemError, BatchReport, ContractAnalysisResult};
use crate::chain::{parse_address, Chain};
use crate::error::EngineError;

pub const MAX_BATCH_SIZE: usize = 10;

/// One contract in a batch request. `chain` defaults to ethereum.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItem {
    pub address: String,
    #[serde(default)]
    pub chain: Option<String>,
}

type Slot = Option<Result<ContractAnalysisResult, String>>;

/// Runs the analysis pipeline for every batch item concurrently.
pub struct BatchCoordinator {
    analyzer: Arc<ContractAnalyzer>,
}

impl BatchCoordinator {
    pub fn new(analyzer: Arc<ContractAnalyzer>) -> Self {
        Self { analyzer }
    }

    /// Analyze 1 to 10 contracts. Item failures land in `errors`; items still
    /// running when `deadline` passes are aborted and reported as timeouts.
    pub async fn run(&self, items: Vec<BatchItem>, deadline: Duration) -> Result<BatchReport, EngineError> {
        if items.is_empty() {
            return Err(EngineError::EmptyBatch);
        }
        if items.len() > MAX_BATCH_SIZE {
            return Err(EngineError::BatchTooLarge {
                max: MAX_BATCH_SIZE,
                got: items.len(),
            });
        }

        let total = items.len();
        let slots: Arc<Mutex<Vec<Slot>>> = Arc::new(Mutex::new(vec![None; total]));
        let mut tasks = JoinSet::new();

        for (index, item) in items.iter().cloned().enumerate() {
            let analyzer = self.analyzer.clone();
            let slots = slots.clone();
            tasks.spawn(async move {
                let outcome = analyze_item(&analyzer, &item).await.map_err(|e| e.to_string());
                slots.lock().await[index] = Some(outcome);
            });
        }

        let drained = tokio::time::timeout(deadline, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Batch analysis task failed");
                }
            }
        })
        .await;

        let timed_out = drained.is_err();
        if timed_out {
            tracing::warn!(total, deadline_secs = deadline.as_secs(), "Batch deadline reached, aborting pending items");
            tasks.abort_all();
        }

        let slots = slots.lock().await;
        let mut report = BatchReport {
            total,
            ..BatchReport::default()
        };

        for (item, slot) in items.iter().zip(slots.iter()) {
            let outcome = match slot {
                Some(outcome) => outcome.clone(),
                None if timed_out => Err(EngineError::Timeout {
                    operation: "contract analysis",
                    after: deadline,
                }
                .to_string()),
                None => Err("analysis task aborted".to_string()),
            };
            match outcome {
                Ok(result) => report.results.push(result),
                Err(error) => report.errors.push(BatchItemError {
                    address: item.address.clone(),
                    chain: item.chain.clone().unwrap_or_else(|| Chain::Ethereum.to_string()),
                    error,
                }),
            }
        }

        report.success = report.results.len();
        report.failed = report.errors.len();
        tracing::info!(total, success = report.success, failed = report.failed, "Batch analysis complete");
        Ok(report)
    }
}

async fn analyze_item(analyzer: &ContractAnalyzer, item: &BatchItem) -> Result<ContractAnalysisResult, EngineError> {
    let chain = match item.chain.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(raw) => Chain::from_str(raw)?,
        None => Chain::Ethereum,
    };
    let address = parse_address(&item.address)?;
    analyzer.analyze(address, chain).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockAnalyzer, MockDecompiler, ScriptedSource};
    use alloy::primitives::{Address, Bytes};
    use tokio::time::Instant;

    fn coordinator(source: ScriptedSource, decompiler: MockDecompiler) -> BatchCoordinator {
        let analyzer = ContractAnalyzer::new(
            Arc::new(source),
            Arc::new(decompiler),
            Arc::new(MockAnalyzer::scoring(20)),
            Duration::from_secs(600),
        );
        BatchCoordinator::new(Arc::new(analyzer))
    }

    fn item(address: Address, chain: Option<&str>) -> BatchItem {
        BatchItem {
            address: format!("{:#x}", address),
            chain: chain.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_size_limits() {
        let batch = coordinator(ScriptedSource::new("rpc"), MockDecompiler::ok());
        assert!(matches!(
            batch.run(vec![], Duration::from_secs(5)).await,
            Err(EngineError::EmptyBatch)
        ));

        let eleven = (0..11u8).map(|i| item(Address::repeat_byte(i + 1), None)).collect();
        assert!(matches!(
            batch.run(eleven, Duration::from_secs(5)).await,
            Err(EngineError::BatchTooLarge { max: 10, got: 11 })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_isolated_and_concurrent() {
        let code = Bytes::from_static(&[0x60, 0x80]);
        let mut source = ScriptedSource::new("rpc").with_code(Bytes::new());
        let mut items = Vec::new();
        for i in 1..=7u8 {
            let address = Address::repeat_byte(i);
            // Four contracts with code, three EOAs.
            if i <= 4 {
                source = source.with_code_for(address, code.clone());
            }
            items.push(item(address, Some("ethereum")));
        }

        let batch = coordinator(source, MockDecompiler::ok().with_delay(Duration::from_secs(1)));
        let start = Instant::now();
        let report = batch.run(items, Duration::from_secs(120)).await.unwrap();

        assert_eq!(report.total, 7);
        assert_eq!(report.success, 4);
        assert_eq!(report.failed, 3);
        assert!(report.errors.iter().all(|e| e.error.contains("no bytecode")));
        // Four one-second decompiles overlap.
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_invalid_items_become_item_errors() {
        let source = ScriptedSource::new("rpc").with_code(Bytes::from_static(&[0x60]));
        let batch = coordinator(source, MockDecompiler::ok());
        let report = batch
            .run(
                vec![
                    item(Address::repeat_byte(1), None),
                    item(Address::repeat_byte(2), Some("solana")),
                    BatchItem {
                        address: "0x1234".to_string(),
                        chain: None,
                    },
                ],
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        assert_eq!(report.success, 1);
        assert_eq!(report.results[0].chain, Chain::Ethereum);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].chain, "solana");
        assert!(report.errors[1].error.contains("invalid address"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_reports_pending_items_as_timeouts() {
        let source = ScriptedSource::new("rpc").with_code(Bytes::from_static(&[0x60]));
        let batch = coordinator(source, MockDecompiler::ok().with_delay(Duration::from_secs(30)));
        let report = batch
            .run(
                vec![item(Address::repeat_byte(1), None), item(Address::repeat_byte(2), None)],
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.failed, 2);
        assert!(report.errors.iter().all(|e| e.error.contains("timed out")));
    }
}
