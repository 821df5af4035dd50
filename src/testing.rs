//! In-memory doubles for provider and analysis-service traits.

use alloy::primitives::{address, Address, Bytes, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::analysis::services::{Decompiler, SecurityAnalyzer};
use crate::analysis::types::{AnalyzerResponse, DecompilerResponse};
use crate::chain::Chain;
use crate::sources::decoder::Approval;
use crate::sources::{ChainDataSource, RawApprovalLog};
use alloy::sol_types::SolEvent;

pub const OWNER: Address = address!("1111111111111111111111111111111111111111");

/// A well-formed Approval log from `OWNER`.
pub fn approval_log(token: Address, spender: Address, value: U256) -> RawApprovalLog {
    RawApprovalLog {
        token,
        topics: vec![Approval::SIGNATURE_HASH, OWNER.into_word(), spender.into_word()],
        data: Bytes::from(value.to_be_bytes::<32>().to_vec()),
        block_number: Some(1),
    }
}

/// Distinct logs for identity comparisons.
pub fn sample_log(n: u8) -> RawApprovalLog {
    approval_log(Address::repeat_byte(n), Address::repeat_byte(0xee), U256::from(n))
}

/// Scripted `ChainDataSource` that counts its calls.
#[derive(Default)]
pub struct ScriptedSource {
    name: String,
    logs: Vec<RawApprovalLog>,
    failure: Option<String>,
    failing_chains: HashMap<Chain, String>,
    hanging_chains: HashMap<Chain, Duration>,
    chains: Option<Vec<Chain>>,
    code: Bytes,
    code_by_address: HashMap<Address, Bytes>,
    call_output: Bytes,
    approval_calls: AtomicUsize,
    bytecode_calls: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_logs(mut self, logs: Vec<RawApprovalLog>) -> Self {
        self.logs = logs;
        self
    }

    /// Every operation on every chain errors with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn failing_chain(mut self, chain: Chain, message: &str) -> Self {
        self.failing_chains.insert(chain, message.to_string());
        self
    }

    /// Approval queries on `chain` sleep for `delay` before answering.
    pub fn hanging_chain(mut self, chain: Chain, delay: Duration) -> Self {
        self.hanging_chains.insert(chain, delay);
        self
    }

    pub fn only_chains(mut self, chains: Vec<Chain>) -> Self {
        self.chains = Some(chains);
        self
    }

    pub fn with_code(mut self, code: Bytes) -> Self {
        self.code = code;
        self
    }

    pub fn with_code_for(mut self, address: Address, code: Bytes) -> Self {
        self.code_by_address.insert(address, code);
        self
    }

    pub fn with_call_output(mut self, output: Bytes) -> Self {
        self.call_output = output;
        self
    }

    pub fn approval_calls(&self) -> usize {
        self.approval_calls.load(Ordering::SeqCst)
    }

    pub fn bytecode_calls(&self) -> usize {
        self.bytecode_calls.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, chain: Chain) -> eyre::Result<()> {
        if let Some(ref message) = self.failure {
            return Err(eyre::eyre!("{}", message));
        }
        if let Some(message) = self.failing_chains.get(&chain) {
            return Err(eyre::eyre!("{}", message));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainDataSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, chain: Chain) -> bool {
        self.chains.as_ref().is_none_or(|c| c.contains(&chain))
    }

    async fn approval_logs(&self, chain: Chain, _owner: Address) -> eyre::Result<Vec<RawApprovalLog>> {
        self.approval_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.hanging_chains.get(&chain) {
            tokio::time::sleep(*delay).await;
        }
        self.check(chain)?;
        Ok(self.logs.clone())
    }

    async fn bytecode(&self, chain: Chain, address: Address) -> eyre::Result<Bytes> {
        self.bytecode_calls.fetch_add(1, Ordering::SeqCst);
        self.check(chain)?;
        Ok(self
            .code_by_address
            .get(&address)
            .cloned()
            .unwrap_or_else(|| self.code.clone()))
    }

    async fn call(&self, chain: Chain, _to: Address, _data: Bytes) -> eyre::Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check(chain)?;
        Ok(self.call_output.clone())
    }
}

pub struct MockDecompiler {
    fail: bool,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockDecompiler {
    pub fn ok() -> Self {
        Self {
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::ok()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Decompiler for MockDecompiler {
    async fn decompile(&self, bytecode: &Bytes) -> eyre::Result<DecompilerResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(eyre::eyre!("decompiler error (500): internal"));
        }
        Ok(DecompilerResponse {
            success: true,
            opcodes: vec!["PUSH1".to_string(); bytecode.len().min(4)],
            complexity: bytecode.len() as u32,
            ..DecompilerResponse::default()
        })
    }
}

pub struct MockAnalyzer {
    score: Option<u32>,
    calls: AtomicUsize,
}

impl MockAnalyzer {
    pub fn scoring(score: u32) -> Self {
        Self {
            score: Some(score),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            score: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecurityAnalyzer for MockAnalyzer {
    async fn analyze(&self, _address: Address, _chain: Chain, _bytecode: &Bytes) -> eyre::Result<AnalyzerResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.score {
            Some(score) => Ok(AnalyzerResponse {
                risk_score: score,
                risk_level: if score >= 70 { "critical" } else { "low" }.to_string(),
                ..AnalyzerResponse::default()
            }),
            None => Err(eyre::eyre!("analyzer request failed: connection refused")),
        }
    }
}
