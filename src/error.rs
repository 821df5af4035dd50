use std::time::Duration;

use crate::chain::Chain;

/// Errors surfaced to callers of the engine.
///
/// Provider and service internals work with `eyre::Result`; only failures that
/// callers have to distinguish are lifted into this enum.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("unsupported chains: {0}")]
    UnsupportedChains(String),

    #[error("no valid chains provided")]
    NoChains,

    #[error("invalid address format: {0}")]
    InvalidAddress(String),

    #[error("no bytecode found (not a contract or EOA)")]
    NotAContract,

    #[error("failed to fetch bytecode on {chain}: {message}")]
    Bytecode { chain: Chain, message: String },

    #[error("no contracts provided")]
    EmptyBatch,

    #[error("max {max} contracts per batch, got {got}")]
    BatchTooLarge { max: usize, got: usize },

    #[error("{operation} timed out after {}s", after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl EngineError {
    /// True when the caller supplied bad input; nothing was sent upstream.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedChain(_)
                | Self::UnsupportedChains(_)
                | Self::NoChains
                | Self::InvalidAddress(_)
                | Self::EmptyBatch
                | Self::BatchTooLarge { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
