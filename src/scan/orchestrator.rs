use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::time::Instant;

use super::rate_limit::RateLimiter;
use super::recommendations;
use crate::approvals::reducer::{is_unlimited, reduce};
use crate::approvals::types::{Approval, ChainStatus, WalletScanResult};
use crate::chain::Chain;
use crate::risk::classifier::{aggregate, classify};
use crate::sources::decoder::decode_approval_log;
use crate::sources::ChainDataSource;
use crate::spenders::registry::SpenderRegistry;
use crate::tokens::registry::{format_allowance, TokenResolver};

/// Drives one wallet scan across a chain list, one chain at a time.
pub struct Scanner {
    source: Arc<dyn ChainDataSource>,
    tokens: Arc<TokenResolver>,
    spenders: Arc<SpenderRegistry>,
    limiter: Arc<dyn RateLimiter>,
}

impl Scanner {
    pub fn new(
        source: Arc<dyn ChainDataSource>,
        tokens: Arc<TokenResolver>,
        spenders: Arc<SpenderRegistry>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            source,
            tokens,
            spenders,
            limiter,
        }
    }

    /// Scan `chains` in order. A failing chain is reported as degraded with zero
    /// approvals; the scan itself never fails. Chains still pending at
    /// `deadline` are degraded as timed out and the partial result is returned.
    pub async fn scan(&self, wallet: Address, chains: &[Chain], deadline: Instant) -> WalletScanResult {
        let started = Utc::now();
        let mut approvals = Vec::new();
        let mut chain_status = Vec::with_capacity(chains.len());

        tracing::info!(wallet = %wallet, chains = chains.len(), "Starting wallet scan");

        for &chain in chains {
            let attempt = if Instant::now() >= deadline {
                None
            } else {
                tokio::time::timeout_at(deadline, async {
                    self.limiter.acquire().await;
                    self.scan_chain(chain, wallet, started).await
                })
                .await
                .ok()
            };

            match attempt {
                None => {
                    tracing::warn!(chain = %chain, wallet = %wallet, "Scan deadline reached, skipping chain");
                    chain_status.push(ChainStatus::Degraded {
                        chain,
                        error: "timed out".to_string(),
                    });
                }
                Some(Ok(found)) => {
                    tracing::info!(chain = %chain, wallet = %wallet, approvals = found.len(), "Chain scanned");
                    chain_status.push(ChainStatus::Ok {
                        chain,
                        approvals: found.len(),
                    });
                    approvals.extend(found);
                }
                Some(Err(e)) => {
                    tracing::warn!(chain = %chain, wallet = %wallet, error = %e, "Chain scan failed, continuing");
                    chain_status.push(ChainStatus::Degraded {
                        chain,
                        error: e.to_string(),
                    });
                }
            }
        }

        let totals = aggregate(approvals.iter().map(|a| (a.risk_level, a.risk_score)));
        let recommendations =
            recommendations::generate(&approvals, chains, totals.critical, totals.overall_score);

        tracing::info!(
            wallet = %wallet,
            approvals = approvals.len(),
            critical = totals.critical,
            warnings = totals.warnings,
            score = totals.overall_score,
            "Wallet scan complete"
        );

        WalletScanResult {
            wallet_address: wallet,
            scan_timestamp: started,
            overall_risk_score: totals.overall_score,
            total_approvals: approvals.len(),
            critical_risks: totals.critical,
            warnings: totals.warnings,
            chains_scanned: chains.to_vec(),
            chain_status,
            approvals,
            contract_risks: Vec::new(),
            recommendations,
        }
    }

    /// Fetch, decode, reduce and classify one chain's approvals.
    async fn scan_chain(
        &self,
        chain: Chain,
        wallet: Address,
        captured_at: DateTime<Utc>,
    ) -> eyre::Result<Vec<Approval>> {
        let logs = self.source.approval_logs(chain, wallet).await?;
        let events = reduce(logs.iter().filter_map(decode_approval_log));

        tracing::debug!(chain = %chain, raw = logs.len(), active = events.len(), "Reduced approval events");

        let mut approvals = Vec::with_capacity(events.len());
        for event in events {
            let token_symbol = self.tokens.resolve_symbol(chain, event.token).await;
            let decimals = self.tokens.registry().decimals(&event.token);
            let spender = self.spenders.lookup(&event.spender);
            let unlimited = is_unlimited(event.allowance);
            let assessment = classify(spender.tier, unlimited, spender.unresolved);

            approvals.push(Approval {
                chain,
                token_address: event.token,
                token_symbol,
                spender_address: event.spender,
                spender_name: spender.name,
                allowance_raw: event.allowance,
                allowance_human: format_allowance(event.allowance, decimals),
                is_unlimited: unlimited,
                risk_level: assessment.level,
                risk_reasons: assessment.reasons,
                risk_score: assessment.score,
                last_updated: captured_at,
            });
        }

        Ok(approvals)
    }
}
