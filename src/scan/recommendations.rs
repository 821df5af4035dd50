use crate::approvals::types::Approval;
use crate::chain::Chain;
use crate::risk::classifier::UNRESOLVED_SPENDER_REASON;

const MANY_UNLIMITED: usize = 5;
const MANY_APPROVALS: usize = 20;
const ELEVATED_SCORE: u32 = 50;
const CHAIN_CONSOLIDATE: usize = 10;

/// Ordered advisories for a finished scan.
///
/// `chains` is the traversal order and fixes the order of the per-chain hints.
pub fn generate(
    approvals: &[Approval],
    chains: &[Chain],
    critical: usize,
    overall_score: u32,
) -> Vec<String> {
    let mut out = Vec::new();

    if critical > 0 {
        out.push(format!(
            "🚨 URGENT: Revoke {} critical approvals immediately",
            critical
        ));
    }

    let unlimited = approvals.iter().filter(|a| a.is_unlimited).count();
    if unlimited > 0 {
        out.push(format!(
            "⚠️ You have {} unlimited approvals. Consider setting specific limits.",
            unlimited
        ));
    }
    if unlimited > MANY_UNLIMITED {
        out.push("💡 Use SENTINEL's batch revoke feature to clean up old approvals".to_string());
    }

    let unverified = approvals
        .iter()
        .filter(|a| a.risk_reasons.iter().any(|r| r == UNRESOLVED_SPENDER_REASON))
        .count();
    if unverified > 0 {
        out.push(format!(
            "🔍 {} approvals are to unknown contracts. Verify these are legitimate.",
            unverified
        ));
    }

    if approvals.len() > MANY_APPROVALS {
        out.push(
            "📝 You have many active approvals. Consider periodic cleanup of unused ones."
                .to_string(),
        );
    }

    if overall_score >= ELEVATED_SCORE {
        out.push("🛡️ Your wallet has elevated risk. Review all approvals carefully.".to_string());
    }

    for chain in chains {
        let count = approvals.iter().filter(|a| a.chain == *chain).count();
        if count > CHAIN_CONSOLIDATE {
            out.push(format!(
                "📊 {} approvals on {} - consider consolidating",
                count, chain
            ));
        }
    }

    out
}
