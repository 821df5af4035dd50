use serde::{Deserialize, Serialize};

/// Final risk bucket shown for an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

/// How much a spender is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Trusted,
    Unknown,
    Malicious,
}

impl std::str::FromStr for TrustTier {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trusted" | "safe" => Ok(Self::Trusted),
            "unknown" | "warning" => Ok(Self::Unknown),
            "malicious" | "critical" | "drainer" => Ok(Self::Malicious),
            other => Err(eyre::eyre!("Unknown trust tier '{}'", other)),
        }
    }
}

pub const MAX_WALLET_SCORE: u32 = 100;

const MALICIOUS_BASE: u32 = 50;
const MALICIOUS_UNLIMITED: u32 = 20;
const TRUSTED_BASE: u32 = 2;
const TRUSTED_UNLIMITED: u32 = 8;
const UNKNOWN_BASE: u32 = 15;
const UNKNOWN_UNLIMITED: u32 = 15;
const UNRESOLVED_SPENDER: u32 = 10;

pub const UNRESOLVED_SPENDER_REASON: &str = "Unknown spender contract";

/// Classification of a single approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub reasons: Vec<String>,
}

/// Classify one approval from the spender's tier and the unlimited flag.
///
/// `spender_unresolved` is set when the spender's display name is still a raw
/// address; it adds to the score but never changes the level.
pub fn classify(tier: TrustTier, is_unlimited: bool, spender_unresolved: bool) -> RiskAssessment {
    let mut reasons = Vec::new();
    if is_unlimited {
        reasons.push("Unlimited approval".to_string());
    }

    let (level, mut score) = match (tier, is_unlimited) {
        (TrustTier::Malicious, unlimited) => {
            reasons.push("Known malicious contract".to_string());
            let mut score = MALICIOUS_BASE;
            if unlimited {
                score += MALICIOUS_UNLIMITED;
                reasons.push("Unlimited allowance to dangerous contract!".to_string());
            }
            (RiskLevel::Critical, score)
        }
        (TrustTier::Trusted, false) => (RiskLevel::Safe, TRUSTED_BASE),
        (TrustTier::Trusted, true) => {
            reasons.push("Unlimited allowance (consider reducing)".to_string());
            (RiskLevel::Warning, TRUSTED_BASE + TRUSTED_UNLIMITED)
        }
        (TrustTier::Unknown, false) => (RiskLevel::Warning, UNKNOWN_BASE),
        (TrustTier::Unknown, true) => {
            reasons.push("Unlimited allowance to unknown contract".to_string());
            (RiskLevel::Critical, UNKNOWN_BASE + UNKNOWN_UNLIMITED)
        }
    };

    if spender_unresolved {
        score += UNRESOLVED_SPENDER;
        reasons.push(UNRESOLVED_SPENDER_REASON.to_string());
    }

    RiskAssessment {
        level,
        score,
        reasons,
    }
}

/// Wallet-level totals derived from final per-approval levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskTotals {
    pub overall_score: u32,
    pub critical: usize,
    pub warnings: usize,
}

/// Sum contributions (saturating at 100) and count each final level once.
pub fn aggregate(items: impl IntoIterator<Item = (RiskLevel, u32)>) -> RiskTotals {
    let mut totals = RiskTotals::default();
    let mut sum: u32 = 0;
    for (level, score) in items {
        sum = sum.saturating_add(score);
        match level {
            RiskLevel::Critical => totals.critical += 1,
            RiskLevel::Warning => totals.warnings += 1,
            RiskLevel::Safe => {}
        }
    }
    totals.overall_score = sum.min(MAX_WALLET_SCORE);
    totals
}
