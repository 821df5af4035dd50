use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Networks the engine knows how to scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    // Ethereum & L2s
    Ethereum,
    Arbitrum,
    Optimism,
    Base,
    Zksync,
    Linea,
    Scroll,
    Zkevm,
    // Alt L1s
    Bsc,
    Polygon,
    Avalanche,
    Fantom,
    Cronos,
    Gnosis,
    Celo,
    Moonbeam,
}

impl Chain {
    pub const ALL: [Chain; 16] = [
        Chain::Ethereum,
        Chain::Arbitrum,
        Chain::Optimism,
        Chain::Base,
        Chain::Zksync,
        Chain::Linea,
        Chain::Scroll,
        Chain::Zkevm,
        Chain::Bsc,
        Chain::Polygon,
        Chain::Avalanche,
        Chain::Fantom,
        Chain::Cronos,
        Chain::Gnosis,
        Chain::Celo,
        Chain::Moonbeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ethereum => "ethereum",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Base => "base",
            Self::Zksync => "zksync",
            Self::Linea => "linea",
            Self::Scroll => "scroll",
            Self::Zkevm => "zkevm",
            Self::Bsc => "bsc",
            Self::Polygon => "polygon",
            Self::Avalanche => "avalanche",
            Self::Fantom => "fantom",
            Self::Cronos => "cronos",
            Self::Gnosis => "gnosis",
            Self::Celo => "celo",
            Self::Moonbeam => "moonbeam",
        }
    }

    /// Numeric chain id used by the block-explorer API, when it covers this chain.
    pub fn explorer_chain_id(&self) -> Option<u64> {
        match self {
            Self::Ethereum => Some(1),
            Self::Arbitrum => Some(42161),
            Self::Optimism => Some(10),
            Self::Polygon => Some(137),
            Self::Gnosis => Some(100),
            Self::Linea => Some(59144),
            Self::Scroll => Some(534352),
            Self::Zksync => Some(324),
            Self::Zkevm => Some(1101),
            Self::Celo => Some(42220),
            Self::Moonbeam => Some(1284),
            Self::Base | Self::Bsc | Self::Avalanche | Self::Fantom | Self::Cronos => None,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Chain::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| EngineError::UnsupportedChain(s.trim().to_string()))
    }
}

/// Parse a comma-separated chain list. `None` or an absent parameter means all chains.
///
/// Duplicates are dropped keeping the first occurrence; any unknown entry rejects
/// the whole list.
pub fn parse_chain_list(raw: Option<&str>) -> Result<Vec<Chain>, EngineError> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(Chain::ALL.to_vec());
    };

    let mut selected = Vec::new();
    let mut invalid = Vec::new();

    for segment in raw.split(',') {
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }
        match Chain::from_str(trimmed) {
            Ok(chain) => {
                if !selected.contains(&chain) {
                    selected.push(chain);
                }
            }
            Err(_) => invalid.push(trimmed.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(EngineError::UnsupportedChains(invalid.join(", ")));
    }
    if selected.is_empty() {
        return Err(EngineError::NoChains);
    }
    Ok(selected)
}

/// Accept only `0x` followed by exactly 40 hex digits.
pub fn parse_address(raw: &str) -> Result<Address, EngineError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .filter(|d| d.len() == 40 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .ok_or_else(|| EngineError::InvalidAddress(trimmed.to_string()))?;

    Address::from_str(digits).map_err(|_| EngineError::InvalidAddress(trimmed.to_string()))
}

/// `0x1234...abcd` display form used when no name is known.
pub fn short_address(address: &Address) -> String {
    let full = format!("{:#x}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}
