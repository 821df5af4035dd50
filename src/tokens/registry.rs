use alloy::primitives::{address, Address, Bytes, U256};
use bigdecimal::{BigDecimal, ToPrimitive};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::approvals::reducer::is_unlimited;
use crate::cache::ExpiringCache;
use crate::chain::{short_address, Chain};
use crate::config::TokenConfig;
use crate::sources::decoder::{decode_abi_string, SYMBOL_SELECTOR};
use crate::sources::ChainDataSource;

pub const DEFAULT_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMeta {
    pub symbol: String,
    pub decimals: u8,
}

const KNOWN_TOKENS: &[(Address, &str, u8)] = &[
    // Stablecoins
    (address!("dac17f958d2ee523a2206206994597c13d831ec7"), "USDT", 6),
    (address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), "USDC", 6),
    (address!("6b175474e89094c44da98b954eedeac495271d0f"), "DAI", 18),
    (address!("4fabb145d64652a948d72533023f6e7a623c7c53"), "BUSD", 18),
    (address!("853d955acef822db058eb8505911ed77f175b99e"), "FRAX", 18),
    // Wrapped
    (address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"), "WETH", 18),
    (address!("2260fac5e5542a773aa44fbcfedf7c193bc2c599"), "WBTC", 8),
    // DeFi
    (address!("1f9840a85d5af5bf1d1762f925bdaddc4201f984"), "UNI", 18),
    (address!("7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9"), "AAVE", 18),
    (address!("514910771af9ca656af840dff83e8264ecf986ca"), "LINK", 18),
    (address!("d533a949740bb3306d119cc777fa900ba034cd52"), "CRV", 18),
    (address!("c00e94cb662c3520282e6f5717214004a7f26888"), "COMP", 18),
    (address!("9f8f72aa9304c8b593d555f12ef6589cc3a579a2"), "MKR", 18),
    (address!("6b3595068778dd592e39a122f4f5a5cf09c90fe2"), "SUSHI", 18),
    (address!("0bc529c00c6401aef6d220be8c6ea1667f6ad93e"), "YFI", 18),
    (address!("ba100000625a3754423978a60c9317c58a424e3d"), "BAL", 18),
    // Meme
    (address!("95ad61b0a150d79219dcf64e1e6cc01f0b64c4ce"), "SHIB", 18),
    (address!("4d224452801aced8b2f0aebe155379bb5d594381"), "APE", 18),
    (address!("6982508145454ce325ddbe47a25d4ec3d2311933"), "PEPE", 18),
    // L2 and sidechain natives
    (address!("912ce59144191c1204e64559fe8253a0e49e6548"), "ARB", 18),
    (address!("82af49447d8a07e3bd95bd0d56f35241523fbab1"), "WETH (Arb)", 18),
    (address!("4200000000000000000000000000000000000042"), "OP", 18),
    (address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"), "USDC (Base)", 6),
    (address!("0d500b1d8e8ef31e21c99d1db9a6444d3adf1270"), "WMATIC", 18),
    (address!("7ceb23fd6bc0add59e62ac25578270cff1b9f619"), "WETH (Polygon)", 18),
];

/// Immutable token lookup table, built once at startup.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: HashMap<Address, TokenMeta>,
}

impl TokenRegistry {
    pub fn builtin() -> Self {
        let tokens = KNOWN_TOKENS
            .iter()
            .map(|(address, symbol, decimals)| {
                (
                    *address,
                    TokenMeta {
                        symbol: symbol.to_string(),
                        decimals: *decimals,
                    },
                )
            })
            .collect();
        Self { tokens }
    }

    /// Built-in table plus tokens from config. Config entries override built-ins.
    pub fn from_config(extra: &[TokenConfig]) -> eyre::Result<Self> {
        let mut registry = Self::builtin();
        for token in extra {
            let address = Address::from_str(&token.address).map_err(|e| {
                eyre::eyre!("Invalid token address '{}' for {}: {}", token.address, token.symbol, e)
            })?;
            registry.tokens.insert(
                address,
                TokenMeta {
                    symbol: token.symbol.clone(),
                    decimals: token.decimals,
                },
            );
            tracing::debug!(symbol = %token.symbol, address = %token.address, "Registered token from config");
        }
        Ok(registry)
    }

    pub fn get(&self, token: &Address) -> Option<&TokenMeta> {
        self.tokens.get(token)
    }

    pub fn decimals(&self, token: &Address) -> u8 {
        self.get(token).map(|t| t.decimals).unwrap_or(DEFAULT_DECIMALS)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Render an allowance for display: "UNLIMITED" above the threshold, otherwise
/// the decimal-adjusted amount with two decimals and a K/M/B suffix.
pub fn format_allowance(amount: U256, decimals: u8) -> String {
    if is_unlimited(amount) {
        return "UNLIMITED".to_string();
    }

    let value = BigDecimal::from_str(&format!("{}e-{}", amount, decimals))
        .ok()
        .and_then(|v| v.to_f64())
        .unwrap_or(0.0);

    if value >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{:.2}", value)
    }
}

/// Resolves token symbols: static table, then the symbol cache, then an on-chain
/// `symbol()` call, then a shortened address.
pub struct TokenResolver {
    registry: Arc<TokenRegistry>,
    source: Arc<dyn ChainDataSource>,
    symbols: ExpiringCache<(Chain, Address), String>,
}

impl TokenResolver {
    pub fn new(registry: Arc<TokenRegistry>, source: Arc<dyn ChainDataSource>, cache_ttl: Duration) -> Self {
        Self {
            registry,
            source,
            symbols: ExpiringCache::new(cache_ttl),
        }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub async fn resolve_symbol(&self, chain: Chain, token: Address) -> String {
        if let Some(meta) = self.registry.get(&token) {
            return meta.symbol.clone();
        }

        let key = (chain, token);
        if let Some(symbol) = self.symbols.get(&key).await {
            return symbol;
        }

        match self
            .source
            .call(chain, token, Bytes::from_static(&SYMBOL_SELECTOR))
            .await
        {
            Ok(output) => {
                let symbol = decode_abi_string(&output);
                if !symbol.is_empty() {
                    self.symbols.set(key, symbol.clone()).await;
                    return symbol;
                }
                tracing::debug!(chain = %chain, %token, "symbol() returned no usable string");
            }
            Err(e) => {
                tracing::debug!(chain = %chain, %token, error = %e, "symbol() call failed");
            }
        }

        short_address(&token)
    }
}
