use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::chain::Chain;
use crate::risk::classifier::TrustTier;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub spenders: SpenderConfig,
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_true() -> bool {
    true
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_api_port(),
            host: default_api_host(),
        }
    }
}

fn default_api_port() -> u16 {
    8080
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

// ============================================================
// Provider Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub primary: PrimaryProviderConfig,
    #[serde(default)]
    pub secondary: SecondaryProviderConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PrimaryProviderConfig {
    /// Chain name to JSON-RPC URL. Values may reference `${ENV_VAR}`.
    #[serde(default)]
    pub rpc: BTreeMap<String, String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
}

impl Default for PrimaryProviderConfig {
    fn default() -> Self {
        Self {
            rpc: BTreeMap::new(),
            request_timeout_secs: default_request_timeout(),
            call_timeout_secs: default_call_timeout(),
        }
    }
}

impl PrimaryProviderConfig {
    /// Parsed chains with their env-expanded URLs.
    pub fn endpoints(&self) -> eyre::Result<Vec<(Chain, String)>> {
        self.rpc
            .iter()
            .map(|(name, url)| {
                let chain = Chain::from_str(name)
                    .map_err(|_| eyre::eyre!("Unknown chain '{}' in [providers.primary.rpc]", name))?;
                Ok((chain, expand_env(url)?))
            })
            .collect()
    }
}

fn default_request_timeout() -> u64 {
    60
}

fn default_call_timeout() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecondaryProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_explorer_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SecondaryProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_explorer_url(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_explorer_url() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

// ============================================================
// Scan Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimiterKind {
    #[default]
    FixedDelay,
    TokenBucket,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_chain_delay_ms")]
    pub chain_delay_ms: u64,
    #[serde(default)]
    pub rate_limiter: RateLimiterKind,
    #[serde(default = "default_bucket_capacity")]
    pub bucket_capacity: u32,
    #[serde(default = "default_refill_per_sec")]
    pub refill_per_sec: f64,
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_symbol_cache_ttl")]
    pub symbol_cache_ttl_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            chain_delay_ms: default_chain_delay_ms(),
            rate_limiter: RateLimiterKind::default(),
            bucket_capacity: default_bucket_capacity(),
            refill_per_sec: default_refill_per_sec(),
            timeout_secs: default_scan_timeout(),
            symbol_cache_ttl_secs: default_symbol_cache_ttl(),
        }
    }
}

fn default_chain_delay_ms() -> u64 {
    100
}

fn default_bucket_capacity() -> u32 {
    5
}

fn default_refill_per_sec() -> f64 {
    10.0
}

fn default_scan_timeout() -> u64 {
    30
}

fn default_symbol_cache_ttl() -> u64 {
    300
}

// ============================================================
// Analysis Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_decompiler_url")]
    pub decompiler_url: String,
    #[serde(default = "default_analyzer_url")]
    pub analyzer_url: String,
    #[serde(default = "default_request_timeout")]
    pub service_timeout_secs: u64,
    #[serde(default = "default_analysis_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_analyze_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            decompiler_url: default_decompiler_url(),
            analyzer_url: default_analyzer_url(),
            service_timeout_secs: default_request_timeout(),
            cache_ttl_secs: default_analysis_cache_ttl(),
            timeout_secs: default_analyze_timeout(),
            batch_timeout_secs: default_batch_timeout(),
        }
    }
}

fn default_decompiler_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_analyzer_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_analysis_cache_ttl() -> u64 {
    600
}

fn default_analyze_timeout() -> u64 {
    60
}

fn default_batch_timeout() -> u64 {
    120
}

// ============================================================
// Spenders, Tokens & Logging
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SpenderConfig {
    pub watchlist_path: Option<String>,
    #[serde(default)]
    pub labels: Vec<SpenderLabelConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SpenderLabelConfig {
    pub address: String,
    pub name: String,
    #[serde(default = "default_label_tier")]
    pub tier: String,
}

fn default_label_tier() -> String {
    "trusted".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: String,
    pub decimals: u8,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

/// Replace every `${VAR}` with the variable's value.
fn expand_env(raw: &str) -> eyre::Result<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| eyre::eyre!("Unterminated ${{...}} in '{}'", raw))?;
        let name = &after[..end];
        let value = std::env::var(name)
            .map_err(|_| eyre::eyre!("Environment variable '{}' referenced in config is not set", name))?;
        out.push_str(&value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn is_hex_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .is_some_and(|d| d.len() == 40 && d.chars().all(|c| c.is_ascii_hexdigit()))
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `PORT`, `ETHERSCAN_API_KEY`, `DECOMPILER_URL`, `ANALYZER_URL` and
    /// `LOG_FORMAT` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
            self.api.port = port;
        }
        if let Ok(key) = std::env::var("ETHERSCAN_API_KEY") {
            self.providers.secondary.api_key = key;
        }
        if let Ok(url) = std::env::var("DECOMPILER_URL") {
            self.analysis.decompiler_url = url;
        }
        if let Ok(url) = std::env::var("ANALYZER_URL") {
            self.analysis.analyzer_url = url;
        }
        if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
            self.logging.format = LogFormat::Json;
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        if self.providers.primary.rpc.is_empty() {
            return Err(eyre::eyre!("At least one primary RPC endpoint must be configured"));
        }
        for name in self.providers.primary.rpc.keys() {
            if Chain::from_str(name).is_err() {
                return Err(eyre::eyre!("Unknown chain '{}' in [providers.primary.rpc]", name));
            }
        }
        for token in &self.tokens {
            if !is_hex_address(&token.address) {
                return Err(eyre::eyre!(
                    "Invalid token address '{}' for {}",
                    token.address,
                    token.symbol
                ));
            }
        }
        for label in &self.spenders.labels {
            if !is_hex_address(&label.address) {
                return Err(eyre::eyre!(
                    "Invalid spender label address '{}' for {}",
                    label.address,
                    label.name
                ));
            }
            TrustTier::from_str(&label.tier)?;
        }
        if self.scan.symbol_cache_ttl_secs == 0 || self.analysis.cache_ttl_secs == 0 {
            return Err(eyre::eyre!("Cache TTLs must be greater than zero"));
        }
        if self.scan.rate_limiter == RateLimiterKind::TokenBucket
            && (self.scan.bucket_capacity == 0
                || !self.scan.refill_per_sec.is_finite()
                || self.scan.refill_per_sec <= 0.0)
        {
            return Err(eyre::eyre!(
                "Token bucket needs a non-zero bucket_capacity and a finite positive refill_per_sec"
            ));
        }
        Ok(())
    }
}
