use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::convert::DEFAULT_DEBOUNCE;
use crate::error::{Result, SwapError};
use crate::transport::{BackoffStrategy, RetryPolicy};
use crate::types::{DEFAULT_BASE_PRICE_USD, DEFAULT_QUOTE_PRICE_USD};

pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";
pub const NOVA_MINT: &str = "5vjrnc823W14QUvomk96N2yyJYyG92Ccojyku64vofJX";

fn default_rpc_url() -> String {
    #[cfg(feature = "devnet")]
    let url = DEVNET_RPC_URL;

    #[cfg(not(feature = "devnet"))]
    let url = MAINNET_RPC_URL;

    url.to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSourceConfig {
    pub geckoterminal_url: String,
    pub geckoterminal_network: String,
    pub token_address: String,
    pub binance_url: String,
    pub binance_symbol: String,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            geckoterminal_url: "https://api.geckoterminal.com".to_string(),
            geckoterminal_network: "solana".to_string(),
            token_address: NOVA_MINT.to_string(),
            binance_url: "https://api.binance.com".to_string(),
            binance_symbol: "SOLUSDT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwapConfig {
    pub rpc_url: String,
    pub request_timeout: Duration,
    pub prices: PriceSourceConfig,
    pub refresh_interval: Duration,
    pub debounce: Duration,
    pub fallback_base_price_usd: Decimal,
    pub fallback_quote_price_usd: Decimal,
    pub blockhash_retry: RetryPolicy,
    pub confirmation: ConfirmationPolicy,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            request_timeout: Duration::from_secs(10),
            prices: PriceSourceConfig::default(),
            refresh_interval: Duration::from_secs(10),
            debounce: DEFAULT_DEBOUNCE,
            fallback_base_price_usd: DEFAULT_BASE_PRICE_USD,
            fallback_quote_price_usd: DEFAULT_QUOTE_PRICE_USD,
            blockhash_retry: RetryPolicy {
                attempts: 3,
                backoff: BackoffStrategy::Fixed { ms: 1_000 },
            },
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

impl SwapConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(url) = env_string("SWAP_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(ms) = env_parse::<u64>("SWAP_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(url) = env_string("SWAP_GECKOTERMINAL_URL") {
            config.prices.geckoterminal_url = url;
        }
        if let Some(address) = env_string("SWAP_TOKEN_ADDRESS") {
            config.prices.token_address = address;
        }
        if let Some(url) = env_string("SWAP_BINANCE_URL") {
            config.prices.binance_url = url;
        }
        if let Some(symbol) = env_string("SWAP_BINANCE_SYMBOL") {
            config.prices.binance_symbol = symbol;
        }
        if let Some(ms) = env_parse::<u64>("SWAP_REFRESH_INTERVAL_MS") {
            config.refresh_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SWAP_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(price) = env_parse::<Decimal>("SWAP_FALLBACK_BASE_PRICE_USD") {
            config.fallback_base_price_usd = price;
        }
        if let Some(price) = env_parse::<Decimal>("SWAP_FALLBACK_QUOTE_PRICE_USD") {
            config.fallback_quote_price_usd = price;
        }
        if let Some(attempts) = env_parse::<u32>("SWAP_BLOCKHASH_ATTEMPTS") {
            config.blockhash_retry.attempts = attempts;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.trim().is_empty() {
            return Err(SwapError::Config("RPC URL cannot be empty".to_string()));
        }
        if self.refresh_interval.is_zero() {
            return Err(SwapError::Config(
                "refresh interval cannot be zero".to_string(),
            ));
        }
        if self.fallback_base_price_usd <= Decimal::ZERO
            || self.fallback_quote_price_usd <= Decimal::ZERO
        {
            return Err(SwapError::Config(
                "fallback prices must be positive".to_string(),
            ));
        }
        if self.blockhash_retry.attempts == 0 {
            return Err(SwapError::Config(
                "blockhash retry needs at least one attempt".to_string(),
            ));
        }
        if self.prices.token_address.trim().is_empty() {
            return Err(SwapError::Config(
                "token address cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub listen_addr: String,
    pub listen_port: u16,
    pub upstream_url: String,
    pub allowed_origin: String,
    pub upstream_timeout: Duration,
    pub cached_methods: Vec<String>,
    pub cache_ttl: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            upstream_url: default_rpc_url(),
            allowed_origin: "*".to_string(),
            upstream_timeout: Duration::from_secs(15),
            cached_methods: vec![
                "getRecentBlockhash".to_string(),
                "getLatestBlockhash".to_string(),
            ],
            cache_ttl: Duration::from_secs(10),
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(addr) = env_string("PROXY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(port) = env_parse::<u16>("PROXY_LISTEN_PORT") {
            config.listen_port = port;
        }
        if let Some(url) = env_string("PROXY_UPSTREAM_URL") {
            config.upstream_url = url;
        }
        if let Some(origin) = env_string("PROXY_ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }
        if let Some(ms) = env_parse::<u64>("PROXY_UPSTREAM_TIMEOUT_MS") {
            config.upstream_timeout = Duration::from_millis(ms);
        }
        if let Some(methods) = env_string("PROXY_CACHED_METHODS") {
            config.cached_methods = split_list(&methods);
        }
        if let Some(ms) = env_parse::<u64>("PROXY_CACHE_TTL_MS") {
            config.cache_ttl = Duration::from_millis(ms);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_port == 0 {
            return Err(SwapError::Config("listen port cannot be 0".to_string()));
        }
        if self.upstream_url.trim().is_empty() {
            return Err(SwapError::Config(
                "upstream RPC URL cannot be empty".to_string(),
            ));
        }
        if self.allowed_origin.trim().is_empty() {
            return Err(SwapError::Config(
                "allowed origin cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|value| value.parse().ok())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
