use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

use crate::config::PriceSourceConfig;
use crate::error::{Result, SwapError};

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_usd_price(&self) -> Result<Decimal>;
}

#[derive(Debug, Clone)]
pub struct GeckoTerminalSource {
    client: reqwest::Client,
    base_url: String,
    network: String,
    token_address: String,
}

impl GeckoTerminalSource {
    pub fn new(
        base_url: impl Into<String>,
        network: impl Into<String>,
        token_address: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            network: network.into(),
            token_address: token_address.into(),
        })
    }

    pub fn from_config(config: &PriceSourceConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            config.geckoterminal_url.clone(),
            config.geckoterminal_network.clone(),
            config.token_address.clone(),
            timeout,
        )
    }

    fn url(&self) -> String {
        format!(
            "{}/api/v2/simple/networks/{}/token_price/{}",
            self.base_url.trim_end_matches('/'),
            self.network,
            self.token_address
        )
    }
}

#[async_trait]
impl PriceSource for GeckoTerminalSource {
    fn name(&self) -> &str {
        "geckoterminal"
    }

    async fn fetch_usd_price(&self) -> Result<Decimal> {
        let body = get_json(
            self.name(),
            self.client
                .get(self.url())
                .header(ACCEPT, "application/json;version=20230302"),
        )
        .await?;
        debug!(source = self.name(), response = %body, "price response");

        let raw = body
            .pointer("/data/attributes/token_prices")
            .and_then(|prices| prices.get(&self.token_address))
            .ok_or_else(|| {
                SwapError::price_source(self.name(), "token price missing from response")
            })?;
        parse_price(self.name(), raw)
    }
}

#[derive(Debug, Clone)]
pub struct BinanceSource {
    client: reqwest::Client,
    base_url: String,
    symbol: String,
}

impl BinanceSource {
    pub fn new(
        base_url: impl Into<String>,
        symbol: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            symbol: symbol.into(),
        })
    }

    pub fn from_config(config: &PriceSourceConfig, timeout: Duration) -> Result<Self> {
        Self::new(
            config.binance_url.clone(),
            config.binance_symbol.clone(),
            timeout,
        )
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_usd_price(&self) -> Result<Decimal> {
        let url = format!(
            "{}/api/v3/ticker/price",
            self.base_url.trim_end_matches('/')
        );
        let body = get_json(
            self.name(),
            self.client.get(url).query(&[("symbol", self.symbol.as_str())]),
        )
        .await?;
        debug!(source = self.name(), response = %body, "price response");

        let raw = body
            .get("price")
            .ok_or_else(|| SwapError::price_source(self.name(), "price missing from response"))?;
        parse_price(self.name(), raw)
    }
}

async fn get_json(source: &str, request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|err| SwapError::price_source(source, err.to_string()))?;
    if !response.status().is_success() {
        return Err(SwapError::price_source(
            source,
            format!("HTTP error {}", response.status().as_u16()),
        ));
    }
    response
        .json()
        .await
        .map_err(|err| SwapError::price_source(source, format!("malformed response: {err}")))
}

fn parse_price(source: &str, raw: &Value) -> Result<Decimal> {
    let parsed = match raw {
        Value::String(text) => parse_decimal(text),
        Value::Number(number) => parse_decimal(&number.to_string()),
        _ => None,
    };

    match parsed {
        Some(price) if price > Decimal::ZERO => Ok(price),
        Some(price) => Err(SwapError::price_source(
            source,
            format!("non-positive price {price}"),
        )),
        None => Err(SwapError::price_source(
            source,
            format!("unparsable price {raw}"),
        )),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use rust_decimal::Decimal;

    use super::PriceSource;
    use crate::error::{Result, SwapError};

    /// Replays scripted prices; once the script runs out the last entry repeats.
    pub(crate) struct ScriptedSource {
        name: String,
        script: Mutex<VecDeque<Option<Decimal>>>,
        last: Mutex<Option<Decimal>>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        pub(crate) fn new(name: &str, script: Vec<Option<Decimal>>) -> Self {
            Self {
                name: name.to_string(),
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for ScriptedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_usd_price(&self) -> Result<Decimal> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = {
                let mut script = self.script.lock();
                match script.pop_front() {
                    Some(entry) => {
                        *self.last.lock() = entry;
                        entry
                    }
                    None => *self.last.lock(),
                }
            };
            next.ok_or_else(|| SwapError::price_source(&self.name, "HTTP error 500"))
        }
    }
}
