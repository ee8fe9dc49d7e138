use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::config::SwapConfig;
use crate::error::{Result, SwapError};
use crate::pricing::{
    BinanceSource, GeckoTerminalSource, LogStatusSink, PriceFeed, PriceSource, PriceStatus,
    RefreshOutcome, StatusSink,
};
use crate::types::{AssetSpec, PriceQuote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRefresh {
    pub base: RefreshOutcome,
    pub quote: RefreshOutcome,
}

impl QuoteRefresh {
    pub fn failures(&self) -> Vec<&str> {
        [&self.base, &self.quote]
            .into_iter()
            .filter_map(|outcome| match outcome {
                RefreshOutcome::Failed(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn refreshed(&self) -> bool {
        matches!(self.base, RefreshOutcome::Refreshed(_))
            || matches!(self.quote, RefreshOutcome::Refreshed(_))
    }
}

/// Latest base/quote USD prices, one independently refreshed feed per asset.
pub struct QuoteCache {
    base_asset: AssetSpec,
    quote_asset: AssetSpec,
    base: PriceFeed,
    quote: PriceFeed,
    status: Arc<dyn StatusSink>,
}

impl QuoteCache {
    pub fn new(
        base_asset: AssetSpec,
        quote_asset: AssetSpec,
        base: PriceFeed,
        quote: PriceFeed,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            base_asset,
            quote_asset,
            base,
            quote,
            status,
        }
    }

    pub fn from_config(config: &SwapConfig, status: Arc<dyn StatusSink>) -> Result<Self> {
        let interval = Duration::from_std(config.refresh_interval)
            .map_err(|err| SwapError::Config(format!("invalid refresh interval: {err}")))?;
        let base_source: Arc<dyn PriceSource> = Arc::new(BinanceSource::from_config(
            &config.prices,
            config.request_timeout,
        )?);
        let quote_source: Arc<dyn PriceSource> = Arc::new(GeckoTerminalSource::from_config(
            &config.prices,
            config.request_timeout,
        )?);

        let base_asset = AssetSpec::sol();
        let quote_asset = AssetSpec::nova();
        Ok(Self::new(
            base_asset.clone(),
            quote_asset.clone(),
            PriceFeed::new(
                base_asset.symbol,
                base_source,
                interval,
                config.fallback_base_price_usd,
            ),
            PriceFeed::new(
                quote_asset.symbol,
                quote_source,
                interval,
                config.fallback_quote_price_usd,
            ),
            status,
        ))
    }

    pub fn with_log_status(config: &SwapConfig) -> Result<Self> {
        Self::from_config(config, Arc::new(LogStatusSink))
    }

    pub fn base_asset(&self) -> &AssetSpec {
        &self.base_asset
    }

    pub fn quote_asset(&self) -> &AssetSpec {
        &self.quote_asset
    }

    /// Never touches the network; falls back to the hardcoded prices until a fetch succeeds.
    pub fn get_quote(&self) -> PriceQuote {
        let base = self.base.price();
        let quote = self.quote.price();
        PriceQuote {
            base_asset_price_usd: base.usd,
            quote_asset_price_usd: quote.usd,
            fetched_at: base.fetched_at.min(quote.fetched_at),
        }
    }

    /// Both feeds were fetched within their refresh interval.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.base.is_stale(now) && !self.quote.is_stale(now)
    }

    pub fn status_line(&self) -> String {
        self.get_quote()
            .status_line(&self.base_asset, &self.quote_asset)
    }

    #[instrument(skip(self))]
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> QuoteRefresh {
        let (base, quote) = futures::join!(
            self.base.refresh_if_stale(now),
            self.quote.refresh_if_stale(now)
        );
        let refresh = QuoteRefresh { base, quote };

        let failures = refresh.failures();
        if !failures.is_empty() {
            self.status.publish(PriceStatus::Failed(failures.join("\n")));
        } else if refresh.refreshed() {
            let line = self.status_line();
            debug!(status = %line, "quote refreshed");
            self.status.publish(PriceStatus::Updated(line));
        }

        refresh
    }

    pub fn spawn_refresher(self: Arc<Self>, every: StdDuration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval_ms = every.as_millis() as u64, "price refresher started");
            loop {
                ticker.tick().await;
                self.refresh_if_stale(Utc::now()).await;
            }
        })
    }
}
