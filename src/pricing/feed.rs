use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::pricing::PriceSource;
use crate::types::{is_fresh, AssetSymbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedPrice {
    pub usd: Decimal,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Fresh,
    InFlight,
    Refreshed(CachedPrice),
    Failed(String),
}

/// Cached USD price of a single asset, refreshed from one source at most once per interval.
pub struct PriceFeed {
    symbol: AssetSymbol,
    source: Arc<dyn PriceSource>,
    interval: Duration,
    current: RwLock<CachedPrice>,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PriceFeed {
    pub fn new(
        symbol: AssetSymbol,
        source: Arc<dyn PriceSource>,
        interval: Duration,
        fallback_usd: Decimal,
    ) -> Self {
        Self {
            symbol,
            source,
            interval,
            current: RwLock::new(CachedPrice {
                usd: fallback_usd,
                fetched_at: DateTime::<Utc>::UNIX_EPOCH,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn symbol(&self) -> &AssetSymbol {
        &self.symbol
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn price(&self) -> CachedPrice {
        *self.current.read()
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        !is_fresh(self.price().fetched_at, now, self.interval)
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    #[instrument(skip(self), fields(symbol = %self.symbol, source = self.source.name()))]
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> RefreshOutcome {
        if !self.is_stale(now) {
            debug!("using cached price");
            return RefreshOutcome::Fresh;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("refresh already in flight");
            return RefreshOutcome::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        match self.source.fetch_usd_price().await {
            Ok(usd) if usd > Decimal::ZERO => {
                let fresh = CachedPrice {
                    usd,
                    fetched_at: now,
                };
                *self.current.write() = fresh;
                debug!(price = %usd, "price refreshed");
                RefreshOutcome::Refreshed(fresh)
            }
            Ok(usd) => self.failed(format!("non-positive price {usd}")),
            Err(err) => self.failed(err.to_string()),
        }
    }

    fn failed(&self, reason: String) -> RefreshOutcome {
        warn!(symbol = %self.symbol, error = %reason, "price fetch failed");
        RefreshOutcome::Failed(format!(
            "Failed to fetch {} price, using cached value: {reason}",
            self.symbol
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    use chrono::{Duration, Utc};
    use rust_decimal_macros::dec;

    use super::{PriceFeed, RefreshOutcome};
    use crate::pricing::source::testing::ScriptedSource;
    use crate::types::AssetSymbol;

    fn feed(source: Arc<ScriptedSource>) -> PriceFeed {
        PriceFeed::new(AssetSymbol::Sol, source, Duration::seconds(10), dec!(20))
    }

    #[tokio::test]
    async fn first_refresh_is_always_due() {
        let source = Arc::new(ScriptedSource::new("test", vec![Some(dec!(21))]));
        let feed = feed(source.clone());
        let now = Utc::now();

        assert_eq!(feed.price().usd, dec!(20));
        let outcome = feed.refresh_if_stale(now).await;

        assert!(matches!(outcome, RefreshOutcome::Refreshed(price) if price.usd == dec!(21)));
        assert_eq!(feed.price().fetched_at, now);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn fresh_price_skips_the_network() {
        let source = Arc::new(ScriptedSource::new("test", vec![Some(dec!(21))]));
        let feed = feed(source.clone());
        let now = Utc::now();

        feed.refresh_if_stale(now).await;
        let outcome = feed.refresh_if_stale(now + Duration::seconds(9)).await;

        assert_eq!(outcome, RefreshOutcome::Fresh);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn refreshes_once_interval_has_elapsed() {
        let source = Arc::new(ScriptedSource::new(
            "test",
            vec![Some(dec!(21)), Some(dec!(22))],
        ));
        let feed = feed(source.clone());
        let now = Utc::now();

        feed.refresh_if_stale(now).await;
        let later = now + Duration::seconds(10);
        feed.refresh_if_stale(later).await;

        assert_eq!(feed.price().usd, dec!(22));
        assert_eq!(feed.price().fetched_at, later);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn failure_keeps_last_good_price() {
        let source = Arc::new(ScriptedSource::new("test", vec![Some(dec!(21)), None]));
        let feed = feed(source);
        let now = Utc::now();

        feed.refresh_if_stale(now).await;
        let outcome = feed.refresh_if_stale(now + Duration::seconds(30)).await;

        match outcome {
            RefreshOutcome::Failed(message) => {
                assert!(message.starts_with("Failed to fetch SOL price"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(feed.price().usd, dec!(21));
        assert_eq!(feed.price().fetched_at, now);
        assert!(!feed.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_refreshes_share_one_fetch() {
        let source = Arc::new(
            ScriptedSource::new("test", vec![Some(dec!(25))]).with_delay(StdDuration::from_millis(50)),
        );
        let feed = feed(source.clone());
        let now = Utc::now();

        let (first, second) = tokio::join!(feed.refresh_if_stale(now), feed.refresh_if_stale(now));

        assert!(matches!(first, RefreshOutcome::Refreshed(_)));
        assert_eq!(second, RefreshOutcome::InFlight);
        assert_eq!(source.calls(), 1);
        assert!(!feed.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_refresh_releases_the_in_flight_flag() {
        let source = Arc::new(
            ScriptedSource::new("test", vec![Some(dec!(25))]).with_delay(StdDuration::from_secs(5)),
        );
        let feed = feed(source.clone());
        let now = Utc::now();

        let timed_out =
            tokio::time::timeout(StdDuration::from_millis(10), feed.refresh_if_stale(now)).await;
        assert!(timed_out.is_err());
        assert!(!feed.is_refreshing());

        let outcome = feed.refresh_if_stale(now).await;
        assert!(matches!(outcome, RefreshOutcome::Refreshed(_)));
        assert_eq!(source.calls(), 2);
    }
}
