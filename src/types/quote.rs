use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SwapError};
use crate::types::AssetSpec;

pub const DEFAULT_BASE_PRICE_USD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);
pub const DEFAULT_QUOTE_PRICE_USD: Decimal = Decimal::from_parts(123, 0, 0, false, 5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub base_asset_price_usd: Decimal,
    pub quote_asset_price_usd: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(
        base_asset_price_usd: Decimal,
        quote_asset_price_usd: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> Result<Self> {
        ensure_positive("base", base_asset_price_usd)?;
        ensure_positive("quote", quote_asset_price_usd)?;
        Ok(Self {
            base_asset_price_usd,
            quote_asset_price_usd,
            fetched_at,
        })
    }

    /// Hardcoded start-of-process quote. Stamped at the epoch so the first refresh is always due.
    pub fn fallback() -> Self {
        Self {
            base_asset_price_usd: DEFAULT_BASE_PRICE_USD,
            quote_asset_price_usd: DEFAULT_QUOTE_PRICE_USD,
            fetched_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn status_line(&self, base: &AssetSpec, quote: &AssetSpec) -> String {
        format!(
            "{} Price: ${:.6} USD, {} Price: ${:.2} USD",
            quote.symbol, self.quote_asset_price_usd, base.symbol, self.base_asset_price_usd
        )
    }
}

/// A price fetched exactly `interval` ago is already due for a refresh.
pub fn is_fresh(fetched_at: DateTime<Utc>, now: DateTime<Utc>, interval: Duration) -> bool {
    now.signed_duration_since(fetched_at) < interval
}

fn ensure_positive(side: &str, price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(SwapError::Other(format!(
            "{side} asset price must be positive, got {price}"
        )));
    }
    Ok(())
}
