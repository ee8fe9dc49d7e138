mod cache;
mod feed;
pub(crate) mod source;
mod status;

pub use cache::{QuoteCache, QuoteRefresh};
pub use feed::{CachedPrice, PriceFeed, RefreshOutcome};
pub use source::{BinanceSource, GeckoTerminalSource, PriceSource};
pub use status::{LogStatusSink, PriceStatus, StatusSink, WatchStatusSink};
