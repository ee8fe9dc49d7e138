pub mod config;
pub mod convert;
pub mod error;
pub mod pricing;
pub mod proxy;
pub mod trade;
pub mod transport;
pub mod types;
pub mod wallet;

pub use config::{ProxyConfig, SwapConfig};
pub use convert::{Converter, Debouncer};
pub use error::{Result, SwapError};
pub use pricing::QuoteCache;
pub use trade::{LogTradeStatusSink, SubmitOptions, SwapDesk, TradeStatusSink};
pub use types::{AssetSpec, AssetSymbol, PriceQuote, SwapSide, TradeStatus};
pub use wallet::{WalletConnection, WalletProvider};
