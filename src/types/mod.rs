mod asset;
mod order;
mod quote;
mod rpc;

pub use asset::{AssetSpec, AssetSymbol};
pub use order::{SwapOrder, SwapSide, TradeStatus};
pub use quote::{is_fresh, PriceQuote, DEFAULT_BASE_PRICE_USD, DEFAULT_QUOTE_PRICE_USD};
pub use rpc::{
    LatestBlockhash, RpcErrorObject, RpcRequest, RpcResponse, SignatureStatus, WithContext,
};
