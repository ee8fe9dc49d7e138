use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::PriceQuote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapSide {
    /// Spend the base asset, receive the quote asset.
    Buy,
    /// Spend the quote asset, receive the base asset.
    Sell,
}

impl SwapSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapOrder {
    pub side: SwapSide,
    pub owner: String,
    pub input_amount: Decimal,
    pub input_units: u64,
    pub expected_output: Decimal,
    pub quote: PriceQuote,
    pub recent_blockhash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeStatus {
    WalletConnected(String),
    ConnectionFailed(String),
    WalletMissing,
    InvalidAmount(String),
    Sent { signature: String },
    Confirmed { signature: String },
    Unconfirmed { signature: String, reason: String },
    Failed(String),
}

impl TradeStatus {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::WalletConnected(_) | Self::Sent { .. } | Self::Confirmed { .. }
        )
    }
}

impl Display for TradeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WalletConnected(key) => write!(f, "Wallet Connected: {key}"),
            Self::ConnectionFailed(reason) => write!(f, "Connection Failed: {reason}"),
            Self::WalletMissing => f.write_str("Please connect your wallet first."),
            Self::InvalidAmount(symbol) => write!(f, "Please enter a valid {symbol} amount."),
            Self::Sent { signature } => write!(f, "Transaction sent! Signature: {signature}"),
            Self::Confirmed { signature } => write!(
                f,
                "Transaction sent! Signature: {signature}\nTransaction confirmed!"
            ),
            Self::Unconfirmed { signature, reason } => write!(
                f,
                "Transaction sent! Signature: {signature}\nSwap transaction error: {reason}"
            ),
            Self::Failed(reason) => write!(f, "Swap transaction error: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SwapSide, TradeStatus};

    #[test]
    fn renders_user_facing_messages() {
        assert_eq!(
            TradeStatus::WalletMissing.to_string(),
            "Please connect your wallet first."
        );
        assert_eq!(
            TradeStatus::InvalidAmount("SOL".to_string()).to_string(),
            "Please enter a valid SOL amount."
        );
        assert_eq!(
            TradeStatus::Confirmed {
                signature: "abc".to_string()
            }
            .to_string(),
            "Transaction sent! Signature: abc\nTransaction confirmed!"
        );
        assert_eq!(
            TradeStatus::Failed("User rejected the request.".to_string()).to_string(),
            "Swap transaction error: User rejected the request."
        );
    }

    #[test]
    fn success_statuses() {
        assert!(TradeStatus::WalletConnected("k".to_string()).is_success());
        assert!(!TradeStatus::WalletMissing.is_success());
        assert!(!TradeStatus::Unconfirmed {
            signature: "s".to_string(),
            reason: "timeout".to_string()
        }
        .is_success());
    }

    #[test]
    fn side_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(SwapSide::Sell).expect("side should serialize"),
            serde_json::json!("sell")
        );
        assert_eq!(SwapSide::Buy.as_str(), "buy");
    }
}
