use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SwapError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetSymbol {
    Sol,
    Nova,
    Custom(String),
}

impl AssetSymbol {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sol => "SOL",
            Self::Nova => "NOVA",
            Self::Custom(symbol) => symbol.as_str(),
        }
    }
}

impl Display for AssetSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetSymbol {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self> {
        let symbol = s.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            return Err(SwapError::Other("asset symbol cannot be empty".to_string()));
        }
        Ok(match symbol.as_str() {
            "SOL" => Self::Sol,
            "NOVA" => Self::Nova,
            _ => Self::Custom(symbol),
        })
    }
}

impl Serialize for AssetSymbol {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssetSymbol {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetSpec {
    pub symbol: AssetSymbol,
    /// Decimal places shown in the linked input fields. Never applied before arithmetic.
    pub display_decimals: u32,
    pub chain_decimals: u32,
}

impl AssetSpec {
    pub fn sol() -> Self {
        Self {
            symbol: AssetSymbol::Sol,
            display_decimals: 6,
            chain_decimals: 9,
        }
    }

    pub fn nova() -> Self {
        Self {
            symbol: AssetSymbol::Nova,
            display_decimals: 2,
            chain_decimals: 9,
        }
    }

    pub fn format_amount(&self, value: Decimal) -> String {
        let rounded = value
            .round_dp_with_strategy(self.display_decimals, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.prec$}", prec = self.display_decimals as usize)
    }

    pub fn to_base_units(&self, amount: Decimal) -> Result<u64> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(SwapError::InvalidAmount(format!(
                "{} amount cannot be negative: {amount}",
                self.symbol
            )));
        }

        let scale = 10_u64
            .checked_pow(self.chain_decimals)
            .ok_or_else(|| SwapError::InvalidAmount("chain decimals out of range".to_string()))?;
        let units = amount
            .checked_mul(Decimal::from(scale))
            .map(|value| value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|value| value.to_u64())
            .ok_or_else(|| {
                SwapError::InvalidAmount(format!("{} amount overflows base units", self.symbol))
            })?;
        Ok(units)
    }
}
