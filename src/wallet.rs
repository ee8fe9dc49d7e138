use async_trait::async_trait;

use crate::error::{Result, SwapError};
use crate::types::SwapOrder;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

pub const WALLET_NOT_FOUND: &str = "Phantom wallet not found. Please install Phantom extension.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConnection {
    public_key: String,
}

impl WalletConnection {
    pub fn new(public_key: impl Into<String>) -> Result<Self> {
        let public_key = public_key.into();
        decode_base58(&public_key, PUBLIC_KEY_LEN, "public key")?;
        Ok(Self { public_key })
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }
}

/// Browser-extension style wallet. Owns key material, transaction layout and signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn connect(&self) -> Result<WalletConnection>;

    /// Signs the order into a transaction, submits it and returns its base58 signature.
    async fn sign_and_send(&self, order: &SwapOrder) -> Result<String>;
}

/// Stand-in used when no wallet extension is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingWallet;

#[async_trait]
impl WalletProvider for MissingWallet {
    async fn connect(&self) -> Result<WalletConnection> {
        Err(SwapError::Wallet(WALLET_NOT_FOUND.to_string()))
    }

    async fn sign_and_send(&self, _order: &SwapOrder) -> Result<String> {
        Err(SwapError::Wallet(WALLET_NOT_FOUND.to_string()))
    }
}

pub fn validate_signature(signature: &str) -> Result<()> {
    decode_base58(signature, SIGNATURE_LEN, "signature").map(|_| ())
}

fn decode_base58(value: &str, expected_len: usize, what: &str) -> Result<Vec<u8>> {
    let bytes = bs58::decode(value)
        .into_vec()
        .map_err(|err| SwapError::Wallet(format!("invalid {what} {value:?}: {err}")))?;
    if bytes.len() != expected_len {
        return Err(SwapError::Wallet(format!(
            "invalid {what} {value:?}: expected {expected_len} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}


#[cfg(test)]
mod tests {
    use super::testing::{signature, OWNER};
    use super::{validate_signature, MissingWallet, WalletConnection, WalletProvider};
    use crate::config::NOVA_MINT;
    use crate::error::SwapError;

    #[test]
    fn accepts_32_byte_public_keys() {
        let connection = WalletConnection::new(NOVA_MINT).expect("mint is a valid key");
        assert_eq!(connection.public_key(), NOVA_MINT);
        assert!(WalletConnection::new(OWNER).is_ok());
    }

    #[test]
    fn rejects_malformed_public_keys() {
        assert!(matches!(
            WalletConnection::new("not-base58-0OIl"),
            Err(SwapError::Wallet(_))
        ));
        let short = bs58::encode([9_u8; 16]).into_string();
        let err = WalletConnection::new(short).expect_err("16 bytes is too short");
        assert!(err.to_string().contains("expected 32 bytes, got 16"));
    }

    #[test]
    fn validates_signature_length() {
        assert!(validate_signature(&signature(3)).is_ok());
        assert!(validate_signature(OWNER).is_err());
    }

    #[tokio::test]
    async fn missing_wallet_reports_not_found() {
        let err = MissingWallet.connect().await.expect_err("no wallet installed");
        assert!(err.to_string().contains("not found"));
    }
}
