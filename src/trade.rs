use std::sync::Arc;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::config::{ConfirmationPolicy, SwapConfig};
use crate::convert::{base_to_quote, parse_amount, quote_to_base};
use crate::error::{Result, SwapError};
use crate::pricing::QuoteCache;
use crate::transport::{retry, HttpTransport, RetryPolicy};
use crate::types::{
    AssetSpec, LatestBlockhash, SignatureStatus, SwapOrder, SwapSide, TradeStatus, WithContext,
};
use crate::wallet::{validate_signature, WalletConnection, WalletProvider};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubmitOptions {
    pub blockhash_retry: RetryPolicy,
    pub confirmation: ConfirmationPolicy,
}

impl From<&SwapConfig> for SubmitOptions {
    fn from(config: &SwapConfig) -> Self {
        Self {
            blockhash_retry: config.blockhash_retry.clone(),
            confirmation: config.confirmation.clone(),
        }
    }
}

/// Where the desk reports what a page would show in its swap status element.
pub trait TradeStatusSink: Send + Sync {
    fn publish(&self, status: TradeStatus);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogTradeStatusSink;

impl TradeStatusSink for LogTradeStatusSink {
    fn publish(&self, status: TradeStatus) {
        if status.is_success() {
            info!(status = %status, "swap status");
        } else {
            warn!(status = %status, "swap status");
        }
    }
}

impl TradeStatusSink for mpsc::UnboundedSender<TradeStatus> {
    fn publish(&self, status: TradeStatus) {
        if self.send(status).is_err() {
            debug!("swap status receiver dropped");
        }
    }
}

enum Confirmation {
    Confirmed,
    Rejected(String),
    TimedOut(u32),
}

/// Connects the wallet, turns an amount into a priced order and follows it to confirmation.
pub struct SwapDesk {
    transport: HttpTransport,
    wallet: Arc<dyn WalletProvider>,
    quotes: Arc<QuoteCache>,
    options: SubmitOptions,
    status: Arc<dyn TradeStatusSink>,
    connection: RwLock<Option<WalletConnection>>,
}

impl SwapDesk {
    pub fn new(
        transport: HttpTransport,
        wallet: Arc<dyn WalletProvider>,
        quotes: Arc<QuoteCache>,
        options: SubmitOptions,
        status: Arc<dyn TradeStatusSink>,
    ) -> Self {
        Self {
            transport,
            wallet,
            quotes,
            options,
            status,
            connection: RwLock::new(None),
        }
    }

    pub fn from_config(
        config: &SwapConfig,
        wallet: Arc<dyn WalletProvider>,
        quotes: Arc<QuoteCache>,
        status: Arc<dyn TradeStatusSink>,
    ) -> Result<Self> {
        let transport = HttpTransport::new(config.rpc_url.clone(), config.request_timeout)?;
        Ok(Self::new(
            transport,
            wallet,
            quotes,
            SubmitOptions::from(config),
            status,
        ))
    }

    pub fn connected_key(&self) -> Option<String> {
        self.connection
            .read()
            .as_ref()
            .map(|connection| connection.public_key().to_string())
    }

    pub async fn connect_wallet(&self) -> TradeStatus {
        let status = match self.wallet.connect().await {
            Ok(connection) => {
                let key = connection.public_key().to_string();
                info!(public_key = %key, "wallet connected");
                *self.connection.write() = Some(connection);
                TradeStatus::WalletConnected(key)
            }
            Err(err) => {
                warn!(error = %err, "wallet connection failed");
                TradeStatus::ConnectionFailed(user_message(&err))
            }
        };
        self.report(status)
    }

    /// Every intermediate and final status goes to the sink; the final one is also returned.
    #[instrument(skip(self, side), fields(side = side.as_str()))]
    pub async fn submit_swap(&self, side: SwapSide, amount_text: &str) -> TradeStatus {
        let status = self.execute(side, amount_text).await;
        self.report(status)
    }

    fn report(&self, status: TradeStatus) -> TradeStatus {
        self.status.publish(status.clone());
        status
    }

    async fn execute(&self, side: SwapSide, amount_text: &str) -> TradeStatus {
        let Some(owner) = self.connected_key() else {
            return TradeStatus::WalletMissing;
        };

        let (input, output) = self.legs(side);
        let Some(amount) = parse_amount(amount_text).filter(|amount| *amount > Decimal::ZERO)
        else {
            return TradeStatus::InvalidAmount(input.symbol.to_string());
        };

        let order = match self.price_order(side, owner, amount, input, output) {
            Ok(order) => order,
            Err(err) => {
                debug!(error = %err, "order rejected");
                return TradeStatus::InvalidAmount(input.symbol.to_string());
            }
        };

        let blockhash = match self.latest_blockhash().await {
            Ok(blockhash) => blockhash,
            Err(err) => return TradeStatus::Failed(user_message(&err)),
        };
        let order = SwapOrder {
            recent_blockhash: blockhash.blockhash,
            ..order
        };

        let signature = match self.send(&order).await {
            Ok(signature) => signature,
            Err(err) => {
                warn!(error = %err, "swap submission failed");
                return TradeStatus::Failed(user_message(&err));
            }
        };
        info!(%signature, "swap transaction sent");
        self.status.publish(TradeStatus::Sent {
            signature: signature.clone(),
        });

        match self.await_confirmation(&signature).await {
            Confirmation::Confirmed => {
                info!(%signature, "swap transaction confirmed");
                TradeStatus::Confirmed { signature }
            }
            Confirmation::Rejected(reason) => TradeStatus::Unconfirmed { signature, reason },
            Confirmation::TimedOut(polls) => TradeStatus::Unconfirmed {
                signature,
                reason: format!("transaction not confirmed after {polls} status checks"),
            },
        }
    }

    pub async fn latest_blockhash(&self) -> Result<LatestBlockhash> {
        let response: WithContext<LatestBlockhash> =
            retry(&self.options.blockhash_retry, "getLatestBlockhash", || {
                self.transport
                    .call("getLatestBlockhash", json!([{ "commitment": "confirmed" }]))
            })
            .await?;
        debug!(blockhash = %response.value.blockhash, "fetched recent blockhash");
        Ok(response.value)
    }

    fn legs(&self, side: SwapSide) -> (&AssetSpec, &AssetSpec) {
        match side {
            SwapSide::Buy => (self.quotes.base_asset(), self.quotes.quote_asset()),
            SwapSide::Sell => (self.quotes.quote_asset(), self.quotes.base_asset()),
        }
    }

    fn price_order(
        &self,
        side: SwapSide,
        owner: String,
        amount: Decimal,
        input: &AssetSpec,
        output: &AssetSpec,
    ) -> Result<SwapOrder> {
        let quote = self.quotes.get_quote();
        let expected_output = match side {
            SwapSide::Buy => base_to_quote(amount, &quote),
            SwapSide::Sell => quote_to_base(amount, &quote),
        }
        .ok_or_else(|| {
            SwapError::InvalidAmount(format!("{} output overflows", output.symbol))
        })?;

        Ok(SwapOrder {
            side,
            owner,
            input_amount: amount,
            input_units: input.to_base_units(amount)?,
            expected_output,
            quote,
            recent_blockhash: String::new(),
        })
    }

    async fn send(&self, order: &SwapOrder) -> Result<String> {
        let signature = self.wallet.sign_and_send(order).await?;
        validate_signature(&signature)
            .map_err(|err| SwapError::Submission(format!("wallet returned {err}")))?;
        Ok(signature)
    }

    async fn await_confirmation(&self, signature: &str) -> Confirmation {
        let ConfirmationPolicy {
            poll_interval,
            max_polls,
        } = self.options.confirmation;

        for poll in 1..=max_polls {
            let statuses: Result<WithContext<Vec<Option<SignatureStatus>>>> = self
                .transport
                .call(
                    "getSignatureStatuses",
                    json!([[signature], { "searchTransactionHistory": true }]),
                )
                .await;

            match statuses {
                Ok(response) => match response.value.into_iter().next().flatten() {
                    Some(status) if status.err.is_some() => {
                        let reason = status.err.map(|err| err.to_string()).unwrap_or_default();
                        warn!(signature, %reason, "transaction failed on chain");
                        return Confirmation::Rejected(format!("transaction failed: {reason}"));
                    }
                    Some(status) if status.is_confirmed() => return Confirmation::Confirmed,
                    _ => debug!(signature, poll, "transaction not confirmed yet"),
                },
                Err(err) => warn!(signature, poll, error = %err, "status check failed"),
            }

            if poll < max_polls {
                tokio::time::sleep(poll_interval).await;
            }
        }

        Confirmation::TimedOut(max_polls)
    }
}

fn user_message(err: &SwapError) -> String {
    match err {
        SwapError::Wallet(message) | SwapError::Submission(message) => message.clone(),
        other => other.to_string(),
    }
}
