use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceStatus {
    Updated(String),
    Failed(String),
}

impl PriceStatus {
    pub fn message(&self) -> &str {
        match self {
            Self::Updated(message) | Self::Failed(message) => message.as_str(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Where the quote cache reports what a page would show in its price status element.
pub trait StatusSink: Send + Sync {
    fn publish(&self, status: PriceStatus);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn publish(&self, status: PriceStatus) {
        match status {
            PriceStatus::Updated(message) => info!(status = %message, "price status"),
            PriceStatus::Failed(message) => warn!(status = %message, "price status"),
        }
    }
}

#[derive(Debug)]
pub struct WatchStatusSink {
    sender: watch::Sender<Option<PriceStatus>>,
}

impl WatchStatusSink {
    pub fn new() -> (Self, watch::Receiver<Option<PriceStatus>>) {
        let (sender, receiver) = watch::channel(None);
        (Self { sender }, receiver)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PriceStatus>> {
        self.sender.subscribe()
    }
}

impl StatusSink for WatchStatusSink {
    fn publish(&self, status: PriceStatus) {
        self.sender.send_replace(Some(status));
    }
}
