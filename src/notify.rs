use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::warn;

use crate::model::Opening;

const CHANNEL_CAPACITY: usize = 256;

/// New openings for one subscriber at one facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningAlert {
    pub facility: String,
    pub email: String,
    pub openings: Vec<Opening>,
}

/// Broadcast hub the mailer listens on, one channel per facility.
pub struct NotifyHub {
    channels: DashMap<String, broadcast::Sender<OpeningAlert>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to alerts for a facility. Creates the channel if needed.
    pub fn subscribe(&self, facility: &str) -> broadcast::Receiver<OpeningAlert> {
        let sender = self
            .channels
            .entry(facility.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Send an alert. No-op if nobody is listening.
    pub fn send(&self, facility: &str, alert: &OpeningAlert) {
        if let Some(sender) = self.channels.get(facility) {
            let _ = sender.send(alert.clone());
        }
    }

    /// Take every alert currently buffered on `rx` without waiting.
    ///
    /// A receiver that fell more than the channel capacity behind loses the
    /// oldest alerts; that is logged and the rest are still returned.
    pub fn drain(rx: &mut broadcast::Receiver<OpeningAlert>) -> Vec<OpeningAlert> {
        let mut alerts = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(alert) => alerts.push(alert),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "alert listener lagged, oldest alerts dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return alerts,
            }
        }
    }

    /// Drop a facility's channel (e.g. when it is removed from config).
    pub fn remove(&self, facility: &str) {
        self.channels.remove(facility);
    }
}
