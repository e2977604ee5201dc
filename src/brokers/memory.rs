use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::broker::MessageBroker;
use crate::core::error::BrokerError;
use crate::core::message::BrokerEnvelope;

/// Process-local broker transport: a bounded channel with many producers and
/// the dispatcher as its single consumer. Nothing survives a restart, which
/// is all the relay asks of its transport.
pub struct InMemoryBroker {
    tx: mpsc::Sender<BrokerEnvelope>,
    pending_rx: Mutex<Option<mpsc::Receiver<BrokerEnvelope>>>,
}

impl InMemoryBroker {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self { tx, pending_rx: Mutex::new(Some(rx)) }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, envelope: BrokerEnvelope) -> Result<(), BrokerError> {
        // send only fails once the consumer side is gone
        self.tx.send(envelope).await.map_err(|_| BrokerError::Unavailable)
    }

    fn subscribe(&self) -> Result<mpsc::Receiver<BrokerEnvelope>, BrokerError> {
        self.pending_rx
            .lock()
            .expect("broker subscription lock poisoned")
            .take()
            .ok_or(BrokerError::SubscriptionTaken)
    }
}
