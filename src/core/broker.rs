use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;

use crate::core::error::BrokerError;
use crate::core::message::BrokerEnvelope;

/// The publish/subscribe boundary between message producers and the relay
/// dispatcher. Producers only hand envelopes to the transport; delivery to
/// room members is entirely the dispatcher's concern.
///
/// Delivery is at-least-once within a process lifetime. Envelope order
/// matches publish order for a single producer; no order is guaranteed
/// across concurrent producers.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Hands one envelope to the transport. Returns once the transport has
    /// accepted it, not once a subscriber has processed it. Fails with
    /// [`BrokerError::Unavailable`] when the transport is down.
    async fn publish(&self, envelope: BrokerEnvelope) -> Result<(), BrokerError>;

    /// Hands out the consumer end of the subscription. The port is
    /// single-consumer: a second call fails with
    /// [`BrokerError::SubscriptionTaken`].
    fn subscribe(&self) -> Result<Receiver<BrokerEnvelope>, BrokerError>;
}
