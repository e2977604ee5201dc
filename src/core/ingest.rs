use std::sync::Arc;

use tracing::info;

use crate::core::broker::MessageBroker;
use crate::core::directory::UserDirectory;
use crate::core::error::SubmitError;
use crate::core::message::{BrokerEnvelope, Message};

/// The producer side of the relay: accepts a message from an HTTP caller and
/// publishes it. Strictly a producer; it never consults the room registry,
/// so "a message exists" stays decoupled from "a message is deliverable".
#[derive(Clone)]
pub struct Ingest {
    directory: Arc<UserDirectory>,
    broker: Arc<dyn MessageBroker>,
}

impl Ingest {
    pub fn new(directory: Arc<UserDirectory>, broker: Arc<dyn MessageBroker>) -> Self {
        Self { directory, broker }
    }

    /// Resolves the producer's token, stamps the message with the producer's
    /// assigned room, and publishes. Returns once the transport has accepted
    /// the envelope, not once anyone received it.
    pub async fn submit(&self, content: String, token: &str) -> Result<Message, SubmitError> {
        let user = self.directory.resolve(token)?;
        let message = Message {
            content,
            target_room_id: user.room_id,
            sender_id: user.id,
            sender_name: user.username.clone(),
        };
        self.broker.publish(BrokerEnvelope::new(message.clone(), None)).await?;
        info!(room=%message.target_room_id, sender=%message.sender_id, "message accepted for relay");
        Ok(message)
    }
}
