use serde::{Deserialize, Serialize};

use crate::core::message::Message;

/// Frame written to a client for each relayed message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundFrame {
    pub sender: String,
    pub content: String,
}

impl From<Message> for OutboundFrame {
    fn from(message: Message) -> Self {
        Self { sender: message.sender_name, content: message.content }
    }
}
