use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one live socket. Minted when a session starts, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provisioned user record. Static configuration: loaded at startup, never
/// mutated. The token maps 1:1 to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub token: String,
    pub room_id: RoomId,
}

/// One chat message. Immutable after creation; cloned per recipient on
/// fan-out. Two distinct messages with identical content are distinct
/// deliveries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub content: String,
    pub target_room_id: RoomId,
    pub sender_id: UserId,
    pub sender_name: String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[room {}] {}: {}",
            self.target_room_id, self.sender_name, self.content
        )
    }
}

/// The unit carried across the broker port: one message plus its routing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerEnvelope {
    pub routing: RoomId,
    pub message: Message,
    // Set when a live socket produced the message; the dispatcher skips this
    // connection on fan-out so the sender's local echo is not duplicated.
    pub origin_connection: Option<ConnectionId>,
}

impl BrokerEnvelope {
    pub fn new(message: Message, origin_connection: Option<ConnectionId>) -> Self {
        Self { routing: message.target_room_id, message, origin_connection }
    }
}
