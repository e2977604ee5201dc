use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc::Sender;
use tracing::debug;

use crate::core::error::JoinError;
use crate::core::message::{ConnectionId, Message, RoomId, UserId};

/// A room never holds more than this many live connections.
pub const ROOM_CAPACITY: usize = 2;

/// One live connection as the registry sees it: its identity and the bounded
/// channel the dispatcher writes deliveries into. The registry entry owns
/// the connection; no connection outlives its socket.
#[derive(Debug, Clone)]
pub struct Member {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub outbound: Sender<Message>,
}

#[derive(Debug, Default)]
struct RoomSlot {
    members: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct SlotState {
    list: Vec<Member>,
    // Set once the last member left and the slot is being unlinked from the
    // map. A closed slot never admits another member.
    closed: bool,
}

/// Tracks who is currently reachable in each room. This is the single source
/// of truth for delivery decisions; producers never cache member lists.
///
/// The outer map lock is only held for O(1) slot lookup or unlink. Membership
/// mutation takes the per-room mutex, so rooms never contend with each other.
/// Every operation is synchronous; no lock is held across an await point.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<RoomSlot>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a connection into a room, or rejects it when the room already
    /// holds [`ROOM_CAPACITY`] members. Atomic with respect to concurrent
    /// joins on the same room: of two racing join attempts at a single free
    /// slot, exactly one is admitted.
    pub fn join(&self, room_id: RoomId, member: Member) -> Result<(), JoinError> {
        loop {
            let slot = {
                let mut rooms = self.rooms.write().expect("room registry lock poisoned");
                Arc::clone(rooms.entry(room_id).or_default())
            };

            let mut state = slot.members.lock().expect("room slot lock poisoned");
            if state.closed {
                // Raced the teardown of this room. Unlink the dead slot (the
                // leaver may not have gotten to it yet) and retry against a
                // fresh one.
                drop(state);
                self.unlink_if_current(room_id, &slot);
                continue;
            }
            if state.list.len() >= ROOM_CAPACITY {
                return Err(JoinError::RoomFull(room_id));
            }
            state.list.push(member);
            return Ok(());
        }
    }

    /// Removes a connection from a room, tearing the room down when it was
    /// the last member. A no-op when the connection is not currently
    /// registered, so racing close paths are harmless.
    pub fn leave(&self, room_id: RoomId, connection_id: ConnectionId) {
        let slot = {
            let rooms = self.rooms.read().expect("room registry lock poisoned");
            match rooms.get(&room_id) {
                Some(slot) => Arc::clone(slot),
                None => return,
            }
        };

        let emptied = {
            let mut state = slot.members.lock().expect("room slot lock poisoned");
            let before = state.list.len();
            state.list.retain(|m| m.connection_id != connection_id);
            if state.list.len() == before {
                return;
            }
            if state.list.is_empty() {
                state.closed = true;
                true
            } else {
                false
            }
        };

        if emptied {
            self.unlink_if_current(room_id, &slot);
            debug!(room=%room_id, "last member left, room torn down");
        }
    }

    /// Snapshot of the room's current members. Dispatch iterates the copy,
    /// unaffected by joins or leaves that start after it is taken.
    pub fn members_of(&self, room_id: RoomId) -> Vec<Member> {
        let slot = {
            let rooms = self.rooms.read().expect("room registry lock poisoned");
            match rooms.get(&room_id) {
                Some(slot) => Arc::clone(slot),
                None => return Vec::new(),
            }
        };
        let state = slot.members.lock().expect("room slot lock poisoned");
        if state.closed { Vec::new() } else { state.list.clone() }
    }

    pub fn member_count(&self, room_id: RoomId) -> usize {
        self.members_of(room_id).len()
    }

    // Removes the map entry for `room_id` only while it still points at
    // `slot`; a concurrent join may already have replaced it.
    fn unlink_if_current(&self, room_id: RoomId, slot: &Arc<RoomSlot>) {
        let mut rooms = self.rooms.write().expect("room registry lock poisoned");
        if let Some(current) = rooms.get(&room_id) {
            if Arc::ptr_eq(current, slot) {
                rooms.remove(&room_id);
            }
        }
    }
}
