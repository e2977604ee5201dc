use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::core::broker::MessageBroker;
use crate::core::directory::UserDirectory;
use crate::core::ingest::Ingest;
use crate::core::registry::RoomRegistry;

use super::{ingest, socket};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<UserDirectory>,
    pub registry: Arc<RoomRegistry>,
    pub broker: Arc<dyn MessageBroker>,
    pub ingest: Ingest,

    /// Depth of each new connection's outbound channel.
    pub outbound_capacity: usize,
}

impl AppState {
    pub fn new(
        directory: Arc<UserDirectory>,
        registry: Arc<RoomRegistry>,
        broker: Arc<dyn MessageBroker>,
        outbound_capacity: usize,
    ) -> Self {
        let ingest = Ingest::new(directory.clone(), broker.clone());
        Self { directory, registry, broker, ingest, outbound_capacity }
    }
}

/// Builds the relay's HTTP surface: message ingestion and the room socket.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/messages", post(ingest::submit_message))
        .route("/rooms/{room_id}/socket", get(socket::room_socket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
