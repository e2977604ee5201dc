use std::sync::Arc;

use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::message::BrokerEnvelope;
use crate::core::registry::RoomRegistry;

/// What became of one dispatched envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Written to this many member outbound channels.
    Delivered(usize),
    /// The target room had no live members at dispatch time. Observational
    /// only; the producer already received its acceptance.
    NoRecipients,
}

/// Fans one envelope out to the target room's current members.
///
/// Delivery per member is independent and non-blocking: a full or closed
/// outbound channel drops the message for that member alone and never blocks
/// the other. The envelope's originating connection, if any, is skipped.
pub fn dispatch_envelope(registry: &RoomRegistry, envelope: &BrokerEnvelope) -> DispatchOutcome {
    let members = registry.members_of(envelope.routing);
    if members.is_empty() {
        info!(room=%envelope.routing, "no live recipients, message dropped");
        return DispatchOutcome::NoRecipients;
    }

    let mut delivered = 0;
    for member in members {
        if envelope.origin_connection == Some(member.connection_id) {
            continue;
        }
        match member.outbound.try_send(envelope.message.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(
                    room=%envelope.routing,
                    connection=%member.connection_id,
                    "outbound channel full, message dropped for slow connection"
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    room=%envelope.routing,
                    connection=%member.connection_id,
                    "outbound channel closed, connection on its way out"
                );
            }
        }
    }
    DispatchOutcome::Delivered(delivered)
}

/// The single consumer of the broker subscription. Runs until cancelled or
/// the transport closes.
pub struct Dispatcher {
    registry: Arc<RoomRegistry>,

    // Receive envelopes from the broker port
    rx: Receiver<BrokerEnvelope>,
}

impl Dispatcher {
    pub fn new(registry: Arc<RoomRegistry>, rx: Receiver<BrokerEnvelope>) -> Self {
        Self { registry, rx }
    }

    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!("starting relay dispatcher...");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown signal received");
                    break;
                }
                maybe_envelope = self.rx.recv() => {
                    let Some(envelope) = maybe_envelope else { break };
                    let outcome = dispatch_envelope(&self.registry, &envelope);
                    debug!(room=%envelope.routing, ?outcome, "envelope dispatched");
                }
            }
        }
        info!("exited relay dispatcher");
        Ok(())
    }
}
