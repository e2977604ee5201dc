use thiserror::Error;

use crate::core::message::RoomId;

/// Why a credential failed to resolve. Terminal for the attempted
/// connection or request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid credential")]
    InvalidCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("room {0} already has two members")]
    RoomFull(RoomId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BrokerError {
    /// The transport refused the envelope. Surfaced to the producer so it
    /// can retry; the relay never retries on its behalf.
    #[error("broker transport unavailable")]
    Unavailable,
    /// The single consumer stream was already handed out.
    #[error("broker subscription already taken")]
    SubscriptionTaken,
}

/// Failure of an ingestion submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Broker(#[from] BrokerError),
}
