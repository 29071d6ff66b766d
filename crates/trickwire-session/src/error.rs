//! Error types for the session layer.

use trickwire_protocol::ProtocolError;
use trickwire_transport::TransportError;

/// Errors that can occur while driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Encoding or decoding a message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A channel link failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An action was submitted before the session joined a game.
    #[error("not joined to a game yet")]
    NotJoined,
}
