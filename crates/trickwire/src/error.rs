//! Top-level error type.

use trickwire_session::SessionError;
use trickwire_transport::TransportError;

/// Anything that can go wrong setting up or driving a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
