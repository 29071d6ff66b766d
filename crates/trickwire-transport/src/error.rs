//! Error types for the transport layer.

/// Errors that can occur on a control or event link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Establishing the connection failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The link has shut down; no further frames will flow.
    #[error("link closed")]
    Closed,

    /// A frame could not be written to the underlying socket.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading key material for [`crate::LinkSecurity`] failed.
    #[error("key file: {0}")]
    KeyFile(#[from] std::io::Error),
}
