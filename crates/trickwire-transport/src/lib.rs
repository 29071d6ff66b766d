//! Channel abstraction layer for Trickwire.
//!
//! The bridge backend speaks over two independent sockets: a request/reply
//! **control** socket for commands, and a publish/subscribe **event** socket
//! for out-of-band notifications. This crate defines the [`ControlLink`] and
//! [`EventLink`] traits that abstract over concrete transports, plus:
//!
//! - a WebSocket implementation ([`WsControlLink`], [`WsEventLink`]) behind
//!   the `websocket` feature (default), and
//! - an in-memory implementation ([`mem`]) that stands in for the server in
//!   test suites.
//!
//! # Polling model
//!
//! Nothing here blocks on network I/O. Each link owns an inbound queue fed
//! by a background reader task; `try_recv` drains that queue and returns
//! immediately. A single driver task can therefore poll both links from one
//! loop without any shared mutable state.

pub mod mem;
mod error;
mod security;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use security::LinkSecurity;
#[cfg(feature = "websocket")]
pub use websocket::{WsControlLink, WsEventLink};

use std::sync::Arc;

use tokio::sync::Notify;

/// A single message on either channel: an ordered list of UTF-8 parts.
///
/// The first part is a command tag, a reply status, or an event topic;
/// the remainder alternate between argument keys and JSON documents.
/// Interpretation belongs to the protocol layer — the transport moves
/// parts around without looking inside them.
pub type Frame = Vec<String>;

/// The client side of the request/reply control channel.
///
/// Replies arrive in FIFO order per channel; no reordering is attempted
/// at this layer.
pub trait ControlLink: Send + 'static {
    /// Queues a frame for delivery to the server.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`] if the link has shut down.
    fn send(&self, frame: Frame) -> Result<(), TransportError>;

    /// Drains one pending inbound frame, if any.
    ///
    /// Never blocks: `Ok(None)` means nothing is pending right now.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`] once the link has shut down and
    /// its queue is exhausted.
    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError>;

    /// A notifier pinged whenever a new inbound frame becomes available.
    ///
    /// Drivers select on this alongside their periodic tick so frames are
    /// picked up promptly without busy-polling.
    fn notifier(&self) -> Arc<Notify>;

    /// Closes the link. Further sends fail; pending inbound frames may
    /// still be drained.
    fn close(&self);
}

/// The client side of the publish/subscribe event channel.
pub trait EventLink: Send + 'static {
    /// Subscribes to every topic starting with `prefix`.
    ///
    /// Events published before subscription are not delivered — that is a
    /// transport property, nothing is buffered here. Called exactly once
    /// per session, after the game identifier is known.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`] if the link has shut down.
    fn subscribe(&mut self, prefix: &str) -> Result<(), TransportError>;

    /// Drains one pending inbound event frame, if any. Never blocks.
    ///
    /// # Errors
    /// Returns [`TransportError::Closed`] once the link has shut down and
    /// its queue is exhausted.
    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError>;

    /// A notifier pinged whenever a new inbound frame becomes available.
    fn notifier(&self) -> Arc<Notify>;

    /// Closes the link.
    fn close(&self);
}
