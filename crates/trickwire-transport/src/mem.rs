//! In-memory links for test suites.
//!
//! [`control_pair`] and [`event_pair`] return a client-side link plus a
//! handle playing the server's part. The session and client test suites
//! script entire table sessions through these without a socket in sight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Notify};

use crate::{ControlLink, EventLink, Frame, TransportError};

// ---------------------------------------------------------------------------
// Control pair
// ---------------------------------------------------------------------------

/// In-memory implementation of [`ControlLink`].
pub struct MemControlLink {
    to_server: mpsc::UnboundedSender<Frame>,
    inbound: mpsc::UnboundedReceiver<Frame>,
    notify: Arc<Notify>,
    closed: Arc<AtomicBool>,
}

/// The server's end of an in-memory control channel.
pub struct MemControlServer {
    from_client: mpsc::UnboundedReceiver<Frame>,
    to_client: mpsc::UnboundedSender<Frame>,
    notify: Arc<Notify>,
}

/// Creates a linked control link and server handle.
pub fn control_pair() -> (MemControlLink, MemControlServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();
    let notify = Arc::new(Notify::new());
    let link = MemControlLink {
        to_server: client_tx,
        inbound: client_rx,
        notify: Arc::clone(&notify),
        closed: Arc::new(AtomicBool::new(false)),
    };
    let server = MemControlServer {
        from_client: server_rx,
        to_client: server_tx,
        notify,
    };
    (link, server)
}

impl MemControlServer {
    /// Delivers a reply frame to the client.
    pub fn reply(&self, frame: Frame) {
        if self.to_client.send(frame).is_ok() {
            self.notify.notify_one();
        }
    }

    /// Returns every command frame the client has sent so far.
    pub fn take_sent(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.from_client.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Hangs up: the client's link reports [`TransportError::Closed`] once
    /// its pending queue is drained.
    pub fn hang_up(self) {
        self.notify.notify_one();
        // Dropping `to_client` closes the client's inbound queue.
    }
}

impl ControlLink for MemControlLink {
    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Relaxed) {
            return Err(TransportError::Closed);
        }
        self.to_server
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.inbound.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        self.notify.notify_one();
    }
}

// ---------------------------------------------------------------------------
// Event pair
// ---------------------------------------------------------------------------

/// In-memory implementation of [`EventLink`].
pub struct MemEventLink {
    inbound: mpsc::UnboundedReceiver<Frame>,
    prefix: Option<String>,
    notify: Arc<Notify>,
}

/// The publishing end of an in-memory event channel.
#[derive(Clone)]
pub struct MemPublisher {
    to_client: mpsc::UnboundedSender<Frame>,
    notify: Arc<Notify>,
}

/// Creates a linked event link and publisher handle.
pub fn event_pair() -> (MemEventLink, MemPublisher) {
    let (tx, rx) = mpsc::unbounded_channel();
    let notify = Arc::new(Notify::new());
    let link = MemEventLink {
        inbound: rx,
        prefix: None,
        notify: Arc::clone(&notify),
    };
    let publisher = MemPublisher {
        to_client: tx,
        notify,
    };
    (link, publisher)
}

impl MemPublisher {
    /// Publishes an event frame. Whether the client sees it depends on its
    /// subscription, exactly as with a real pub/sub socket.
    pub fn publish(&self, frame: Frame) {
        if self.to_client.send(frame).is_ok() {
            self.notify.notify_one();
        }
    }
}

impl EventLink for MemEventLink {
    fn subscribe(&mut self, prefix: &str) -> Result<(), TransportError> {
        // Anything published before subscription was never "delivered";
        // discard it so it cannot leak through the filter later.
        while self.inbound.try_recv().is_ok() {}
        self.prefix = Some(prefix.to_owned());
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            let frame = match self.inbound.try_recv() {
                Ok(frame) => frame,
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => {
                    return Err(TransportError::Closed)
                }
            };
            let matches = match (&self.prefix, frame.first()) {
                (Some(prefix), Some(topic)) => topic.starts_with(prefix),
                _ => false,
            };
            if matches {
                return Ok(Some(frame));
            }
        }
    }

    fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.notify)
    }

    fn close(&self) {
        self.notify.notify_one();
    }
}

// =========================================================================
// Tests
// =========================================================================
