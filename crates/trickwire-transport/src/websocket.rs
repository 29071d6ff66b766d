//! WebSocket link implementations using `tokio-tungstenite`.
//!
//! Each link owns two background tasks: a writer draining an outbound
//! queue into the socket, and a reader parsing inbound messages into
//! [`Frame`]s and pushing them onto an inbound queue. The link handle
//! itself never awaits network I/O, which is what lets `try_recv` honor
//! the non-blocking polling contract.
//!
//! A frame travels as one WebSocket text message holding a JSON array of
//! strings — the parts of the multipart message.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{ControlLink, EventLink, Frame, LinkSecurity, TransportError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Part 0 of the frame a subscriber sends upstream to open a topic filter.
const SUBSCRIBE_TAG: &str = "subscribe";

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// The handle both link types wrap: an outbound queue into the writer task
/// and an inbound queue out of the reader task.
struct WsLink {
    out: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<Frame>,
    notify: Arc<Notify>,
}

impl WsLink {
    async fn connect(
        url: &str,
        security: &LinkSecurity,
    ) -> Result<Self, TransportError> {
        let mut request = url
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        attach_keys(&mut request, security)?;

        let (ws, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!(url, secure = security.is_secure(), "link connected");

        let (sink, stream) = ws.split();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let notify = Arc::new(Notify::new());

        tokio::spawn(write_loop(sink, out_rx));
        tokio::spawn(read_loop(stream, in_tx, Arc::clone(&notify)));

        Ok(Self {
            out: out_tx,
            inbound: in_rx,
            notify,
        })
    }

    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        let text = serde_json::to_string(&frame)
            .map_err(|e| TransportError::Send(e.to_string()))?;
        self.out
            .send(Message::Text(text.into()))
            .map_err(|_| TransportError::Closed)
    }

    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError> {
        match self.inbound.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(TransportError::Closed),
        }
    }

    fn close(&self) {
        // A send failure here means the writer is already gone.
        let _ = self.out.send(Message::Close(None));
        self.notify.notify_one();
    }
}

/// Adds the security key material as headers on the upgrade request.
/// The server rejects the upgrade when the keys don't check out, so a
/// misconfigured client fails at connect time rather than mid-session.
fn attach_keys(
    request: &mut tokio_tungstenite::tungstenite::handshake::client::Request,
    security: &LinkSecurity,
) -> Result<(), TransportError> {
    let pairs = [
        ("x-trickwire-server-key", &security.server_key),
        ("x-trickwire-public-key", &security.public_key),
        ("x-trickwire-secret-key", &security.secret_key),
    ];
    for (name, key) in pairs {
        if let Some(key) = key {
            let value = key
                .parse()
                .map_err(|_| TransportError::Connect(format!("bad {name}")))?;
            request.headers_mut().insert(name, value);
        }
    }
    Ok(())
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut out_rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = out_rx.recv().await {
        let closing = matches!(msg, Message::Close(_));
        if let Err(e) = sink.send(msg).await {
            tracing::error!(error = %e, "link write failed");
            return;
        }
        if closing {
            return;
        }
    }
}

async fn read_loop(
    mut stream: SplitStream<WsStream>,
    in_tx: mpsc::UnboundedSender<Frame>,
    notify: Arc<Notify>,
) {
    while let Some(msg) = stream.next().await {
        let text = match msg {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => {
                match String::from_utf8(data.to_vec()) {
                    Ok(text) => text,
                    Err(_) => {
                        tracing::error!("non-UTF-8 message on link");
                        break;
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            // ping/pong handled by tungstenite
            Ok(_) => continue,
            Err(e) => {
                tracing::error!(error = %e, "link read failed");
                break;
            }
        };
        match serde_json::from_str::<Frame>(&text) {
            Ok(frame) => {
                if in_tx.send(frame).is_err() {
                    return; // link handle dropped
                }
                notify.notify_one();
            }
            Err(e) => {
                // Frame boundaries are gone; treat the link as broken.
                tracing::error!(error = %e, "malformed frame on link");
                break;
            }
        }
    }
    // Dropping in_tx turns subsequent try_recv calls into Closed.
    drop(in_tx);
    notify.notify_one();
}

// ---------------------------------------------------------------------------
// Control link
// ---------------------------------------------------------------------------

/// WebSocket implementation of [`ControlLink`].
pub struct WsControlLink {
    link: WsLink,
}

impl WsControlLink {
    /// Connects the control socket.
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] if the URL is invalid or the
    /// server refuses the upgrade.
    pub async fn connect(
        url: &str,
        security: &LinkSecurity,
    ) -> Result<Self, TransportError> {
        let link = WsLink::connect(url, security).await?;
        Ok(Self { link })
    }
}

impl ControlLink for WsControlLink {
    fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.link.send(frame)
    }

    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError> {
        self.link.try_recv()
    }

    fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.link.notify)
    }

    fn close(&self) {
        self.link.close();
    }
}

// ---------------------------------------------------------------------------
// Event link
// ---------------------------------------------------------------------------

/// WebSocket implementation of [`EventLink`].
///
/// Subscription is expressed upstream with a `subscribe` frame and
/// enforced locally with a topic-prefix filter: anything that arrives
/// before `subscribe` is dropped, matching the pub/sub contract that
/// pre-subscription events are simply never delivered.
pub struct WsEventLink {
    link: WsLink,
    prefix: Option<String>,
}

impl WsEventLink {
    /// Connects the event socket.
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] if the URL is invalid or the
    /// server refuses the upgrade.
    pub async fn connect(
        url: &str,
        security: &LinkSecurity,
    ) -> Result<Self, TransportError> {
        let link = WsLink::connect(url, security).await?;
        Ok(Self { link, prefix: None })
    }
}

impl EventLink for WsEventLink {
    fn subscribe(&mut self, prefix: &str) -> Result<(), TransportError> {
        self.link
            .send(vec![SUBSCRIBE_TAG.to_owned(), prefix.to_owned()])?;
        self.prefix = Some(prefix.to_owned());
        tracing::debug!(prefix, "subscribed to event topic");
        Ok(())
    }

    fn try_recv(&mut self) -> Result<Option<Frame>, TransportError> {
        loop {
            let Some(frame) = self.link.try_recv()? else {
                return Ok(None);
            };
            let matches = match (&self.prefix, frame.first()) {
                (Some(prefix), Some(topic)) => topic.starts_with(prefix),
                _ => false,
            };
            if matches {
                return Ok(Some(frame));
            }
            tracing::trace!(topic = ?frame.first(), "dropping unsubscribed event");
        }
    }

    fn notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.link.notify)
    }

    fn close(&self) {
        self.link.close();
    }
}
