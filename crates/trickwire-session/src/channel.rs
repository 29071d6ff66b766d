//! Decode-and-drain wrappers around the two transport links.
//!
//! Each channel carries a fail-stop health flag: the first decode error
//! or link failure marks the channel unhealthy and draining stops. A
//! half-understood stream is worse than a dead one.

use std::sync::Arc;

use tokio::sync::Notify;

use trickwire_protocol::{
    decode_event, decode_reply, encode_command, Command, EventFrame, GameId,
    ReplyFrame,
};
use trickwire_transport::{ControlLink, EventLink, TransportError};

use crate::SessionError;

// ---------------------------------------------------------------------------
// Control channel
// ---------------------------------------------------------------------------

/// The request/reply channel. Commands out, replies in, strictly in
/// submission order.
pub struct RequestChannel<L: ControlLink> {
    link: L,
    healthy: bool,
}

impl<L: ControlLink> RequestChannel<L> {
    pub fn new(link: L) -> Self {
        Self { link, healthy: true }
    }

    /// Whether the channel is still usable. Once false it stays false.
    pub fn healthy(&self) -> bool {
        self.healthy
    }

    /// Wakes when the link has inbound frames ready.
    pub fn notifier(&self) -> Arc<Notify> {
        self.link.notifier()
    }

    /// Encodes and sends a command.
    ///
    /// # Errors
    /// Fails if encoding fails or the link is closed.
    pub fn send(&mut self, cmd: &Command) -> Result<(), SessionError> {
        if !self.healthy {
            return Err(SessionError::Transport(TransportError::Closed));
        }
        let frame = encode_command(cmd)?;
        tracing::debug!(tag = cmd.tag(), parts = frame.len(), "sending command");
        if let Err(err) = self.link.send(frame) {
            self.healthy = false;
            return Err(err.into());
        }
        Ok(())
    }

    /// Drains every reply currently queued, without blocking.
    ///
    /// Stops at the first malformed frame or link failure, returning the
    /// replies decoded so far together with the fault. The channel is
    /// unhealthy afterwards.
    pub fn drain(&mut self) -> (Vec<ReplyFrame>, Option<SessionError>) {
        let mut replies = Vec::new();
        if !self.healthy {
            return (replies, None);
        }
        loop {
            match self.link.try_recv() {
                Ok(Some(frame)) => match decode_reply(&frame) {
                    Ok(reply) => replies.push(reply),
                    Err(err) => {
                        self.healthy = false;
                        return (replies, Some(err.into()));
                    }
                },
                Ok(None) => return (replies, None),
                Err(err) => {
                    self.healthy = false;
                    return (replies, Some(err.into()));
                }
            }
        }
    }

    pub fn close(&self) {
        self.link.close();
    }
}

// ---------------------------------------------------------------------------
// Event channel
// ---------------------------------------------------------------------------

/// The subscription channel. Delivers nothing until [`subscribe`] names
/// the game of interest; events published before that are never seen.
///
/// [`subscribe`]: EventChannel::subscribe
pub struct EventChannel<L: EventLink> {
    link: L,
    subscribed: bool,
    healthy: bool,
}

impl<L: EventLink> EventChannel<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            subscribed: false,
            healthy: true,
        }
    }

    pub fn healthy(&self) -> bool {
        self.healthy
    }

    pub fn notifier(&self) -> Arc<Notify> {
        self.link.notifier()
    }

    /// Starts delivery of events for one game. Called once, after the
    /// join succeeds; repeated calls are ignored.
    ///
    /// # Errors
    /// Fails if the link rejects the subscription.
    pub fn subscribe(&mut self, game: &GameId) -> Result<(), SessionError> {
        if self.subscribed {
            return Ok(());
        }
        self.link.subscribe(&game.0)?;
        self.subscribed = true;
        tracing::info!(%game, "subscribed to game events");
        Ok(())
    }

    /// Drains every event currently queued, without blocking. Empty until
    /// subscribed; fail-stop like [`RequestChannel::drain`].
    pub fn drain(&mut self) -> (Vec<EventFrame>, Option<SessionError>) {
        let mut events = Vec::new();
        if !self.subscribed || !self.healthy {
            return (events, None);
        }
        loop {
            match self.link.try_recv() {
                Ok(Some(frame)) => match decode_event(&frame) {
                    Ok(event) => events.push(event),
                    Err(err) => {
                        self.healthy = false;
                        return (events, Some(err.into()));
                    }
                },
                Ok(None) => return (events, None),
                Err(err) => {
                    self.healthy = false;
                    return (events, Some(err.into()));
                }
            }
        }
    }

    pub fn close(&self) {
        self.link.close();
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use trickwire_protocol::{PlayerId, ReplyStatus};
    use trickwire_transport::mem;

    #[test]
    fn test_drain_is_empty_when_nothing_queued() {
        let (link, _server) = mem::control_pair();
        let mut channel = RequestChannel::new(link);
        let (replies, fault) = channel.drain();
        assert!(replies.is_empty());
        assert!(fault.is_none());
        assert!(channel.healthy());
    }

    #[test]
    fn test_reply_round_trip() {
        let (link, mut server) = mem::control_pair();
        let mut channel = RequestChannel::new(link);
        channel
            .send(&Command::Hello {
                version: "0.1".into(),
                role: "client".into(),
            })
            .unwrap();
        assert_eq!(server.take_sent()[0][0], "bridgehlo");

        server.reply(vec!["success".into(), "bridgehlo".into()]);
        let (replies, fault) = channel.drain();
        assert!(fault.is_none());
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].status, ReplyStatus::Success);
    }

    #[test]
    fn test_malformed_reply_is_fail_stop() {
        let (link, server) = mem::control_pair();
        let mut channel = RequestChannel::new(link);
        server.reply(vec!["success".into(), "bridgehlo".into()]);
        server.reply(vec!["success".into(), "no-such-tag".into()]);
        server.reply(vec!["success".into(), "bridgehlo".into()]);

        let (replies, fault) = channel.drain();
        assert_eq!(replies.len(), 1);
        assert!(fault.is_some());
        assert!(!channel.healthy());

        // Unhealthy channel drains nothing and rejects sends.
        let (replies, fault) = channel.drain();
        assert!(replies.is_empty());
        assert!(fault.is_none());
        assert!(channel
            .send(&Command::Game { game: None })
            .is_err());
    }

    #[test]
    fn test_events_withheld_until_subscribed() {
        let (link, publisher) = mem::event_pair();
        let mut channel = EventChannel::new(link);
        let game = GameId("g1".into());
        publisher.publish(vec![
            "g1:player".into(),
            "player".into(),
            "\"p2\"".into(),
            "position".into(),
            "\"east\"".into(),
        ]);
        assert!(channel.drain().0.is_empty());

        channel.subscribe(&game).unwrap();
        publisher.publish(vec![
            "g1:player".into(),
            "player".into(),
            "\"p2\"".into(),
            "position".into(),
            "\"east\"".into(),
        ]);
        let (events, fault) = channel.drain();
        assert!(fault.is_none());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].game, game);
        assert!(matches!(
            &events[0].event,
            trickwire_protocol::Event::Player { player, .. }
                if *player == PlayerId("p2".into())
        ));
    }
}
