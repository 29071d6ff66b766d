//! Session identity, lifecycle phase, and the staleness filter.

use trickwire_protocol::{GameId, PlayerId, Seat};

/// Where the handshake stands.
///
/// ```text
/// Disconnected → Handshaking → AwaitingGameId ─┐
///                     │                        ▼
///                     └──────────────────→ Joining → Joined → InDeal
///                                              │
///                                              ▼ (fatal protocol error)
///                                          Terminated
/// ```
///
/// `AwaitingGameId` only occurs for the client that creates the game.
/// `Joined` and `InDeal` alternate for as long as deals are played;
/// `Terminated` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No handshake traffic yet.
    Disconnected,
    /// `bridgehlo` sent, waiting for its reply.
    Handshaking,
    /// Game creation requested, waiting for the assigned id.
    AwaitingGameId,
    /// Join requested, waiting for confirmation.
    Joining,
    /// Subscribed to the game's events; no deal in progress.
    Joined,
    /// A deal is being bid or played.
    InDeal,
    /// Fatal protocol error; the operator must restart the session.
    Terminated,
}

/// One client's session: who we are, which game we are in, and how far
/// the shared counter has advanced.
#[derive(Debug, Clone)]
pub struct Session {
    player: PlayerId,
    preferred_position: Option<Seat>,
    /// Game id requested on the command line, if any.
    requested_game: Option<GameId>,
    /// Whether this client initiates game creation.
    create_game: bool,
    /// Fixed once a create/join reply succeeds.
    game: Option<GameId>,
    /// Set once by the server; never changes afterwards.
    assigned_position: Option<Seat>,
    /// High-water mark of the shared counter space. Replies and events
    /// both advance it.
    last_counter: Option<u64>,
    phase: Phase,
}

impl Session {
    pub fn new(
        player: PlayerId,
        preferred_position: Option<Seat>,
        requested_game: Option<GameId>,
        create_game: bool,
    ) -> Self {
        Self {
            player,
            preferred_position,
            requested_game,
            create_game,
            game: None,
            assigned_position: None,
            last_counter: None,
            phase: Phase::Disconnected,
        }
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn preferred_position(&self) -> Option<Seat> {
        self.preferred_position
    }

    pub fn requested_game(&self) -> Option<&GameId> {
        self.requested_game.as_ref()
    }

    pub fn creates_game(&self) -> bool {
        self.create_game
    }

    pub fn game(&self) -> Option<&GameId> {
        self.game.as_ref()
    }

    pub fn assigned_position(&self) -> Option<Seat> {
        self.assigned_position
    }

    pub fn last_counter(&self) -> Option<u64> {
        self.last_counter
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = ?self.phase, to = ?phase, "phase transition");
        self.phase = phase;
    }

    /// Remembers the game id the server suggested during creation, so the
    /// subsequent join can name it.
    pub(crate) fn set_requested_game(&mut self, game: GameId) {
        self.requested_game = Some(game);
    }

    /// Fixes the game id for the lifetime of the session.
    pub(crate) fn set_game(&mut self, game: GameId) {
        self.game = Some(game);
    }

    /// Records the seat the server assigned. The assignment is permanent:
    /// a later attempt to change it is ignored and logged.
    pub(crate) fn assign_position(&mut self, seat: Seat) {
        match self.assigned_position {
            None => {
                tracing::info!(%seat, "position assigned");
                self.assigned_position = Some(seat);
            }
            Some(current) if current != seat => {
                tracing::warn!(
                    %current, proposed = %seat,
                    "server tried to reassign a fixed position; ignoring"
                );
            }
            Some(_) => {}
        }
    }

    /// The staleness filter: true iff the message carries a counter at or
    /// below the high-water mark. No counter, or no mark yet, means
    /// nothing is stale.
    pub fn is_stale(&self, counter: Option<u64>) -> bool {
        match (counter, self.last_counter) {
            (Some(counter), Some(last)) => counter <= last,
            _ => false,
        }
    }

    /// Advances the counter high-water mark. Messages without a counter
    /// leave it alone; the mark never goes backwards.
    pub(crate) fn observe_counter(&mut self, counter: Option<u64>) {
        if let Some(counter) = counter {
            self.last_counter = Some(match self.last_counter {
                Some(last) => last.max(counter),
                None => counter,
            });
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(PlayerId("p1".into()), None, None, false)
    }

    #[test]
    fn test_nothing_is_stale_before_first_counter() {
        let s = session();
        assert!(!s.is_stale(Some(1)));
        assert!(!s.is_stale(None));
    }

    #[test]
    fn test_equal_counter_is_stale() {
        let mut s = session();
        s.observe_counter(Some(5));
        assert!(s.is_stale(Some(5)));
        assert!(s.is_stale(Some(3)));
        assert!(!s.is_stale(Some(6)));
    }

    #[test]
    fn test_counterless_message_is_never_stale() {
        let mut s = session();
        s.observe_counter(Some(10));
        assert!(!s.is_stale(None));
    }

    #[test]
    fn test_counter_is_monotone() {
        let mut s = session();
        s.observe_counter(Some(7));
        s.observe_counter(Some(3));
        s.observe_counter(None);
        assert_eq!(s.last_counter(), Some(7));
    }

    #[test]
    fn test_position_assignment_is_permanent() {
        let mut s = session();
        s.assign_position(Seat::North);
        s.assign_position(Seat::East);
        assert_eq!(s.assigned_position(), Some(Seat::North));
    }
}
