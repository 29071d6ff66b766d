//! Client configuration.

use trickwire_advisor::PilotMode;
use trickwire_protocol::{GameId, PlayerId, Seat};
use trickwire_session::Session;
use trickwire_transport::LinkSecurity;
use uuid::Uuid;

/// Everything needed to open a session against a table server.
///
/// Built with chained setters:
///
/// ```rust
/// use trickwire::ClientConfig;
/// use trickwire_protocol::Seat;
///
/// let config = ClientConfig::new("ws://host/control", "ws://host/events")
///     .preferred_position(Seat::North)
///     .create_game(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub control_endpoint: String,
    pub event_endpoint: String,
    pub security: LinkSecurity,
    /// Absent means a fresh uuid identity per session.
    pub player: Option<PlayerId>,
    pub preferred_position: Option<Seat>,
    pub game: Option<GameId>,
    pub create_game: bool,
    pub pilot: PilotMode,
}

impl ClientConfig {
    pub fn new(control_endpoint: &str, event_endpoint: &str) -> Self {
        Self {
            control_endpoint: control_endpoint.to_owned(),
            event_endpoint: event_endpoint.to_owned(),
            security: LinkSecurity::default(),
            player: None,
            preferred_position: None,
            game: None,
            create_game: false,
            pilot: PilotMode::Off,
        }
    }

    pub fn security(mut self, security: LinkSecurity) -> Self {
        self.security = security;
        self
    }

    /// A stable player identity. Without one, each session gets a
    /// freshly generated uuid.
    pub fn player(mut self, player: PlayerId) -> Self {
        self.player = Some(player);
        self
    }

    pub fn preferred_position(mut self, seat: Seat) -> Self {
        self.preferred_position = Some(seat);
        self
    }

    /// The game to join (or the id to request when creating one).
    pub fn game(mut self, game: GameId) -> Self {
        self.game = Some(game);
        self
    }

    /// Whether this client asks the server to create the game before
    /// joining it.
    pub fn create_game(mut self, create: bool) -> Self {
        self.create_game = create;
        self
    }

    pub fn pilot(mut self, pilot: PilotMode) -> Self {
        self.pilot = pilot;
        self
    }

    pub(crate) fn session(&self) -> Session {
        let player = self
            .player
            .clone()
            .unwrap_or_else(|| PlayerId(Uuid::new_v4().to_string()));
        Session::new(
            player,
            self.preferred_position,
            self.game.clone(),
            self.create_game,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_player_gets_generated_identity() {
        let config = ClientConfig::new("ws://a", "ws://b");
        let a = config.session();
        let b = config.session();
        assert!(!a.player().0.is_empty());
        assert_ne!(a.player(), b.player());
    }

    #[test]
    fn test_explicit_player_is_kept() {
        let config = ClientConfig::new("ws://a", "ws://b")
            .player(PlayerId("alice".into()));
        assert_eq!(config.session().player(), &PlayerId("alice".into()));
    }
}
