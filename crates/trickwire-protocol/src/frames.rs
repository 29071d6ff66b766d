//! Commands, replies, and events: the closed message vocabulary.
//!
//! Dispatch-by-tag registries become closed enums here — an unknown tag is
//! a decode error at the codec boundary, never a missing-handler gap at
//! dispatch time.

use crate::types::{
    Call, Card, Contract, DealResult, GameId, PlayerId, Scope, Seat,
    StateUpdate, Vulnerability,
};

// ---------------------------------------------------------------------------
// Commands (client → server, control channel)
// ---------------------------------------------------------------------------

/// A command sent on the control channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// The handshake opener. `role` is always `"client"` for this client.
    Hello { version: String, role: String },

    /// Asks the server to create a game, optionally with a requested id.
    Game { game: Option<GameId> },

    /// Asks to join a game, optionally at a preferred seat.
    Join {
        player: PlayerId,
        position: Option<Seat>,
        game: Option<GameId>,
    },

    /// Fetches state in the given scopes. The combined initial fetch
    /// names all of them ([`Scope::ALL`]).
    Get {
        game: GameId,
        player: PlayerId,
        scopes: Vec<Scope>,
    },

    /// Submits a call in the auction.
    Call {
        game: GameId,
        player: PlayerId,
        call: Call,
    },

    /// Plays a card.
    Play {
        game: GameId,
        player: PlayerId,
        card: Card,
    },
}

impl Command {
    /// The wire tag, which the matching reply mirrors.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Hello { .. } => "bridgehlo",
            Command::Game { .. } => "game",
            Command::Join { .. } => "join",
            Command::Get { .. } => "get",
            Command::Call { .. } => "call",
            Command::Play { .. } => "play",
        }
    }
}

// ---------------------------------------------------------------------------
// Replies (server → client, control channel)
// ---------------------------------------------------------------------------

/// Game-level outcome of a command. A transport-level error status never
/// reaches this type — it fails decoding instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// The command was accepted.
    Success,
    /// The command was understood but violated the rules of the game
    /// (e.g. an illegal play). Recovered locally, never retried.
    Failure,
}

/// The body of a reply, keyed by the mirrored command tag.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Hello,
    Game { game: Option<GameId> },
    Join { game: Option<GameId> },
    Get {
        state: StateUpdate,
        /// Shared monotonic counter. A reply without one still has its
        /// content applied; only the counter advance is skipped.
        counter: Option<u64>,
    },
    Call,
    Play,
}

impl Reply {
    /// The wire tag this reply arrived under.
    pub fn tag(&self) -> &'static str {
        match self {
            Reply::Hello => "bridgehlo",
            Reply::Game { .. } => "game",
            Reply::Join { .. } => "join",
            Reply::Get { .. } => "get",
            Reply::Call => "call",
            Reply::Play => "play",
        }
    }
}

/// A decoded reply frame: status plus body.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyFrame {
    pub status: ReplyStatus,
    pub reply: Reply,
}

// ---------------------------------------------------------------------------
// Events (server → client, event channel)
// ---------------------------------------------------------------------------

/// An out-of-band notification. All state-bearing events carry the shared
/// monotonic counter used by the staleness filter; `player` is purely
/// informational and carries none.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A new deal has started.
    Deal {
        opener: Seat,
        vulnerability: Vulnerability,
        counter: Option<u64>,
    },
    /// The seat expected to act changed.
    Turn { position: Seat, counter: Option<u64> },
    /// A call was made in the auction.
    Call {
        position: Seat,
        call: Call,
        counter: Option<u64>,
    },
    /// Bidding concluded; the contract is fixed.
    Bidding {
        declarer: Seat,
        contract: Contract,
        counter: Option<u64>,
    },
    /// A card was played to the current trick.
    Play {
        position: Seat,
        card: Card,
        counter: Option<u64>,
    },
    /// A seat's full hand became public.
    Dummy {
        position: Seat,
        cards: Vec<Card>,
        counter: Option<u64>,
    },
    /// The current trick completed.
    Trick { winner: Seat, counter: Option<u64> },
    /// The deal finished with a result.
    DealEnd {
        result: DealResult,
        counter: Option<u64>,
    },
    /// A player occupies a seat. Informational only.
    Player { player: PlayerId, position: Seat },
}

impl Event {
    /// The wire tag (the part of the topic after `<gameID>:`).
    pub fn tag(&self) -> &'static str {
        match self {
            Event::Deal { .. } => "deal",
            Event::Turn { .. } => "turn",
            Event::Call { .. } => "call",
            Event::Bidding { .. } => "bidding",
            Event::Play { .. } => "play",
            Event::Dummy { .. } => "dummy",
            Event::Trick { .. } => "trick",
            Event::DealEnd { .. } => "dealend",
            Event::Player { .. } => "player",
        }
    }

    /// The counter, where the event carries one.
    pub fn counter(&self) -> Option<u64> {
        match self {
            Event::Deal { counter, .. }
            | Event::Turn { counter, .. }
            | Event::Call { counter, .. }
            | Event::Bidding { counter, .. }
            | Event::Play { counter, .. }
            | Event::Dummy { counter, .. }
            | Event::Trick { counter, .. }
            | Event::DealEnd { counter, .. } => *counter,
            Event::Player { .. } => None,
        }
    }
}

/// A decoded event frame: the game it belongs to (from the topic) plus
/// the event body.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFrame {
    pub game: GameId,
    pub event: Event,
}
