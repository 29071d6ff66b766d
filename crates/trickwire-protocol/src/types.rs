//! Wire-level data types for the bridge protocol.
//!
//! Everything here travels on the wire as JSON documents inside frame
//! parts, so the serde attributes pin the exact shapes the backend speaks.
//! A mismatch means the client silently fails to parse server state, which
//! is why the test module asserts shapes, not just round-trips.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a player, generated locally when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier for a game, assigned by the server or requested by
/// the client. Doubles as the event topic prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Seats and partnerships
// ---------------------------------------------------------------------------

/// One of the four fixed seats at the table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    North,
    East,
    South,
    West,
}

impl Seat {
    /// All seats in play order.
    pub const ALL: [Seat; 4] = [Seat::North, Seat::East, Seat::South, Seat::West];

    /// The seat sitting opposite — the partner.
    pub fn partner(self) -> Seat {
        match self {
            Seat::North => Seat::South,
            Seat::East => Seat::West,
            Seat::South => Seat::North,
            Seat::West => Seat::East,
        }
    }

    /// The partnership this seat belongs to.
    pub fn partnership(self) -> Partnership {
        match self {
            Seat::North | Seat::South => Partnership::NorthSouth,
            Seat::East | Seat::West => Partnership::EastWest,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Seat::North => "north",
            Seat::East => "east",
            Seat::South => "south",
            Seat::West => "west",
        };
        write!(f, "{name}")
    }
}

/// One of the two fixed pairs of opposite seats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Partnership {
    NorthSouth,
    EastWest,
}

impl Partnership {
    /// The two seats forming this partnership.
    pub fn seats(self) -> [Seat; 2] {
        match self {
            Partnership::NorthSouth => [Seat::North, Seat::South],
            Partnership::EastWest => [Seat::East, Seat::West],
        }
    }
}

impl fmt::Display for Partnership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Partnership::NorthSouth => "north-south",
            Partnership::EastWest => "east-west",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Card rank. The wire uses `"2"`–`"10"` for spot cards and lowercase
/// names for honors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// Card suit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

/// A playing card: `{"rank": "ace", "suit": "spades"}` on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} of {:?}", self.rank, self.suit)
    }
}

// ---------------------------------------------------------------------------
// Calls and contracts
// ---------------------------------------------------------------------------

/// The denomination of a bid: a trump suit or notrump.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Strain {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
    NoTrump,
}

/// A leveled bid, e.g. "two hearts".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Bid {
    /// 1–7.
    pub level: u8,
    pub strain: Strain,
}

/// A call in the auction.
///
/// Wire shape is internally tagged: `{"type": "pass"}`,
/// `{"type": "bid", "bid": {"level": 2, "strain": "hearts"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Call {
    Pass,
    Double,
    Redouble,
    Bid { bid: Bid },
}

/// Doubling status of a contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Doubling {
    Undoubled,
    Doubled,
    Redoubled,
}

/// The final agreed bid, fixed for the rest of the deal once bidding
/// concludes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub bid: Bid,
    pub doubling: Doubling,
}

// ---------------------------------------------------------------------------
// Vulnerability, calls made, tricks, results
// ---------------------------------------------------------------------------

/// Which partnerships are vulnerable this deal.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Vulnerability {
    #[serde(rename = "northSouth")]
    pub north_south: bool,
    #[serde(rename = "eastWest")]
    pub east_west: bool,
}

impl Vulnerability {
    /// Whether the given partnership is vulnerable.
    pub fn is_vulnerable(&self, partnership: Partnership) -> bool {
        match partnership {
            Partnership::NorthSouth => self.north_south,
            Partnership::EastWest => self.east_west,
        }
    }
}

/// One entry in the bid ledger: who called what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCall {
    pub position: Seat,
    pub call: Call,
}

/// One play within a trick: who played which card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickPlay {
    pub position: Seat,
    pub card: Card,
}

/// A trick as reported in public state: its plays plus, once complete,
/// its winner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrickRecord {
    #[serde(default)]
    pub cards: Vec<TrickPlay>,
    #[serde(default)]
    pub winner: Option<Seat>,
}

/// The outcome of a completed deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealResult {
    /// The scoring partnership, absent for a passed-out deal.
    #[serde(default)]
    pub partnership: Option<Partnership>,
    #[serde(default)]
    pub score: i64,
}

// ---------------------------------------------------------------------------
// Get-reply payload
// ---------------------------------------------------------------------------

/// The scopes a `get` command may request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Pubstate,
    Privstate,
    #[serde(rename = "self")]
    Own,
}

impl Scope {
    /// Every scope — the combined initial fetch.
    pub const ALL: [Scope; 3] = [Scope::Pubstate, Scope::Privstate, Scope::Own];
}

/// Public table state as carried in a `get` reply.
///
/// Every field is optional: an absent field means "unchanged", never
/// "cleared". (The backend collapses explicit null into absence, so
/// `Option::None` covers both.)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubState {
    pub calls: Option<Vec<PositionCall>>,
    pub declarer: Option<Seat>,
    pub contract: Option<Contract>,
    /// Publicly known hands, keyed by seat (the dummy, played-out cards).
    pub cards: Option<std::collections::HashMap<Seat, Vec<Card>>>,
    pub tricks: Option<Vec<TrickRecord>>,
    pub vulnerability: Option<Vulnerability>,
}

/// Private state: the cards only this player may see.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivState {
    pub cards: Option<std::collections::HashMap<Seat, Vec<Card>>>,
}

/// Player-scoped state: seat assignment and the actions the server
/// currently allows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OwnState {
    pub position: Option<Seat>,
    pub position_in_turn: Option<Seat>,
    pub allowed_calls: Option<Vec<Call>>,
    pub allowed_cards: Option<Vec<Card>>,
}

/// The nested payload of a `get` reply, keyed by scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateUpdate {
    pub pubstate: Option<PubState>,
    pub privstate: Option<PrivState>,
    #[serde(rename = "self")]
    pub own: Option<OwnState>,
}

// =========================================================================
// Tests
// =========================================================================
