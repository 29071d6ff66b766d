//! Wire protocol for Trickwire.
//!
//! This crate defines the language the client and the bridge backend
//! speak:
//!
//! - **Types** ([`Seat`], [`Card`], [`Call`], [`Contract`], …) — the JSON
//!   documents that travel inside frame parts.
//! - **Messages** ([`Command`], [`Reply`], [`Event`]) — the closed
//!   vocabulary of the two channels.
//! - **Codec** ([`encode_command`], [`decode_reply`], [`decode_event`]) —
//!   how messages map onto multipart frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (frames of opaque parts) and
//! session (handshake and state sync). It knows nothing about sockets,
//! staleness, or whose turn it is.

mod codec;
mod error;
mod frames;
mod types;

pub use codec::{decode_event, decode_reply, encode_command};
pub use error::ProtocolError;
pub use frames::{Command, Event, EventFrame, Reply, ReplyFrame, ReplyStatus};
pub use types::{
    Bid, Call, Card, Contract, DealResult, Doubling, GameId, OwnState,
    Partnership, PlayerId, PositionCall, PrivState, PubState, Rank, Scope,
    Seat, StateUpdate, Strain, Suit, TrickPlay, TrickRecord, Vulnerability,
};
