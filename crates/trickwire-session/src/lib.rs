//! The protocol client core: handshake, channels, and state sync.
//!
//! This crate turns the stream of unordered, possibly-stale, partially
//! overlapping messages arriving on two independent channels into one
//! consistent view of a table. The pieces, leaves first:
//!
//! - [`RequestChannel`] / [`EventChannel`] — decode-and-drain wrappers
//!   around the transport links, each with a fail-stop health flag.
//! - [`Session`] — identity, phase, and the shared monotonic counter
//!   behind the staleness filter.
//! - [`SessionMachine`] — drives the handshake (hello → create-or-join →
//!   initial fetch → event-driven updates) and applies every accepted
//!   message as a transition on the table mirror.
//!
//! # Ordering
//!
//! The relative interleaving of the two channels is not specified by the
//! protocol. Correctness never depends on it: stale messages are dropped
//! by counter, and state merges treat absent fields as "unchanged", so
//! outcomes are order-independent up to the counter.

mod channel;
mod error;
mod machine;
mod session;

pub use channel::{EventChannel, RequestChannel};
pub use error::SessionError;
pub use machine::{Notice, SessionMachine};
pub use session::{Phase, Session};
