//! The Game State Model: Trickwire's local mirror of a table.
//!
//! [`TableState`] holds everything the client knows about the deal in
//! progress — hands, the bid ledger, the contract, tricks, vulnerability,
//! and the actions the server currently allows. It is mutated by the
//! session state machine only; everyone else reads.
//!
//! Two rules make the mirror safe against the unordered interleaving of
//! the two channels:
//!
//! - **Absence means unchanged.** A state update that does not mention a
//!   field leaves that field alone. Nothing is ever cleared implicitly.
//! - **The server is authoritative.** Where an update does mention a
//!   field, its value replaces ours wholesale; we never merge element-wise
//!   inside a mentioned field.

mod table;

pub use table::{MergeOutcome, TableState};
