//! # Trickwire
//!
//! A client for networked contract bridge. Trickwire speaks the table
//! server's two-channel protocol (request/reply commands plus a
//! subscription event feed), keeps a consistent local mirror of the
//! table, and exposes it through read-only accessors and two action
//! methods. A frontend renders the mirror; an optional [`Advisor`]
//! supplies bidding and play suggestions.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trickwire::prelude::*;
//!
//! # async fn demo() -> Result<(), trickwire::ClientError> {
//! let config = ClientConfig::new(
//!     "ws://localhost:5555/control",
//!     "ws://localhost:5555/events",
//! );
//! let mut client = WsClient::connect(config, None).await?;
//! client.run(|notice| println!("{notice:?}")).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::{Client, WsClient};
pub use config::ClientConfig;
pub use error::ClientError;

pub use trickwire_advisor::{Advisor, PilotMode};
pub use trickwire_session::{Notice, Phase};

pub mod prelude {
    pub use crate::{Client, ClientConfig, ClientError, WsClient};
    pub use trickwire_advisor::{Advisor, FirstAllowed, PilotMode};
    pub use trickwire_protocol::{
        Call, Card, Contract, GameId, Partnership, PlayerId, Seat,
    };
    pub use trickwire_session::{Notice, Phase};
    pub use trickwire_transport::LinkSecurity;
}
