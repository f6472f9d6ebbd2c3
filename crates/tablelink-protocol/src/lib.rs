//! Wire protocol for tablelink.
//!
//! This crate defines the "language" the poker client and the game server
//! speak:
//!
//! - **Tags** ([`Tag`]): the closed vocabulary of request/response kinds,
//!   with the category predicates the client relies on.
//! - **Envelopes** ([`Envelope`]): one frame: a tag plus optional client,
//!   message and table payloads.
//! - **Wire models** ([`Client`], [`Player`], [`Table`], ...): what the
//!   server reports, mirrored field for field.
//! - **Codecs** ([`Codec`] trait, [`MsgPackCodec`], [`JsonCodec`]): how
//!   envelopes become bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the state
//! reducer. It knows nothing about sockets or seats.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → State (TableView)
//! ```

mod codec;
mod envelope;
mod error;
mod tag;
mod types;

pub use codec::{Codec, MsgPackCodec};
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use envelope::{Direction, Envelope};
pub use error::{CodecSource, ProtocolError};
pub use tag::Tag;
pub use types::{
    AdminSettings, Card, Chips, Client, ClientId, ClientSettings, Hand, Hole,
    Player, PlayerAction, PlayerNode, Pot, Suit, Table, TableLock, TableState,
};
