//! Room sessions for tablelink.
//!
//! Everything about "being in a room" that must outlive a single socket:
//!
//! 1. **Where**: [`RoomEndpoint`] builds the socket and check URLs
//! 2. **Who**: [`RoomSession`] holds the join envelope and the private
//!    [`ReconnectToken`] the server issues on first join
//! 3. **Whether to retry**: [`ConnState`] is the connection lifecycle as
//!    a pure state machine, driven by [`RetryPolicy`] and the answers of a
//!    [`RoomChecker`]
//!
//! # How it fits in the stack
//!
//! ```text
//! Connection manager (above)  ← owns the socket, feeds events into ConnState
//!     ↕
//! Session Layer (this crate)  ← decides what to send first and whether to retry
//!     ↕
//! Protocol Layer (below)      ← provides Envelope, Tag, ClientSettings
//! ```

mod checker;
mod endpoint;
mod error;
mod session;
mod state;

#[cfg(feature = "http")]
pub use checker::HttpRoomChecker;
pub use checker::{RoomChecker, RoomStatus};
pub use endpoint::RoomEndpoint;
pub use error::SessionError;
pub use session::{is_rejection, ReconnectToken, RoomSession};
pub use state::{CloseReason, ConnState, RetryPolicy};
