//! Table state reconstruction for tablelink.
//!
//! The game server owns the rules; this crate only mirrors what it
//! reports. Each decoded [`Envelope`](tablelink_protocol::Envelope) is
//! folded into a [`TableView`] by [`reduce`]:
//!
//! - **Seats** ([`SeatArray`]): fixed length, slot `i` is always table
//!   position `i`, occupants come and go
//! - **Merges**: partial player/client/table updates, decided per field
//! - **Advisories** ([`Advisory`]): chat lines and modals, returned rather
//!   than performed
//! - **Presentation** ([`Presentation`]): the chat log and modal state
//!   folded from advisories and connection status
//!
//! ```text
//! Envelope ──reduce──→ TableView      (what the table looks like)
//!              └─────→ Vec<Advisory> ──→ Presentation  (what to tell the user)
//! ```

mod error;
mod merge;
mod presentation;
mod reducer;
mod seats;
mod view;

pub use error::StateError;
pub use merge::{merge_client, merge_player, merge_table, reset_player};
pub use presentation::{Modal, ModalKind, Presentation};
pub use reducer::{reduce, Advisory};
pub use seats::{Quadrant, Seat, SeatArray, VACANT_NAME};
pub use view::TableView;
