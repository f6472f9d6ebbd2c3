//! Error types for the state layer.

use tablelink_protocol::ClientId;

/// A server event that could not be reconciled with the local seat array.
///
/// None of these are fatal: the reducer reports them and leaves the seat
/// array exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// Every seat is occupied.
    #[error("no vacant seat for client {0}")]
    NoVacantSeat(ClientId),

    /// The client is not seated at this table.
    #[error("client {0} is not seated")]
    UnknownClient(ClientId),

    /// The payload's client has an empty ID.
    #[error("client payload has no ID")]
    MissingId,

    /// The payload points past the end of the seat array.
    #[error("seat {pos} is out of range for a {len}-seat table")]
    SeatOutOfRange { pos: usize, len: usize },

    /// Another client already sits there.
    #[error("seat {pos} is already taken by client {occupant}")]
    SeatTaken { pos: usize, occupant: ClientId },
}
