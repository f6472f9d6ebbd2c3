//! The seat array: a fixed-length, position-stable list of seats.
//!
//! Slot `i` always has table position `i`. Occupants come and go; the slot
//! itself never moves. Renderers place seats around the table by
//! `position mod 4`, so a seat that drifted to another index would jump to
//! another side of the table.

use tablelink_protocol::{Chips, Client, ClientId, Player, PlayerAction, Tag};

use crate::merge::{merge_client, reset_player};
use crate::StateError;

/// Display name of an empty seat.
pub const VACANT_NAME: &str = "vacant seat";

/// Which side of the table a seat is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    Bottom,
    Left,
    Top,
    Right,
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// One slot of the seat array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pos: usize,
    occupant: Option<Client>,
}

impl Seat {
    /// An empty seat at `pos`.
    pub fn vacant(pos: usize) -> Self {
        Self {
            pos,
            occupant: None,
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn occupant(&self) -> Option<&Client> {
        self.occupant.as_ref()
    }

    pub fn is_vacant(&self) -> bool {
        self.occupant.is_none()
    }

    /// The occupant's ID, if any.
    pub fn client_id(&self) -> Option<&ClientId> {
        self.occupant.as_ref().map(|c| &c.id)
    }

    /// The side of the table this seat belongs to (`pos mod 4`).
    pub fn quadrant(&self) -> Quadrant {
        match self.pos % 4 {
            0 => Quadrant::Bottom,
            1 => Quadrant::Left,
            2 => Quadrant::Top,
            _ => Quadrant::Right,
        }
    }

    /// The seat as a renderable client.
    ///
    /// A vacant seat becomes the "vacant seat" sentinel: action
    /// `VACANT_SEAT`, zero chips, and this seat's position.
    pub fn to_client(&self) -> Client {
        match &self.occupant {
            Some(client) => client.clone(),
            None => Client {
                name: VACANT_NAME.to_string(),
                player: Some(Player {
                    name: VACANT_NAME.to_string(),
                    is_vacant: true,
                    table_pos: self.pos,
                    chip_count: Chips(0),
                    action: PlayerAction {
                        action: Tag::VacantSeat,
                        amount: Chips(0),
                    },
                    ..Player::default()
                }),
                ..Client::default()
            },
        }
    }

    fn seat(&mut self, mut client: Client) {
        if let Some(player) = client.player.as_mut() {
            player.table_pos = self.pos;
        }
        self.occupant = Some(client);
    }
}

// ---------------------------------------------------------------------------
// SeatArray
// ---------------------------------------------------------------------------

/// All seats of a table, indexed by table position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatArray {
    seats: Vec<Seat>,
}

impl SeatArray {
    /// `len` vacant seats.
    pub fn with_len(len: usize) -> Self {
        Self {
            seats: (0..len).map(Seat::vacant).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn get(&self, pos: usize) -> Option<&Seat> {
        self.seats.get(pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter()
    }

    pub fn occupied_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_vacant()).count()
    }

    /// Where `id` sits, if anywhere.
    pub fn position_of(&self, id: &ClientId) -> Option<usize> {
        self.seats
            .iter()
            .position(|s| s.client_id() == Some(id))
    }

    pub fn find(&self, id: &ClientId) -> Option<&Client> {
        self.position_of(id)
            .and_then(|pos| self.seats[pos].occupant())
    }

    /// Sets the seat count.
    ///
    /// Growing pads with vacant seats. Shrinking drops seats from the end
    /// and returns whoever sat there.
    pub fn resize(&mut self, len: usize) -> Vec<Client> {
        if len >= self.seats.len() {
            let start = self.seats.len();
            self.seats.extend((start..len).map(Seat::vacant));
            return Vec::new();
        }
        self.seats
            .drain(len..)
            .filter_map(|s| s.occupant)
            .collect()
    }

    /// Seats `client` and returns the position used.
    ///
    /// The target is the player's `table_pos`. A client without a player
    /// record goes to the first vacant seat instead. Re-seating a client
    /// who already sits elsewhere moves them.
    ///
    /// # Errors
    /// Leaves the array unchanged and returns
    /// - [`StateError::MissingId`] for a client with an empty ID
    /// - [`StateError::SeatOutOfRange`] for a position past the end
    /// - [`StateError::SeatTaken`] when another client holds the target
    /// - [`StateError::NoVacantSeat`] when the fallback finds none
    pub fn fill(&mut self, client: Client) -> Result<usize, StateError> {
        if client.id.is_empty() {
            return Err(StateError::MissingId);
        }

        let target = match &client.player {
            Some(player) => player.table_pos,
            None => {
                let pos = self
                    .seats
                    .iter()
                    .position(Seat::is_vacant)
                    .ok_or_else(|| StateError::NoVacantSeat(client.id.clone()))?;
                tracing::warn!(
                    client = %client.id,
                    pos,
                    "payload has no table position, using first vacant seat"
                );
                pos
            }
        };

        let len = self.seats.len();
        let seat = self
            .seats
            .get(target)
            .ok_or(StateError::SeatOutOfRange { pos: target, len })?;
        if let Some(occupant) = seat.client_id() {
            if *occupant != client.id {
                return Err(StateError::SeatTaken {
                    pos: target,
                    occupant: occupant.clone(),
                });
            }
        }

        if let Some(old) = self.position_of(&client.id) {
            if old != target {
                tracing::debug!(client = %client.id, from = old, to = target, "client moved seats");
                self.seats[old].occupant = None;
            }
        }
        self.seats[target].seat(client);
        Ok(target)
    }

    /// Empties the seat held by `id`, keeping its position.
    ///
    /// Returns the vacated position, or `None` if `id` was not seated
    /// (vacating twice is a no-op).
    pub fn vacate(&mut self, id: &ClientId) -> Option<usize> {
        let pos = self.position_of(id)?;
        self.seats[pos].occupant = None;
        Some(pos)
    }

    /// Merges a client update into the seat held by the same ID.
    ///
    /// # Errors
    /// [`StateError::UnknownClient`] if that client is not seated.
    pub fn update(&mut self, client: &Client) -> Result<usize, StateError> {
        let pos = self.occupied_pos(&client.id)?;
        if let Some(current) = self.seats[pos].occupant.as_mut() {
            merge_client(current, client);
            if let Some(player) = current.player.as_mut() {
                player.table_pos = pos;
            }
        }
        Ok(pos)
    }

    /// Replaces the seated player record wholesale (new hand).
    ///
    /// # Errors
    /// [`StateError::UnknownClient`] if that client is not seated.
    pub fn reset(&mut self, client: &Client) -> Result<usize, StateError> {
        let pos = self.occupied_pos(&client.id)?;
        if let (Some(current), Some(update)) =
            (self.seats[pos].occupant.as_mut(), client.player.as_ref())
        {
            current.name.clone_from(&client.name);
            match current.player.as_mut() {
                Some(player) => reset_player(player, update),
                None => current.player = Some(update.clone()),
            }
            if let Some(player) = current.player.as_mut() {
                player.table_pos = pos;
            }
        }
        Ok(pos)
    }

    /// Sets the "socket dropped, seat held" flag on a seated player.
    ///
    /// # Errors
    /// [`StateError::UnknownClient`] if that client is not seated.
    pub fn set_disconnected(
        &mut self,
        id: &ClientId,
        disconnected: bool,
    ) -> Result<usize, StateError> {
        let pos = self.occupied_pos(id)?;
        if let Some(player) = self.seats[pos]
            .occupant
            .as_mut()
            .and_then(|c| c.player.as_mut())
        {
            player.is_disconnected = disconnected;
        }
        Ok(pos)
    }

    fn occupied_pos(&self, id: &ClientId) -> Result<usize, StateError> {
        if id.is_empty() {
            return Err(StateError::MissingId);
        }
        self.position_of(id)
            .ok_or_else(|| StateError::UnknownClient(id.clone()))
    }
}
