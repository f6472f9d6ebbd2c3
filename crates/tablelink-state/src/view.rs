//! The reconstructed table as the local client sees it.

use tablelink_protocol::{
    Card, Chips, Client, ClientId, Player, PlayerNode, Pot, Table, TableLock,
    TableState,
};

use crate::{Seat, SeatArray};

/// Everything the reducer knows about the room.
///
/// Built empty, then mutated in place by [`reduce`](crate::reduce) for
/// every server frame. Renderers read it through the accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableView {
    pub(crate) you: Option<Client>,
    pub(crate) is_admin: bool,
    pub(crate) seats: SeatArray,
    pub(crate) table: Table,
    pub(crate) cur_player: Option<ClientId>,
    pub(crate) player_head: Option<ClientId>,
    pub(crate) room_name: Option<String>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Your own client, once the server has acknowledged the connection.
    pub fn you(&self) -> Option<&Client> {
        self.you.as_ref()
    }

    pub fn your_id(&self) -> Option<&ClientId> {
        self.you.as_ref().map(|c| &c.id).filter(|id| !id.is_empty())
    }

    pub(crate) fn is_you(&self, id: &ClientId) -> bool {
        self.your_id() == Some(id)
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn is_spectator(&self) -> bool {
        self.you
            .as_ref()
            .and_then(|c| c.settings.as_ref())
            .is_some_and(|s| s.is_spectator)
    }

    pub fn seats(&self) -> &SeatArray {
        &self.seats
    }

    /// The latest table snapshot, with merge rules applied.
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_state(&self) -> TableState {
        self.table.state
    }

    pub fn num_seats(&self) -> usize {
        self.seats.len()
    }

    pub fn num_players(&self) -> u8 {
        self.table.num_players
    }

    pub fn num_connected(&self) -> u64 {
        self.table.num_connected
    }

    pub fn community(&self) -> &[Card] {
        &self.table.community
    }

    pub fn main_pot(&self) -> Option<&Pot> {
        self.table.main_pot.as_ref()
    }

    /// Main pot total, zero before the first hand.
    pub fn pot_total(&self) -> Chips {
        self.main_pot().map(|p| p.total).unwrap_or_default()
    }

    pub fn dealer(&self) -> Option<&Player> {
        node_player(&self.table.dealer)
    }

    pub fn small_blind(&self) -> Option<&Player> {
        node_player(&self.table.small_blind)
    }

    pub fn big_blind(&self) -> Option<&Player> {
        node_player(&self.table.big_blind)
    }

    pub fn lock(&self) -> TableLock {
        self.table.lock
    }

    pub fn is_password_protected(&self) -> bool {
        self.table.is_password_protected()
    }

    /// Whose turn it is.
    pub fn cur_player(&self) -> Option<&ClientId> {
        self.cur_player.as_ref()
    }

    /// The seat of the player whose turn it is.
    pub fn acting_seat(&self) -> Option<&Seat> {
        let pos = self.seats.position_of(self.cur_player.as_ref()?)?;
        self.seats.get(pos)
    }

    /// The acting-position marker (first to act this betting round).
    pub fn player_head(&self) -> Option<&ClientId> {
        self.player_head.as_ref()
    }

    /// The room's new name after an admin renamed it.
    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }
}

fn node_player(node: &Option<PlayerNode>) -> Option<&Player> {
    node.as_ref().and_then(|n| n.player.as_ref())
}
