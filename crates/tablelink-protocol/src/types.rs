//! Poker wire models, mirrored from what the game server sends.
//!
//! The server owns every rule; these types only carry its reports. Field
//! names on the wire are the server's PascalCase names, so most structs use
//! `#[serde(rename_all = "PascalCase")]` plus a few explicit renames for
//! acronyms (`ID`, `IsCPU`).
//!
//! The server encodes empty slices and pointers as `nil`. Collections use
//! [`null_as_default`] so `nil` decodes as empty instead of failing, and
//! pointer-shaped fields are `Option`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Tag;

/// Deserializes `nil` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Identity and money
// ---------------------------------------------------------------------------

/// A chip amount.
///
/// Chip totals can exceed 2^53, so they stay `u64` end to end and are never
/// routed through floating point.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
    Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Chips(pub u64);

impl Chips {
    /// Formats the amount with `,` thousands separators.
    pub fn grouped(self) -> String {
        let digits = self.0.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The server-assigned public identifier of a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Card suit bits. A hole pair's suit is the OR of both cards' suits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Suit(pub u8);

impl Suit {
    pub const CLUB: Suit = Suit(1);
    pub const DIAMOND: Suit = Suit(1 << 1);
    pub const HEART: Suit = Suit(1 << 2);
    pub const SPADE: Suit = Suit(1 << 3);

    /// `"clubs"`, `"diamonds"`, ... or `None` for combined/unknown bits.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::CLUB => Some("clubs"),
            Self::DIAMOND => Some("diamonds"),
            Self::HEART => Some("hearts"),
            Self::SPADE => Some("spades"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Card {
    /// Short name, e.g. `"A♠"`.
    pub name: String,
    /// Long name, e.g. `"ace of spades"`.
    pub full_name: String,
    pub suit: Suit,
    /// 1 (low ace) through 14 (ace).
    pub num_value: u8,
}

/// A player's two private cards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Hole {
    pub is_suited: bool,
    pub is_pair: bool,
    pub suit: Suit,
    pub combined_num_value: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub cards: Vec<Card>,
}

/// A player's best five-card hand as evaluated by the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Hand {
    /// -1 (muck) through 9 (royal flush).
    pub rank: i8,
    pub kicker: u8,
    #[serde(deserialize_with = "null_as_default")]
    pub cards: Vec<Card>,
}

impl Hand {
    /// Human-readable rank, or `None` for a rank the client doesn't know.
    pub fn rank_name(&self) -> Option<&'static str> {
        let name = match self.rank {
            -1 => "muck",
            0 => "high card",
            1 => "pair",
            2 => "two pair",
            3 => "three of a kind",
            4 => "straight",
            5 => "flush",
            6 => "full house",
            7 => "four of a kind",
            8 => "straight flush",
            9 => "royal flush",
            _ => return None,
        };
        Some(name)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// What a player did last, or what the table is waiting on them for.
///
/// `action` reuses the tag vocabulary (`CALL`, `FOLD`, `VACANT_SEAT`,
/// `FIRST_ACTION`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PlayerAction {
    pub action: Tag,
    pub amount: Chips,
}

impl Default for PlayerAction {
    fn default() -> Self {
        Self {
            action: Tag::FirstAction,
            amount: Chips(0),
        }
    }
}

impl PlayerAction {
    /// One-line description for a seat label.
    pub fn describe(&self) -> String {
        let amount = self.amount.grouped();
        match self.action {
            Tag::AllIn => format!("all in ({amount} chips)"),
            Tag::Bet => format!("raise (bet {amount} chips)"),
            Tag::Call => format!("call ({amount} chips)"),
            Tag::Check => "check".to_string(),
            Tag::Fold => "fold".to_string(),
            Tag::VacantSeat => "N/A".to_string(),
            Tag::PlayerTurn => "(player's turn) waiting for action".to_string(),
            Tag::FirstAction => "waiting for first action".to_string(),
            Tag::MidroundAddition => "waiting to add to next round".to_string(),
            _ => "bad player state".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Player {
    pub name: String,
    #[serde(rename = "IsCPU")]
    pub is_cpu: bool,
    pub is_vacant: bool,
    /// Seat index at the table.
    pub table_pos: usize,
    pub chip_count: Chips,
    pub hole: Option<Hole>,
    pub hand: Option<Hand>,
    pub action: PlayerAction,
    /// Client-side presentation flag: the player's socket dropped and the
    /// server is holding their seat. Never sent on the wire.
    #[serde(skip)]
    pub is_disconnected: bool,
}

/// A link in the server's player ring; only the player is sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PlayerNode {
    pub player: Option<Player>,
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

/// Admin-only room options carried inside [`ClientSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AdminSettings {
    pub room_name: String,
    pub num_seats: u8,
    pub lock: TableLock,
    pub password: String,
}

/// Join/settings form contents.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClientSettings {
    pub is_spectator: bool,
    pub name: String,
    /// Table password presented when joining a protected room.
    pub password: String,
    pub admin: Option<AdminSettings>,
}

/// A connected socket: a player, a spectator, or you.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Client {
    #[serde(rename = "ID")]
    pub id: ClientId,
    pub name: String,
    pub player: Option<Player>,
    pub settings: Option<ClientSettings>,
}

impl Client {
    /// A settings-only client, as sent when joining.
    pub fn from_settings(settings: ClientSettings) -> Self {
        Self {
            name: settings.name.clone(),
            settings: Some(settings),
            ..Self::default()
        }
    }

    /// Returns `true` when this client identifies a player
    /// (non-empty ID and a player record).
    pub fn has_player(&self) -> bool {
        !self.id.is_empty() && self.player.is_some()
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Pot {
    pub name: String,
    pub bet: Chips,
    pub total: Chips,
    pub is_closed: bool,
    pub win_info: String,
}

/// Betting-round progress, as reported by the server.
///
/// ```text
/// NotStarted → PreFlop → Flop → Turn → River
///     → {Rounds, PlayerRaised, DoneBetting}
///     → ShowHands → SplitPot → RoundOver → NewRound → … → GameOver
/// Reset sends the table back toward NotStarted between hands.
/// ```
///
/// The client never advances this itself; it only mirrors snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TableState {
    #[default]
    NotStarted,
    PreFlop,
    Flop,
    Turn,
    River,
    Rounds,
    PlayerRaised,
    DoneBetting,
    ShowHands,
    SplitPot,
    RoundOver,
    NewRound,
    GameOver,
    Reset,
}

impl TableState {
    const ORDER: [TableState; 14] = [
        Self::NotStarted,
        Self::PreFlop,
        Self::Flop,
        Self::Turn,
        Self::River,
        Self::Rounds,
        Self::PlayerRaised,
        Self::DoneBetting,
        Self::ShowHands,
        Self::SplitPot,
        Self::RoundOver,
        Self::NewRound,
        Self::GameOver,
        Self::Reset,
    ];

    /// Returns `true` for states at which a fresh hand begins, i.e. the
    /// community cards start over.
    pub fn begins_hand(self) -> bool {
        matches!(
            self,
            Self::NotStarted | Self::PreFlop | Self::NewRound | Self::Reset
        )
    }
}

impl TryFrom<u8> for TableState {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::ORDER
            .get(usize::from(raw))
            .copied()
            .ok_or_else(|| format!("invalid table state {raw}"))
    }
}

impl From<TableState> for u8 {
    fn from(state: TableState) -> Self {
        state as u8
    }
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not_started",
            Self::PreFlop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Rounds => "rounds",
            Self::PlayerRaised => "player_raised",
            Self::DoneBetting => "done_betting",
            Self::ShowHands => "show_hands",
            Self::SplitPot => "split_pot",
            Self::RoundOver => "round_over",
            Self::NewRound => "new_round",
            Self::GameOver => "game_over",
            Self::Reset => "reset",
        };
        f.write_str(name)
    }
}

/// Admin restriction on who may join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TableLock {
    #[default]
    Unlocked,
    Players,
    Spectators,
    All,
}

impl TryFrom<u8> for TableLock {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Unlocked),
            1 => Ok(Self::Players),
            2 => Ok(Self::Spectators),
            3 => Ok(Self::All),
            _ => Err(format!("invalid table lock {raw}")),
        }
    }
}

impl From<TableLock> for u8 {
    fn from(lock: TableLock) -> Self {
        lock as u8
    }
}

impl fmt::Display for TableLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unlocked => "none",
            Self::Players => "player lock",
            Self::Spectators => "spectator lock",
            Self::All => "player & spectator lock",
        })
    }
}

/// A table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Table {
    /// 0 to 5 shared cards.
    #[serde(deserialize_with = "null_as_default")]
    pub community: Vec<Card>,
    pub main_pot: Option<Pot>,
    pub ante: Chips,
    /// Current bet to call.
    pub bet: Chips,
    pub dealer: Option<PlayerNode>,
    pub small_blind: Option<PlayerNode>,
    pub big_blind: Option<PlayerNode>,
    #[serde(deserialize_with = "null_as_default")]
    pub winners: Vec<Player>,
    /// Seated players.
    pub num_players: u8,
    /// Fixed seat count of the room.
    pub num_seats: u8,
    pub win_info: String,
    pub state: TableState,
    pub comm_state: TableState,
    /// Sockets in the room, spectators included.
    pub num_connected: u64,
    pub lock: TableLock,
    pub password: String,
}

impl Table {
    pub fn is_password_protected(&self) -> bool {
        !self.password.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chips_grouped_inserts_separators() {
        assert_eq!(Chips(0).grouped(), "0");
        assert_eq!(Chips(999).grouped(), "999");
        assert_eq!(Chips(1000).grouped(), "1,000");
        assert_eq!(Chips(1_234_567).grouped(), "1,234,567");
    }

    #[test]
    fn test_player_action_describe() {
        let call = PlayerAction {
            action: Tag::Call,
            amount: Chips(25_000),
        };
        assert_eq!(call.describe(), "call (25,000 chips)");

        let vacant = PlayerAction {
            action: Tag::VacantSeat,
            amount: Chips(0),
        };
        assert_eq!(vacant.describe(), "N/A");

        let weird = PlayerAction {
            action: Tag::ChatMsg,
            amount: Chips(0),
        };
        assert_eq!(weird.describe(), "bad player state");
    }

    #[test]
    fn test_hand_rank_names() {
        let mut hand = Hand::default();
        assert_eq!(hand.rank_name(), Some("high card"));
        hand.rank = -1;
        assert_eq!(hand.rank_name(), Some("muck"));
        hand.rank = 9;
        assert_eq!(hand.rank_name(), Some("royal flush"));
        hand.rank = 42;
        assert_eq!(hand.rank_name(), None);
    }

    #[test]
    fn test_table_state_try_from_range() {
        assert_eq!(TableState::try_from(0), Ok(TableState::NotStarted));
        assert_eq!(TableState::try_from(13), Ok(TableState::Reset));
        assert!(TableState::try_from(14).is_err());
        assert_eq!(u8::from(TableState::ShowHands), 8);
    }

    #[test]
    fn test_table_state_begins_hand() {
        assert!(TableState::PreFlop.begins_hand());
        assert!(TableState::Reset.begins_hand());
        assert!(!TableState::River.begins_hand());
    }

    #[test]
    fn test_table_lock_display_names() {
        assert_eq!(TableLock::Unlocked.to_string(), "none");
        assert_eq!(TableLock::All.to_string(), "player & spectator lock");
        assert!(TableLock::try_from(4).is_err());
    }

    #[test]
    fn test_player_uses_server_field_names() {
        let player = Player {
            name: "alice".into(),
            is_cpu: true,
            table_pos: 3,
            chip_count: Chips(1000),
            ..Player::default()
        };
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["Name"], "alice");
        assert_eq!(json["IsCPU"], true);
        assert_eq!(json["TablePos"], 3);
        assert_eq!(json["ChipCount"], 1000);
        assert!(json.get("is_disconnected").is_none());
        assert!(json.get("IsDisconnected").is_none());
    }

    #[test]
    fn test_table_decodes_nil_collections_as_empty() {
        let json = serde_json::json!({
            "Community": null,
            "Winners": null,
            "MainPot": null,
            "NumSeats": 6,
            "State": 2,
            "Lock": 1,
        });
        let table: Table = serde_json::from_value(json).unwrap();
        assert!(table.community.is_empty());
        assert!(table.winners.is_empty());
        assert_eq!(table.num_seats, 6);
        assert_eq!(table.state, TableState::Flop);
        assert_eq!(table.lock, TableLock::Players);
    }

    #[test]
    fn test_client_id_field_is_upper_case() {
        let client = Client {
            id: ClientId::from("abc"),
            ..Client::default()
        };
        let json = serde_json::to_value(&client).unwrap();
        assert_eq!(json["ID"], "abc");
        assert!(!client.has_player());
    }
}
