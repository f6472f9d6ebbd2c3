//! The tag vocabulary: what kind of request or response an envelope is.
//!
//! On the wire every tag is a single bit of a 64-bit integer (`1 << n`).
//! No two tags are ever combined into one wire value, so in Rust the
//! vocabulary is a closed enum. The categories the client actually tests
//! ("needs a table snapshot", "needs a player payload") are predicate
//! methods instead of bitmask arithmetic.
//!
//! Values outside the vocabulary decode to [`Tag::Unknown`] rather than
//! failing, so a newer server cannot break frame decoding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares the [`Tag`] enum together with its bit table.
///
/// Each entry is `Variant = bit_index => "WIRE_NAME"`.
macro_rules! tags {
    ($( $(#[$meta:meta])* $variant:ident = $bit:literal => $name:literal, )*) => {
        /// One request or response kind.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "u64", into = "u64")]
        pub enum Tag {
            $( $(#[$meta])* $variant, )*
            /// A wire value that matches no known tag, kept verbatim.
            Unknown(u64),
        }

        impl Tag {
            /// Every known tag, in bit order.
            pub const ALL: &'static [Tag] = &[$( Tag::$variant, )*];

            /// The wire value of this tag.
            pub const fn bits(self) -> u64 {
                match self {
                    $( Tag::$variant => 1u64 << $bit, )*
                    Tag::Unknown(raw) => raw,
                }
            }

            /// Maps a wire value back to a tag.
            pub const fn from_bits(raw: u64) -> Self {
                if !raw.is_power_of_two() {
                    return Tag::Unknown(raw);
                }
                match raw.trailing_zeros() {
                    $( $bit => Tag::$variant, )*
                    _ => Tag::Unknown(raw),
                }
            }

            /// The upper-case name the server uses for this tag.
            pub const fn name(self) -> &'static str {
                match self {
                    $( Tag::$variant => $name, )*
                    Tag::Unknown(_) => "UNKNOWN",
                }
            }
        }
    };
}

tags! {
    Close = 0 => "CLOSE",
    NewConn = 1 => "NEWCONN",
    YourPlayer = 2 => "YOUR_PLAYER",
    NewPlayer = 3 => "NEW_PLAYER",
    CurPlayers = 4 => "CUR_PLAYERS",
    UpdatePlayer = 5 => "UPDATE_PLAYER",
    UpdateTable = 6 => "UPDATE_TABLE",
    PlayerLeft = 7 => "PLAYER_LEFT",
    ClientExited = 8 => "CLIENT_EXITED",
    ClientSettings = 9 => "CLIENT_SETTINGS",
    Reset = 10 => "RESET",
    ServerClosed = 11 => "SERVER_CLOSED",
    TableLocked = 12 => "TABLE_LOCKED",
    BadAuth = 13 => "BAD_AUTH",
    MakeAdmin = 14 => "MAKE_ADMIN",
    StartGame = 15 => "START_GAME",
    ChatMsg = 16 => "CHAT_MSG",
    PlayerAction = 17 => "PLAYER_ACTION",
    PlayerTurn = 18 => "PLAYER_TURN",
    PlayerHead = 19 => "PLAYER_HEAD",
    AllIn = 20 => "ALLIN",
    Bet = 21 => "BET",
    Call = 22 => "CALL",
    Check = 23 => "CHECK",
    Raise = 24 => "RAISE",
    Fold = 25 => "FOLD",
    CurHand = 26 => "CUR_HAND",
    ShowHand = 27 => "SHOW_HAND",
    FirstAction = 28 => "FIRST_ACTION",
    MidroundAddition = 29 => "MIDROUND_ADDITION",
    Eliminated = 30 => "ELIMINATED",
    VacantSeat = 31 => "VACANT_SEAT",
    Deal = 32 => "DEAL",
    Flop = 33 => "FLOP",
    Turn = 34 => "TURN",
    River = 35 => "RIVER",
    BestHand = 36 => "BEST_HAND",
    RoundOver = 37 => "ROUND_OVER",
    ServerMsg = 38 => "SERVER_MSG",
    BadRequest = 39 => "BAD_REQUEST",
    RoomSettings = 40 => "ROOM_SETTINGS",
    /// A seated player's socket dropped; the seat is held for them.
    PlayerReconnecting = 41 => "PLAYER_RECONNECTING",
    /// A previously dropped player is back.
    PlayerReconnected = 42 => "PLAYER_RECONNECTED",
}

impl Tag {
    /// Tags whose envelopes must carry a table snapshot.
    pub fn needs_table(self) -> bool {
        matches!(
            self,
            Self::NewConn | Self::ClientExited | Self::UpdateTable | Self::Deal
        )
    }

    /// Tags whose envelopes must carry a client with a player.
    pub fn needs_player(self) -> bool {
        matches!(
            self,
            Self::YourPlayer
                | Self::NewPlayer
                | Self::CurPlayers
                | Self::PlayerLeft
                | Self::PlayerAction
                | Self::PlayerTurn
                | Self::UpdatePlayer
                | Self::CurHand
                | Self::ShowHand
                | Self::Deal
        )
    }

    /// Betting actions a seated player can take.
    pub fn is_bet_action(self) -> bool {
        matches!(
            self,
            Self::AllIn
                | Self::Bet
                | Self::Call
                | Self::Check
                | Self::Fold
                | Self::Raise
        )
    }
}

impl From<u64> for Tag {
    fn from(raw: u64) -> Self {
        Self::from_bits(raw)
    }
}

impl From<Tag> for u64 {
    fn from(tag: Tag) -> Self {
        tag.bits()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(raw) => write!(f, "UNKNOWN({raw})"),
            known => f.write_str(known.name()),
        }
    }
}
