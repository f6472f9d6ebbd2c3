//! Field-by-field merge rules for partial server updates.
//!
//! The server sends whole records, but not every record carries every
//! optional part: an `UPDATE_PLAYER` during betting has no hole cards, a
//! settings echo has no player. Each function here decides per field
//! whether the update replaces or keeps what we already have.

use tablelink_protocol::{Card, Client, Player, Table};

/// Applies a player update.
///
/// Scalars are replaced. `hole` and `hand` are replaced only when the
/// update carries them. The client-only disconnected flag is kept.
pub fn merge_player(current: &mut Player, update: &Player) {
    let hole = update.hole.clone().or_else(|| current.hole.take());
    let hand = update.hand.clone().or_else(|| current.hand.take());
    let is_disconnected = current.is_disconnected;

    *current = Player {
        hole,
        hand,
        is_disconnected,
        ..update.clone()
    };
}

/// Replaces a player wholesale, as at the start of a new hand. Only the
/// disconnected flag survives.
pub fn reset_player(current: &mut Player, update: &Player) {
    let is_disconnected = current.is_disconnected;
    *current = Player {
        is_disconnected,
        ..update.clone()
    };
}

/// Applies a client update: the name always, settings and player only
/// when present.
pub fn merge_client(current: &mut Client, update: &Client) {
    current.name.clone_from(&update.name);
    if let Some(settings) = &update.settings {
        current.settings = Some(settings.clone());
    }
    match (&mut current.player, &update.player) {
        (Some(player), Some(new)) => merge_player(player, new),
        (None, Some(new)) => current.player = Some(new.clone()),
        (_, None) => {}
    }
}

/// Applies a table snapshot.
///
/// Every field is replaced except `community`, which only grows within a
/// hand. It starts over when `new_hand` is set or the snapshot's state
/// begins a hand.
pub fn merge_table(current: &mut Table, update: &Table, new_hand: bool) {
    let community = merge_community(
        &mut current.community,
        &update.community,
        new_hand || update.state.begins_hand(),
    );
    *current = Table {
        community,
        ..update.clone()
    };
}

fn merge_community(current: &mut Vec<Card>, update: &[Card], new_hand: bool) -> Vec<Card> {
    if new_hand || update.len() >= current.len() {
        update.to_vec()
    } else {
        tracing::debug!(
            have = current.len(),
            got = update.len(),
            "stale community cards ignored"
        );
        std::mem::take(current)
    }
}
