//! The reducer: one server envelope in, the next table view out.
//!
//! [`reduce`] is a single dispatch over the response tag. It never performs
//! I/O. Anything the user should see besides the table itself (a chat line,
//! a modal) comes back as an [`Advisory`] for the caller to present.
//!
//! Failures are soft. A frame that breaks the payload rules, or that can't
//! be reconciled with the seat array, is reported as an advisory and the
//! view is left exactly as it was.

use tablelink_protocol::{Client, Envelope, Table, Tag};

use crate::merge::{merge_client, merge_table};
use crate::{StateError, TableView};

/// Message prefix of a refused reconnection.
const FAILED_RECONNECT: &str = "failed to reconnect";

/// A side effect of reducing one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// Append a line to the chat log.
    ChatLine(String),
    /// Show a non-blocking notice; appended to one already open.
    Notice(String),
    /// Show a blocking modal that sends the user back to the entry point.
    Blocking(String),
    /// Close whatever modal is open.
    DismissModal,
    /// The room now goes by this name.
    RoomRenamed(String),
    /// The frame broke the protocol contract and was ignored.
    ProtocolViolation(String),
    /// The frame could not be applied to the seat array.
    Reconciliation(StateError),
}

/// Applies one server envelope to `view`.
pub fn reduce(view: &mut TableView, envelope: &Envelope) -> Vec<Advisory> {
    if let Err(err) = envelope.validate() {
        tracing::warn!(tag = %envelope.tag, error = %err, "frame ignored");
        return vec![Advisory::ProtocolViolation(err.to_string())];
    }

    let mut out = Vec::new();
    let client = envelope.client.as_ref();
    let table = envelope.table.as_ref();
    let msg = envelope.msg_str();

    match envelope.tag {
        Tag::NewConn => {
            if let Some(client) = client {
                view.you = Some(client.clone());
            }
            apply_table(view, table, false);
        }

        Tag::ClientExited => {
            if let Some(c) = client.filter(|c| !view.is_you(&c.id)) {
                out.push(Advisory::ChatLine(format!(
                    "<{} id: {}> left the room",
                    c.name, c.id
                )));
            }
            if let Some(t) = table {
                view.table.num_connected = t.num_connected;
            }
        }

        Tag::ChatMsg => out.push(Advisory::ChatLine(msg.to_string())),

        Tag::RoomSettings => {
            let name = client
                .and_then(|c| c.settings.as_ref())
                .and_then(|s| s.admin.as_ref())
                .map(|a| a.room_name.as_str())
                .filter(|n| !n.is_empty());
            if let Some(name) = name {
                if view.room_name.as_deref() != Some(name) {
                    view.room_name = Some(name.to_string());
                    out.push(Advisory::RoomRenamed(name.to_string()));
                }
            }
        }

        Tag::ClientSettings => {
            if let Some(c) = client {
                update_you(view, c);
                if view.seats.position_of(&c.id).is_some() {
                    reconcile(&mut out, view.seats.update(c));
                }
            }
        }

        Tag::YourPlayer => {
            if let Some(c) = client {
                update_you(view, c);
                reconcile(&mut out, view.seats.fill(c.clone()));
            }
            set_num_players(view, table);
        }

        Tag::NewPlayer | Tag::CurPlayers => {
            if let Some(c) = client {
                reconcile(&mut out, view.seats.fill(c.clone()));
            }
            set_num_players(view, table);
        }

        Tag::PlayerReconnecting | Tag::PlayerReconnected => {
            let back = envelope.tag == Tag::PlayerReconnected;
            if let Some(c) = client {
                if c.player.is_some() {
                    reconcile(&mut out, view.seats.update(c));
                }
                reconcile(&mut out, view.seats.set_disconnected(&c.id, !back));
                if back && view.is_you(&c.id) {
                    out.push(Advisory::DismissModal);
                }
            }
        }

        Tag::PlayerLeft => {
            if let Some(c) = client {
                if view.seats.vacate(&c.id).is_some() {
                    let name = c.player.as_ref().map_or(c.name.as_str(), |p| p.name.as_str());
                    out.push(Advisory::ChatLine(format!(
                        "<server-msg> {name} left the table"
                    )));
                }
                if view.is_you(&c.id) {
                    view.is_admin = false;
                }
            }
            set_num_players(view, table);
        }

        Tag::Eliminated => {
            if let Some(c) = client {
                if view.is_you(&c.id) {
                    view.is_admin = false;
                    out.push(Advisory::Notice("you have been eliminated".to_string()));
                }
                view.seats.vacate(&c.id);
            }
            if !msg.is_empty() {
                out.push(Advisory::ChatLine(msg.to_string()));
            }
        }

        Tag::MakeAdmin => view.is_admin = true,

        Tag::Deal | Tag::UpdatePlayer | Tag::CurHand | Tag::ShowHand => {
            if let Some(c) = client {
                reconcile(&mut out, view.seats.update(c));
            }
        }

        Tag::PlayerAction => {
            if let Some(c) = client {
                reconcile(&mut out, view.seats.update(c));
            }
            apply_table(view, table, false);
        }

        Tag::PlayerHead => view.player_head = client.map(|c| c.id.clone()),

        Tag::PlayerTurn => view.cur_player = client.map(|c| c.id.clone()),

        Tag::UpdateTable | Tag::Flop | Tag::Turn | Tag::River => {
            apply_table(view, table, false);
        }

        Tag::RoundOver => {
            apply_table(view, table, false);
            out.push(Advisory::Notice(msg.to_string()));
        }

        Tag::Reset => {
            if let Some(c) = client.filter(|c| c.player.is_some()) {
                reconcile(&mut out, view.seats.reset(c));
            }
            apply_table(view, table, true);
            view.player_head = None;
            view.cur_player = None;
        }

        Tag::BadRequest | Tag::ServerMsg => {
            if msg.starts_with(FAILED_RECONNECT) {
                out.push(Advisory::Blocking(msg.to_string()));
            } else {
                out.push(Advisory::Notice(msg.to_string()));
            }
        }

        Tag::TableLocked => {
            out.push(Advisory::Blocking("this table is locked".to_string()));
        }

        Tag::BadAuth => {
            out.push(Advisory::Blocking("your password was incorrect".to_string()));
        }

        Tag::ServerClosed => out.push(Advisory::Blocking("server closed".to_string())),

        other => {
            tracing::warn!(tag = %other, "unexpected response tag");
            out.push(Advisory::ProtocolViolation(format!("bad response: {other}")));
        }
    }

    out
}

fn update_you(view: &mut TableView, client: &Client) {
    match view.you.as_mut() {
        Some(you) if you.id == client.id || you.id.is_empty() => {
            you.id.clone_from(&client.id);
            merge_client(you, client);
        }
        _ => view.you = Some(client.clone()),
    }
}

fn set_num_players(view: &mut TableView, table: Option<&Table>) {
    if let Some(t) = table {
        view.table.num_players = t.num_players;
    }
}

/// Merges a table snapshot and keeps the seat array sized to it.
fn apply_table(view: &mut TableView, table: Option<&Table>, new_hand: bool) {
    let Some(update) = table else {
        return;
    };
    merge_table(&mut view.table, update, new_hand);

    let num_seats = usize::from(update.num_seats);
    if num_seats > 0 && num_seats != view.seats.len() {
        for client in view.seats.resize(num_seats) {
            tracing::warn!(client = %client.id, num_seats, "seat removed by table resize");
        }
    }
}

fn reconcile(out: &mut Vec<Advisory>, result: Result<usize, StateError>) {
    if let Err(err) = result {
        tracing::warn!(error = %err, "seat reconciliation failed, seats unchanged");
        out.push(Advisory::Reconciliation(err));
    }
}
