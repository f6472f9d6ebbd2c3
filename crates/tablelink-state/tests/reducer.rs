//! Multi-event scenarios for the reducer.
//!
//! Each test plays a short sequence of server envelopes into a fresh
//! `TableView` and checks the reconstructed seats and table.

use tablelink_protocol::{
    Card, Chips, Client, ClientId, Envelope, Player, Table, TableState, Tag,
};
use tablelink_state::{reduce, Advisory, StateError, TableView};

fn table(num_seats: u8, num_players: u8) -> Table {
    Table {
        num_seats,
        num_players,
        ..Table::default()
    }
}

fn player(id: &str, pos: usize) -> Client {
    Client {
        id: ClientId::from(id),
        name: id.to_string(),
        player: Some(Player {
            name: id.to_string(),
            table_pos: pos,
            chip_count: Chips(1_000),
            ..Player::default()
        }),
        settings: None,
    }
}

fn me() -> Client {
    Client {
        id: ClientId::from("me"),
        name: "me".into(),
        ..Client::default()
    }
}

/// A view after `NEWCONN` on a `num_seats` table.
fn joined(num_seats: u8) -> TableView {
    let mut view = TableView::new();
    let out = reduce(
        &mut view,
        &Envelope::response(Tag::NewConn)
            .with_client(me())
            .with_msg("private-token")
            .with_table(table(num_seats, 0)),
    );
    assert!(out.is_empty());
    view
}

fn send(view: &mut TableView, tag: Tag, client: Client, num_players: u8) -> Vec<Advisory> {
    let seats = view.num_seats() as u8;
    reduce(
        view,
        &Envelope::response(tag)
            .with_client(client)
            .with_table(table(seats, num_players)),
    )
}

fn assert_positions_stable(view: &TableView) {
    for (i, seat) in view.seats().iter().enumerate() {
        assert_eq!(seat.pos(), i, "seat {i} drifted");
        let rendered = seat.to_client().player.expect("seat renders a player");
        assert_eq!(rendered.table_pos, i, "seat {i} renders wrong position");
    }
}

fn vacant_positions(view: &TableView) -> Vec<usize> {
    view.seats()
        .iter()
        .filter(|s| s.is_vacant())
        .map(|s| s.pos())
        .collect()
}

#[test]
fn test_new_player_then_left_restores_same_seat() {
    let mut view = joined(6);
    send(&mut view, Tag::CurPlayers, player("p1", 1), 1);
    send(&mut view, Tag::CurPlayers, player("p4", 4), 2);

    let out = send(&mut view, Tag::NewPlayer, player("p3", 3), 3);
    assert!(out.is_empty());
    assert_eq!(view.num_seats(), 6);
    assert_eq!(view.num_players(), 3);
    assert_eq!(
        view.seats().get(3).unwrap().client_id(),
        Some(&ClientId::from("p3"))
    );
    assert_eq!(vacant_positions(&view), vec![0, 2, 5]);
    assert_positions_stable(&view);

    let out = send(&mut view, Tag::PlayerLeft, player("p3", 3), 2);
    assert_eq!(
        out,
        vec![Advisory::ChatLine("<server-msg> p3 left the table".into())]
    );
    assert!(view.seats().get(3).unwrap().is_vacant());
    assert_eq!(vacant_positions(&view), vec![0, 2, 3, 5]);
    assert_positions_stable(&view);
}

#[test]
fn test_player_left_twice_is_noop() {
    let mut view = joined(4);
    send(&mut view, Tag::NewPlayer, player("p2", 2), 1);
    send(&mut view, Tag::PlayerLeft, player("p2", 2), 0);
    let after_first = view.clone();

    let out = send(&mut view, Tag::PlayerLeft, player("p2", 2), 0);
    assert!(out.is_empty());
    assert_eq!(view, after_first);
}

#[test]
fn test_seat_positions_stay_stable_across_churn() {
    let mut view = joined(7);
    let joins = [("a", 6), ("b", 0), ("c", 3), ("d", 5), ("e", 1)];
    for (n, (id, pos)) in joins.iter().enumerate() {
        send(&mut view, Tag::NewPlayer, player(id, *pos), n as u8 + 1);
        assert_eq!(view.num_seats(), 7);
        assert_positions_stable(&view);
    }
    for id in ["c", "a", "c", "e"] {
        send(&mut view, Tag::PlayerLeft, player(id, 0), 0);
        assert_eq!(view.num_seats(), 7);
        assert_positions_stable(&view);
    }
    send(&mut view, Tag::NewPlayer, player("f", 3), 4);
    assert_eq!(vacant_positions(&view), vec![1, 2, 4, 6]);
    assert_positions_stable(&view);
}

#[test]
fn test_new_player_on_taken_seat_is_reported_and_ignored() {
    let mut view = joined(3);
    send(&mut view, Tag::NewPlayer, player("a", 1), 1);
    let before = view.seats().clone();

    let out = send(&mut view, Tag::NewPlayer, player("b", 1), 2);
    assert_eq!(
        out,
        vec![Advisory::Reconciliation(StateError::SeatTaken {
            pos: 1,
            occupant: ClientId::from("a"),
        })]
    );
    assert_eq!(view.seats(), &before);
}

#[test]
fn test_update_for_unseated_player_is_reported() {
    let mut view = joined(3);
    let out = reduce(
        &mut view,
        &Envelope::response(Tag::UpdatePlayer).with_client(player("ghost", 0)),
    );
    assert_eq!(
        out,
        vec![Advisory::Reconciliation(StateError::UnknownClient(
            ClientId::from("ghost")
        ))]
    );
}

#[test]
fn test_reconnecting_flag_clears_on_reconnected() {
    let mut view = joined(4);
    send(&mut view, Tag::YourPlayer, Client { player: player("me", 2).player, ..me() }, 1);
    send(&mut view, Tag::NewPlayer, player("bob", 0), 2);

    let flag = |view: &TableView, id: &str| {
        view.seats()
            .find(&ClientId::from(id))
            .and_then(|c| c.player.as_ref())
            .map(|p| p.is_disconnected)
    };

    reduce(
        &mut view,
        &Envelope::response(Tag::PlayerReconnecting).with_client(player("bob", 0)),
    );
    assert_eq!(flag(&view, "bob"), Some(true));
    assert_eq!(view.seats().position_of(&ClientId::from("bob")), Some(0));

    // Updates while away keep the flag.
    reduce(
        &mut view,
        &Envelope::response(Tag::UpdatePlayer).with_client(player("bob", 0)),
    );
    assert_eq!(flag(&view, "bob"), Some(true));

    let out = reduce(
        &mut view,
        &Envelope::response(Tag::PlayerReconnected).with_client(player("bob", 0)),
    );
    assert!(out.is_empty());
    assert_eq!(flag(&view, "bob"), Some(false));

    // Your own return dismisses the reconnect modal.
    let mine = Client { player: player("me", 2).player, ..me() };
    reduce(
        &mut view,
        &Envelope::response(Tag::PlayerReconnecting).with_client(mine.clone()),
    );
    let out = reduce(
        &mut view,
        &Envelope::response(Tag::PlayerReconnected).with_client(mine),
    );
    assert_eq!(out, vec![Advisory::DismissModal]);
    assert_eq!(flag(&view, "me"), Some(false));
}

#[test]
fn test_community_grows_within_hand_and_resets() {
    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card {
                name: format!("c{i}"),
                num_value: i as u8 + 2,
                ..Card::default()
            })
            .collect()
    }
    fn snapshot(state: TableState, community: usize) -> Table {
        Table {
            num_seats: 4,
            state,
            community: cards(community),
            ..Table::default()
        }
    }

    let mut view = joined(4);
    reduce(&mut view, &Envelope::response(Tag::Flop).with_table(snapshot(TableState::Flop, 3)));
    reduce(&mut view, &Envelope::response(Tag::Turn).with_table(snapshot(TableState::Turn, 4)));
    assert_eq!(view.community().len(), 4);

    // A late snapshot with fewer cards does not shrink the board.
    reduce(
        &mut view,
        &Envelope::response(Tag::UpdateTable).with_table(snapshot(TableState::Turn, 3)),
    );
    assert_eq!(view.community().len(), 4);

    reduce(&mut view, &Envelope::response(Tag::River).with_table(snapshot(TableState::River, 5)));
    assert_eq!(view.community().len(), 5);

    reduce(
        &mut view,
        &Envelope::response(Tag::Reset).with_table(snapshot(TableState::RoundOver, 0)),
    );
    assert!(view.community().is_empty());
    assert_eq!(view.table_state(), TableState::RoundOver);
}

#[test]
fn test_player_action_merges_player_and_table() {
    let mut view = joined(2);
    send(&mut view, Tag::NewPlayer, player("a", 0), 1);

    let mut acting = player("a", 0);
    if let Some(p) = acting.player.as_mut() {
        p.chip_count = Chips(9_223_372_036_854_775_000);
        p.action.action = Tag::AllIn;
    }
    let t = Table {
        num_seats: 2,
        bet: Chips(9_223_372_036_854_775_000),
        state: TableState::PlayerRaised,
        ..Table::default()
    };
    let out = reduce(
        &mut view,
        &Envelope::response(Tag::PlayerAction).with_client(acting).with_table(t),
    );
    assert!(out.is_empty());

    let seated = view.seats().find(&ClientId::from("a")).unwrap();
    let p = seated.player.as_ref().unwrap();
    assert_eq!(p.chip_count, Chips(9_223_372_036_854_775_000));
    assert_eq!(p.action.describe(), "all in (0 chips)");
    assert_eq!(view.table().bet, Chips(9_223_372_036_854_775_000));
    assert_eq!(view.table_state(), TableState::PlayerRaised);
}

#[test]
fn test_table_shrink_evicts_trailing_seats() {
    let mut view = joined(6);
    send(&mut view, Tag::NewPlayer, player("tail", 5), 1);
    reduce(&mut view, &Envelope::response(Tag::UpdateTable).with_table(table(4, 0)));
    assert_eq!(view.num_seats(), 4);
    assert!(view.seats().find(&ClientId::from("tail")).is_none());
    assert_positions_stable(&view);
}

#[test]
fn test_unknown_and_malformed_frames_leave_view_unchanged() {
    let mut view = joined(4);
    send(&mut view, Tag::NewPlayer, player("a", 1), 1);
    let before = view.clone();

    let out = reduce(&mut view, &Envelope::response(Tag::Unknown(1 << 50)));
    assert!(matches!(out.as_slice(), [Advisory::ProtocolViolation(_)]));

    // NEW_PLAYER without a player payload.
    let out = reduce(&mut view, &Envelope::response(Tag::NewPlayer).with_client(me()));
    assert!(matches!(out.as_slice(), [Advisory::ProtocolViolation(_)]));

    assert_eq!(view, before);
}
