//! Joins a room and prints what happens at the table.
//!
//! ```text
//! TABLELINK_SERVER_ADDR=localhost:8080 cargo run -p table-watch -- lobby
//! ```
//!
//! Lines typed on stdin are sent as chat. Commands: `/call`, `/check`,
//! `/fold`, `/allin`, `/bet N`, `/start`, `/spectate`, `/quit`.

use tablelink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

enum Command {
    Send(Intent),
    Quit,
}

fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(cmd) = line.strip_prefix('/') else {
        return Ok(Some(Command::Send(Intent::Chat(line.to_string()))));
    };

    let mut parts = cmd.split_whitespace();
    let act = |action| Command::Send(Intent::Act { action, amount: Chips(0) });
    let command = match parts.next().unwrap_or_default() {
        "call" => act(BetAction::Call),
        "check" => act(BetAction::Check),
        "fold" => act(BetAction::Fold),
        "allin" => act(BetAction::AllIn),
        "bet" => {
            let amount = parts
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or("usage: /bet N")?;
            Command::Send(Intent::Act {
                action: BetAction::Bet,
                amount: Chips(amount),
            })
        }
        "start" => Command::Send(Intent::StartGame),
        "spectate" => Command::Send(Intent::Spectate),
        "quit" => Command::Quit,
        other => return Err(format!("unknown command /{other}")),
    };
    Ok(Some(command))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn show(client: &TableClient, update: &Update) {
    match update {
        Update::Status(state) => println!("== {state}"),
        Update::Frame { envelope, advisories } => {
            for advisory in advisories {
                match advisory {
                    Advisory::ChatLine(line) => println!("{line}"),
                    Advisory::Notice(text) | Advisory::Blocking(text) => println!("!! {text}"),
                    Advisory::RoomRenamed(name) => println!("== room is now {name:?}"),
                    _ => {}
                }
            }
            if matches!(envelope.tag, Tag::PlayerTurn | Tag::Flop | Tag::Turn | Tag::River) {
                print_table(client.view());
            }
        }
    }
}

fn print_table(view: &TableView) {
    let board: Vec<&str> = view.community().iter().map(|c| c.name.as_str()).collect();
    println!(
        "-- {} | pot {} | bet {} | board [{}]",
        view.table_state(),
        view.pot_total().grouped(),
        view.table().bet.grouped(),
        board.join(" ")
    );
    for seat in view.seats().iter() {
        let Some(player) = seat.occupant().and_then(|c| c.player.as_ref()) else {
            continue;
        };
        let turn = if view.cur_player() == seat.client_id() { ">" } else { " " };
        let away = if player.is_disconnected { " (away)" } else { "" };
        println!(
            "{turn} {}: {} {} chips, {}{away}",
            seat.pos(),
            player.name,
            player.chip_count.grouped(),
            player.action.describe()
        );
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tablelink::logging::init_tracing();

    let config = ClientConfig::from_env()?;
    let room = std::env::args().nth(1).unwrap_or_else(|| "lobby".to_string());
    let settings = ClientSettings {
        name: std::env::var("TABLELINK_NAME").unwrap_or_else(|_| "watcher".to_string()),
        ..ClientSettings::default()
    };

    let mut client = TableClient::connect(&config, &room, settings)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            update = client.next() => match update {
                Some(update) => show(&client, &update),
                None => break,
            },
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(Some(Command::Send(intent))) => {
                        if let Err(e) = client.send(intent) {
                            eprintln!("!! {e}");
                        }
                    }
                    Ok(Some(Command::Quit)) => break,
                    Ok(None) => {}
                    Err(usage) => eprintln!("!! {usage}"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }

    if let Some(reason) = client.shutdown().await {
        tracing::info!(%reason, "left the room");
    }
    Ok(())
}
