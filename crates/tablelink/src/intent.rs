//! What the user wants to do, before it becomes a request envelope.

use tablelink_protocol::{Chips, Client, ClientSettings, Envelope, PlayerAction, Tag};

use crate::ClientError;

/// A betting action the local player can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BetAction {
    /// Bet or raise by the given amount.
    Bet,
    Call,
    Check,
    Fold,
    AllIn,
}

impl BetAction {
    /// The request tag for this action.
    pub fn tag(self) -> Tag {
        match self {
            Self::Bet => Tag::Bet,
            Self::Call => Tag::Call,
            Self::Check => Tag::Check,
            Self::Fold => Tag::Fold,
            Self::AllIn => Tag::AllIn,
        }
    }

    /// Maps a bet tag back to an action. `RAISE` is sent as `BET`.
    pub fn from_tag(tag: Tag) -> Option<Self> {
        match tag {
            Tag::Bet | Tag::Raise => Some(Self::Bet),
            Tag::Call => Some(Self::Call),
            Tag::Check => Some(Self::Check),
            Tag::Fold => Some(Self::Fold),
            Tag::AllIn => Some(Self::AllIn),
            _ => None,
        }
    }
}

/// A user intent the client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Act on your turn.
    Act { action: BetAction, amount: Chips },
    /// Post a chat line.
    Chat(String),
    /// Change your name, spectator flag or (as admin) room settings.
    UpdateSettings(ClientSettings),
    /// Start the game (admin).
    StartGame,
    /// Give up your seat and keep watching.
    Spectate,
}

impl Intent {
    /// Builds the request envelope, acting as `you`.
    ///
    /// # Errors
    /// [`ClientError::NoClient`] when the intent needs your client (or your
    /// seat) and the server has not assigned it yet.
    pub fn into_envelope(self, you: Option<&Client>) -> Result<Envelope, ClientError> {
        let env = match self {
            Self::Act { action, amount } => {
                let mut client = you.cloned().ok_or(ClientError::NoClient)?;
                let player = client.player.as_mut().ok_or(ClientError::NoClient)?;
                player.action = PlayerAction {
                    action: action.tag(),
                    amount,
                };
                Envelope::request(action.tag()).with_client(client)
            }
            Self::Chat(text) => with_you(Envelope::request(Tag::ChatMsg), you).with_msg(text),
            Self::UpdateSettings(settings) => {
                let client = match you {
                    Some(you) => Client {
                        name: settings.name.clone(),
                        settings: Some(settings),
                        ..you.clone()
                    },
                    None => Client::from_settings(settings),
                };
                Envelope::request(Tag::ClientSettings).with_client(client)
            }
            Self::StartGame => with_you(Envelope::request(Tag::StartGame), you),
            Self::Spectate => {
                let you = you.cloned().ok_or(ClientError::NoClient)?;
                Envelope::request(Tag::PlayerLeft).with_client(you)
            }
        };
        Ok(env)
    }
}

fn with_you(env: Envelope, you: Option<&Client>) -> Envelope {
    match you {
        Some(client) => env.with_client(client.clone()),
        None => env,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablelink_protocol::{ClientId, Direction, Player};

    fn seated() -> Client {
        Client {
            id: ClientId::from("me"),
            name: "me".into(),
            player: Some(Player::default()),
            settings: None,
        }
    }

    #[test]
    fn test_intent_act_sets_player_action() {
        let env = Intent::Act {
            action: BetAction::Bet,
            amount: Chips(9_223_372_036_854_775_000),
        }
        .into_envelope(Some(&seated()))
        .unwrap();

        assert_eq!(env.direction, Direction::Request);
        assert_eq!(env.tag, Tag::Bet);
        let action = env.client.unwrap().player.unwrap().action;
        assert_eq!(action.action, Tag::Bet);
        assert_eq!(action.amount, Chips(9_223_372_036_854_775_000));
    }

    #[test]
    fn test_intent_act_without_seat_is_no_client() {
        let act = Intent::Act {
            action: BetAction::Fold,
            amount: Chips(0),
        };
        assert!(matches!(
            act.clone().into_envelope(None),
            Err(ClientError::NoClient)
        ));
        let spectator = Client {
            player: None,
            ..seated()
        };
        assert!(matches!(
            act.into_envelope(Some(&spectator)),
            Err(ClientError::NoClient)
        ));
    }

    #[test]
    fn test_intent_raise_maps_to_bet() {
        assert_eq!(BetAction::from_tag(Tag::Raise), Some(BetAction::Bet));
        assert_eq!(BetAction::from_tag(Tag::ChatMsg), None);
        assert_eq!(BetAction::AllIn.tag(), Tag::AllIn);
    }

    #[test]
    fn test_intent_chat_carries_text() {
        let env = Intent::Chat("gg".into()).into_envelope(None).unwrap();
        assert_eq!(env.tag, Tag::ChatMsg);
        assert_eq!(env.msg.as_deref(), Some("gg"));
        assert!(env.client.is_none());
    }

    #[test]
    fn test_intent_update_settings_keeps_identity() {
        let settings = ClientSettings {
            name: "renamed".into(),
            is_spectator: true,
            ..ClientSettings::default()
        };
        let env = Intent::UpdateSettings(settings)
            .into_envelope(Some(&seated()))
            .unwrap();
        assert_eq!(env.tag, Tag::ClientSettings);
        let client = env.client.unwrap();
        assert_eq!(client.id, ClientId::from("me"));
        assert_eq!(client.name, "renamed");
        assert!(client.settings.unwrap().is_spectator);
    }

    #[test]
    fn test_intent_spectate_sends_player_left() {
        let env = Intent::Spectate.into_envelope(Some(&seated())).unwrap();
        assert_eq!(env.tag, Tag::PlayerLeft);
        assert!(matches!(
            Intent::Spectate.into_envelope(None),
            Err(ClientError::NoClient)
        ));
    }
}
