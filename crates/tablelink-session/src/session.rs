//! The room session: everything that must survive a reconnect.
//!
//! A session is one user's stay in one room. It outlives individual
//! sockets: when a socket drops, the next socket is opened from the same
//! session, which remembers
//! - WHERE the room is ([`RoomEndpoint`])
//! - HOW to join the first time (the join envelope)
//! - WHAT proves "I'm the same player" on a retry ([`ReconnectToken`])

use std::fmt;

use tablelink_protocol::{Client, ClientSettings, Envelope, Tag};

use crate::{RoomEndpoint, SessionError};

// ---------------------------------------------------------------------------
// ReconnectToken
// ---------------------------------------------------------------------------

/// The private token the server issues on the first `NEWCONN`.
///
/// Presented verbatim on every reconnection. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq)]
pub struct ReconnectToken(String);

impl ReconnectToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ReconnectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReconnectToken(..)")
    }
}

// ---------------------------------------------------------------------------
// RoomSession
// ---------------------------------------------------------------------------

/// Connection parameters that live as long as the room session.
#[derive(Debug, Clone)]
pub struct RoomSession {
    endpoint: RoomEndpoint,
    join: Envelope,
    token: Option<ReconnectToken>,
}

impl RoomSession {
    /// A session that joins with the given request envelope.
    pub fn new(endpoint: RoomEndpoint, join: Envelope) -> Self {
        Self {
            endpoint,
            join,
            token: None,
        }
    }

    /// A session that joins with a `NEWCONN` request carrying `settings`.
    pub fn join(endpoint: RoomEndpoint, settings: ClientSettings) -> Self {
        let join = Envelope::request(Tag::NewConn)
            .with_client(Client::from_settings(settings));
        Self::new(endpoint, join)
    }

    pub fn endpoint(&self) -> &RoomEndpoint {
        &self.endpoint
    }

    pub fn token(&self) -> Option<&ReconnectToken> {
        self.token.as_ref()
    }

    /// Records the private token from a `NEWCONN` response.
    ///
    /// Only the first token is kept; the session's identity is fixed once
    /// issued. Returns `true` if this call recorded it.
    pub fn record_token(&mut self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        match &self.token {
            None => {
                self.token = Some(ReconnectToken::new(token));
                tracing::debug!(room = %self.endpoint, "reconnection token recorded");
                true
            }
            Some(existing) if existing.as_str() == token => false,
            Some(_) => {
                tracing::warn!(
                    room = %self.endpoint,
                    "server issued a second reconnection token, keeping the first"
                );
                false
            }
        }
    }

    /// The first frame to send on a freshly opened socket.
    ///
    /// Attempt 0 sends the join envelope. Later attempts send the same
    /// client with `PLAYER_RECONNECTING` and the private token in `Msg`.
    ///
    /// # Errors
    /// Returns [`SessionError::MissingToken`] for a retry when no token
    /// was ever issued.
    pub fn opening_envelope(&self, attempt: u32) -> Result<Envelope, SessionError> {
        if attempt == 0 {
            return Ok(self.join.clone());
        }
        let token = self.token.as_ref().ok_or(SessionError::MissingToken)?;
        let mut env = self.join.clone().with_msg(token.as_str());
        env.tag = Tag::PlayerReconnecting;
        Ok(env)
    }

    /// Points the session at a renamed room.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidRoom`] for an unusable name.
    pub fn rename_room(&mut self, room: &str) -> Result<(), SessionError> {
        if room == self.endpoint.room() {
            return Ok(());
        }
        let endpoint = self.endpoint.with_room(room)?;
        tracing::info!(from = %self.endpoint, to = %endpoint, "room renamed");
        self.endpoint = endpoint;
        Ok(())
    }
}

/// Returns `true` for server frames that end the session for good:
/// a bad password, a locked table, a closed server, or a refused
/// reconnection. No automatic retry follows them.
pub fn is_rejection(envelope: &Envelope) -> bool {
    match envelope.tag {
        Tag::BadAuth | Tag::TableLocked | Tag::ServerClosed => true,
        Tag::BadRequest | Tag::ServerMsg => {
            envelope.msg_str().starts_with("failed to reconnect")
        }
        _ => false,
    }
}
