//! Where a room lives: host, room id and scheme.

use std::fmt;

use crate::SessionError;

/// The addresses of one room on one game server.
///
/// The socket URL is `<ws|wss>://<host>/room/<room>/web` and the existence
/// check URL is `<http|https>://<host>/room/<room>`. The secure flag picks
/// both schemes at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEndpoint {
    host: String,
    room: String,
    secure: bool,
}

impl RoomEndpoint {
    /// Builds an endpoint.
    ///
    /// `host` is `name[:port]` without a scheme; a trailing `/` is ignored.
    ///
    /// # Errors
    /// - [`SessionError::InvalidHost`] if the host is empty or contains a
    ///   scheme or path.
    /// - [`SessionError::InvalidRoom`] if the room id is empty or contains
    ///   `/`, `?` or `#`.
    pub fn new(
        host: impl Into<String>,
        room: impl Into<String>,
        secure: bool,
    ) -> Result<Self, SessionError> {
        let host = host.into();
        let trimmed = host.trim_end_matches('/');
        if trimmed.is_empty() || trimmed.contains("://") || trimmed.contains('/') {
            return Err(SessionError::InvalidHost(host));
        }
        let host = trimmed.to_string();
        let room = validate_room(room.into())?;
        Ok(Self { host, room, secure })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// The WebSocket URL of the room.
    pub fn socket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}/room/{}/web", self.host, self.room)
    }

    /// The HTTP URL answering "does this room still exist?".
    pub fn check_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}/room/{}", self.host, self.room)
    }

    /// Same server, different room id.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidRoom`] for an unusable id.
    pub fn with_room(&self, room: impl Into<String>) -> Result<Self, SessionError> {
        Ok(Self {
            room: validate_room(room.into())?,
            ..self.clone()
        })
    }
}

fn validate_room(room: String) -> Result<String, SessionError> {
    if room.is_empty() || room.contains(['/', '?', '#']) {
        return Err(SessionError::InvalidRoom(room));
    }
    Ok(room)
}

impl fmt::Display for RoomEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/room/{}", self.host, self.room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_plain_urls() {
        let ep = RoomEndpoint::new("localhost:7777", "lobby", false).unwrap();
        assert_eq!(ep.socket_url(), "ws://localhost:7777/room/lobby/web");
        assert_eq!(ep.check_url(), "http://localhost:7777/room/lobby");
    }

    #[test]
    fn test_endpoint_secure_urls() {
        let ep = RoomEndpoint::new("poker.example.com/", "high-rollers", true)
            .unwrap();
        assert_eq!(ep.host(), "poker.example.com");
        assert_eq!(ep.socket_url(), "wss://poker.example.com/room/high-rollers/web");
        assert_eq!(ep.check_url(), "https://poker.example.com/room/high-rollers");
    }

    #[test]
    fn test_endpoint_rejects_bad_room_ids() {
        for bad in ["", "a/b", "x?y", "frag#"] {
            assert!(matches!(
                RoomEndpoint::new("h", bad, false),
                Err(SessionError::InvalidRoom(_))
            ));
        }
    }

    #[test]
    fn test_endpoint_rejects_hosts_with_scheme_or_path() {
        for bad in ["", "ws://h", "h/path"] {
            assert!(matches!(
                RoomEndpoint::new(bad, "r", false),
                Err(SessionError::InvalidHost(_))
            ));
        }
    }

    #[test]
    fn test_endpoint_with_room_keeps_host_and_scheme() {
        let ep = RoomEndpoint::new("h:1", "old", true).unwrap();
        let renamed = ep.with_room("new").unwrap();
        assert_eq!(renamed.socket_url(), "wss://h:1/room/new/web");
        assert!(ep.with_room("").is_err());
    }
}
