//! Side-channel room existence check.
//!
//! Before spending a retry on a dropped socket, the connection manager asks
//! the server whether the room still exists. The [`RoomChecker`] trait is
//! the seam: production code uses [`HttpRoomChecker`], tests use a fake.

use std::future::Future;

use crate::{RoomEndpoint, SessionError};

/// What the server says about a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    /// The room exists and accepts connections.
    Available,
    /// The room exists but an admin locked it (HTTP 403).
    Locked,
    /// The room is gone (HTTP 404).
    NotFound,
}

/// Answers "does this room still exist?".
///
/// # Example
///
/// ```rust
/// use tablelink_session::{RoomChecker, RoomEndpoint, RoomStatus, SessionError};
///
/// /// Claims every room exists. Handy for local development.
/// struct AlwaysThere;
///
/// impl RoomChecker for AlwaysThere {
///     async fn check(
///         &self,
///         _endpoint: &RoomEndpoint,
///     ) -> Result<RoomStatus, SessionError> {
///         Ok(RoomStatus::Available)
///     }
/// }
/// ```
pub trait RoomChecker: Send + Sync + 'static {
    /// Looks the room up.
    ///
    /// # Returns
    /// - `Ok(status)`: the server answered
    /// - `Err(SessionError::CheckFailed)`: no usable answer (network
    ///   down, unexpected status)
    fn check(
        &self,
        endpoint: &RoomEndpoint,
    ) -> impl Future<Output = Result<RoomStatus, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpRoomChecker
// ---------------------------------------------------------------------------

/// A [`RoomChecker`] that issues `GET <check_url>` with `reqwest`.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Default)]
pub struct HttpRoomChecker {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpRoomChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuses an existing client (connection pool, timeouts, proxy).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "http")]
impl RoomChecker for HttpRoomChecker {
    async fn check(&self, endpoint: &RoomEndpoint) -> Result<RoomStatus, SessionError> {
        let url = endpoint.check_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SessionError::CheckFailed(e.to_string()))?;

        let status = response.status();
        tracing::debug!(%url, %status, "room check answered");
        match status {
            reqwest::StatusCode::NOT_FOUND => Ok(RoomStatus::NotFound),
            reqwest::StatusCode::FORBIDDEN => Ok(RoomStatus::Locked),
            s if s.is_success() => Ok(RoomStatus::Available),
            s => Err(SessionError::CheckFailed(format!("unexpected status {s}"))),
        }
    }
}
