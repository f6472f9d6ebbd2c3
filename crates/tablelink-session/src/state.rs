//! The connection lifecycle as a plain state machine.
//!
//! No sockets and no timers live here: the connection manager feeds in what
//! happened (socket opened, frame arrived, socket dropped, room checked) and
//! the machine answers with the next state. That makes the retry policy
//! testable without a network or a clock.
//!
//! ```text
//!                 opened            dropped(clean)
//!   Connecting ──────────→ Open ──────────────────→ Closed(Clean)
//!       ↑  │                 │
//!       │  │connect_failed   │dropped(unclean)
//!       │  ↓                 ↓
//!       └─ Reconnecting ←────┘      (budget spent → Closed(RetriesExhausted))
//!   retry      │                    (no token yet → Closed(MissingToken))
//!              └─room_checked(anything but Available)──→ Closed(RoomGone | RoomLocked | CheckFailed)
//! ```
//!
//! `attempt` counts consecutive failures. Every decoded frame resets it.

use std::fmt;
use std::time::Duration;

use tablelink_protocol::Tag;

use crate::RoomStatus;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How hard to try before giving up on a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Consecutive failures after which the session closes for good.
    ///
    /// Default: 3.
    pub max_attempts: u32,

    /// Pause between a failure and the next socket.
    ///
    /// Default: 1 second.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}

// ---------------------------------------------------------------------------
// CloseReason
// ---------------------------------------------------------------------------

/// Why a session reached its final state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// A `1000` close from either side.
    Clean,
    /// The user left the room.
    Abandoned,
    /// The existence check said the room is gone.
    RoomGone,
    /// The existence check said the room is locked.
    RoomLocked,
    /// The existence check itself failed (unreachable, unexpected status).
    CheckFailed,
    /// `attempts` consecutive failures.
    RetriesExhausted { attempts: u32 },
    /// A retry was due but no reconnection token had been issued.
    MissingToken,
    /// The server refused us (bad password, locked table, ...).
    Rejected(Tag),
}

impl CloseReason {
    /// Returns `true` for endings the user did not ask for.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Clean | Self::Abandoned)
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "closed cleanly"),
            Self::Abandoned => write!(f, "left the room"),
            Self::RoomGone => write!(f, "room no longer exists"),
            Self::RoomLocked => write!(f, "room is locked"),
            Self::CheckFailed => write!(f, "room check failed"),
            Self::RetriesExhausted { attempts } => {
                write!(f, "gave up after {attempts} failed attempts")
            }
            Self::MissingToken => write!(f, "no reconnection token"),
            Self::Rejected(tag) => write!(f, "rejected by server ({tag})"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnState
// ---------------------------------------------------------------------------

/// Where the connection to the room stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnState {
    /// A socket is being opened.
    Connecting { attempt: u32 },

    /// The socket is up. `rejection` is set once the server has refused
    /// us on this socket; the next drop is then final.
    Open {
        attempt: u32,
        rejection: Option<Tag>,
    },

    /// The last socket failed; checking the room and waiting to retry.
    Reconnecting { attempt: u32 },

    /// Final. No further sockets are opened.
    Closed(CloseReason),
}

impl ConnState {
    /// The state of a brand new session.
    pub fn initial() -> Self {
        Self::Connecting { attempt: 0 }
    }

    /// Consecutive failures so far, or `None` once closed.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Connecting { attempt }
            | Self::Open { attempt, .. }
            | Self::Reconnecting { attempt } => Some(*attempt),
            Self::Closed(_) => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed(_))
    }

    /// The socket opened.
    pub fn opened(self) -> Self {
        match self {
            Self::Connecting { attempt } => Self::Open {
                attempt,
                rejection: None,
            },
            other => other.ignore("opened"),
        }
    }

    /// A frame decoded successfully: the link works, forget past failures.
    pub fn frame_received(self) -> Self {
        match self {
            Self::Open { rejection, .. } => Self::Open {
                attempt: 0,
                rejection,
            },
            other => other.ignore("frame_received"),
        }
    }

    /// The server refused us on the open socket.
    pub fn rejected(self, tag: Tag) -> Self {
        match self {
            Self::Open { attempt, .. } => Self::Open {
                attempt,
                rejection: Some(tag),
            },
            other => other.ignore("rejected"),
        }
    }

    /// The open socket went away.
    pub fn dropped(self, clean: bool, policy: &RetryPolicy) -> Self {
        match self {
            Self::Open {
                rejection: Some(tag),
                ..
            } => Self::Closed(CloseReason::Rejected(tag)),
            Self::Open { .. } if clean => Self::Closed(CloseReason::Clean),
            Self::Open { attempt, .. } => Self::failed(attempt, policy),
            other => other.ignore("dropped"),
        }
    }

    /// The socket never opened.
    pub fn connect_failed(self, policy: &RetryPolicy) -> Self {
        match self {
            Self::Connecting { attempt } => Self::failed(attempt, policy),
            other => other.ignore("connect_failed"),
        }
    }

    /// The existence check finished. `None` means the check itself failed.
    /// Only an available room is worth another socket.
    pub fn room_checked(self, status: Option<RoomStatus>) -> Self {
        match (self, status) {
            (reconnecting @ Self::Reconnecting { .. }, Some(RoomStatus::Available)) => {
                reconnecting
            }
            (Self::Reconnecting { .. }, Some(RoomStatus::NotFound)) => {
                Self::Closed(CloseReason::RoomGone)
            }
            (Self::Reconnecting { .. }, Some(RoomStatus::Locked)) => {
                Self::Closed(CloseReason::RoomLocked)
            }
            (Self::Reconnecting { .. }, None) => Self::Closed(CloseReason::CheckFailed),
            (other, _) => other.ignore("room_checked"),
        }
    }

    /// A pending retry needs a reconnection token. Without one there is
    /// nothing to present to the server, so the session ends now.
    pub fn require_token(self, has_token: bool) -> Self {
        match self {
            Self::Reconnecting { .. } if !has_token => Self::Closed(CloseReason::MissingToken),
            other => other,
        }
    }

    /// The retry delay elapsed.
    pub fn retry(self) -> Self {
        match self {
            Self::Reconnecting { attempt } => Self::Connecting { attempt },
            other => other.ignore("retry"),
        }
    }

    /// A retry was due but the session can't prove its identity.
    pub fn missing_token(self) -> Self {
        match self {
            Self::Closed(_) => self,
            _ => Self::Closed(CloseReason::MissingToken),
        }
    }

    /// The user left. Final from any state; an existing close reason wins.
    pub fn abandon(self) -> Self {
        match self {
            Self::Closed(_) => self,
            _ => Self::Closed(CloseReason::Abandoned),
        }
    }

    fn failed(attempt: u32, policy: &RetryPolicy) -> Self {
        let failures = attempt.saturating_add(1);
        if failures >= policy.max_attempts {
            Self::Closed(CloseReason::RetriesExhausted { attempts: failures })
        } else {
            Self::Reconnecting { attempt: failures }
        }
    }

    fn ignore(self, input: &str) -> Self {
        tracing::debug!(state = %self, input, "input does not apply, state unchanged");
        self
    }
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting { attempt } => write!(f, "Connecting({attempt})"),
            Self::Open { attempt, .. } => write!(f, "Open({attempt})"),
            Self::Reconnecting { attempt } => write!(f, "Reconnecting({attempt})"),
            Self::Closed(reason) => write!(f, "Closed({reason})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[test]
    fn test_retry_policy_defaults() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_attempts, 3);
        assert_eq!(p.delay, Duration::from_secs(1));
    }

    #[test]
    fn test_conn_state_happy_path() {
        let s = ConnState::initial().opened();
        assert_eq!(
            s,
            ConnState::Open {
                attempt: 0,
                rejection: None
            }
        );
        assert!(s.is_open());
    }

    #[test]
    fn test_conn_state_clean_drop_is_final() {
        let s = ConnState::initial().opened().dropped(true, &policy());
        assert_eq!(s, ConnState::Closed(CloseReason::Clean));
    }

    #[test]
    fn test_conn_state_unclean_drop_reconnects() {
        let s = ConnState::initial().opened().dropped(false, &policy());
        assert_eq!(s, ConnState::Reconnecting { attempt: 1 });

        let s = s.room_checked(Some(RoomStatus::Available)).retry().opened();
        assert_eq!(s.attempt(), Some(1));
    }

    #[test]
    fn test_conn_state_three_consecutive_failures_close() {
        let p = policy();
        let mut s = ConnState::initial();
        for _ in 0..2 {
            s = s
                .opened()
                .dropped(false, &p)
                .room_checked(Some(RoomStatus::Available))
                .retry();
        }
        assert_eq!(s, ConnState::Connecting { attempt: 2 });

        let s = s.opened().dropped(false, &p);
        assert_eq!(
            s,
            ConnState::Closed(CloseReason::RetriesExhausted { attempts: 3 })
        );
        // Nothing revives a closed session.
        assert!(s.clone().retry().is_closed());
        assert!(s.opened().is_closed());
    }

    #[test]
    fn test_conn_state_frame_resets_failure_count() {
        let p = policy();
        let s = ConnState::initial()
            .opened()
            .dropped(false, &p)
            .room_checked(Some(RoomStatus::Available))
            .retry()
            .opened()
            .frame_received();
        assert_eq!(s.attempt(), Some(0));
        assert_eq!(s.dropped(false, &p), ConnState::Reconnecting { attempt: 1 });
    }

    #[test]
    fn test_conn_state_connect_failure_counts() {
        let p = policy();
        let s = ConnState::initial().connect_failed(&p);
        assert_eq!(s, ConnState::Reconnecting { attempt: 1 });
    }

    #[test]
    fn test_conn_state_room_gone_is_final() {
        let s = ConnState::Reconnecting { attempt: 1 }
            .room_checked(Some(RoomStatus::NotFound));
        assert_eq!(s, ConnState::Closed(CloseReason::RoomGone));
    }

    #[test]
    fn test_conn_state_locked_room_is_final() {
        let s = ConnState::Reconnecting { attempt: 1 }
            .room_checked(Some(RoomStatus::Locked));
        assert_eq!(s, ConnState::Closed(CloseReason::RoomLocked));
    }

    #[test]
    fn test_conn_state_failed_check_is_final() {
        let s = ConnState::Reconnecting { attempt: 2 }.room_checked(None);
        assert_eq!(s, ConnState::Closed(CloseReason::CheckFailed));
    }

    #[test]
    fn test_conn_state_require_token_closes_pending_retry() {
        let p = policy();
        let s = ConnState::initial().connect_failed(&p).require_token(false);
        assert_eq!(s, ConnState::Closed(CloseReason::MissingToken));

        let s = ConnState::initial().connect_failed(&p).require_token(true);
        assert_eq!(s, ConnState::Reconnecting { attempt: 1 });

        // Only a pending retry is affected.
        let open = ConnState::initial().opened();
        assert_eq!(open.clone().require_token(false), open);
    }

    #[test]
    fn test_conn_state_rejection_makes_any_drop_final() {
        let s = ConnState::initial()
            .opened()
            .rejected(Tag::BadAuth)
            .dropped(false, &policy());
        assert_eq!(s, ConnState::Closed(CloseReason::Rejected(Tag::BadAuth)));
    }

    #[test]
    fn test_conn_state_abandon_keeps_existing_reason() {
        assert_eq!(
            ConnState::initial().abandon(),
            ConnState::Closed(CloseReason::Abandoned)
        );
        let gone = ConnState::Closed(CloseReason::RoomGone);
        assert_eq!(gone.clone().abandon(), gone);
    }

    #[test]
    fn test_close_reason_is_failure() {
        assert!(!CloseReason::Clean.is_failure());
        assert!(!CloseReason::Abandoned.is_failure());
        assert!(CloseReason::RoomGone.is_failure());
        assert!(CloseReason::RoomLocked.is_failure());
        assert!(CloseReason::CheckFailed.is_failure());
        assert!(CloseReason::RetriesExhausted { attempts: 3 }.is_failure());
    }
}
