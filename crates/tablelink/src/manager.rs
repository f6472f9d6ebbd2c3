//! The connection manager: one task that owns the socket for a room
//! session and walks the [`ConnState`] machine.
//!
//! Every socket gets a fresh epoch. Events carry the epoch they were
//! produced under, and outbound envelopes are stamped with the epoch the
//! handle saw when the intent was submitted. An envelope stamped for an
//! earlier socket is dropped rather than replayed on a newer one.
//!
//! Statuses and frames share one bounded channel, in order. When the
//! handle falls behind, the manager stops reading the socket until it
//! catches up; no frame is ever skipped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tablelink_protocol::{Codec, Envelope, Tag};
use tablelink_session::{
    CloseReason, ConnState, RetryPolicy, RoomChecker, RoomSession, is_rejection,
};
use tablelink_transport::{CloseFrame, Connection, Connector, Inbound};
use tokio::sync::{mpsc, oneshot};

/// Close reason sent with the goodbye frame.
pub const EXIT_REASON: &str = "web client exited";

/// Something the manager tells the handle.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnEvent {
    /// The connection state changed.
    Status { epoch: u64, state: ConnState },

    /// A decoded server envelope. `seq` counts frames within the epoch,
    /// starting at 1.
    Frame {
        epoch: u64,
        seq: u64,
        envelope: Envelope,
    },
}

/// An envelope queued by the handle, stamped with its epoch.
#[derive(Debug)]
pub(crate) struct Outbound {
    pub(crate) epoch: u64,
    pub(crate) envelope: Envelope,
}

/// What the handle can see of the manager without waiting on events.
///
/// The epoch and the open flag share one word (`epoch << 1 | open`) so a
/// reader never pairs one socket's flag with another socket's epoch.
#[derive(Debug, Default)]
pub(crate) struct LinkState {
    word: AtomicU64,
}

impl LinkState {
    /// The current epoch, and whether its socket is open.
    pub(crate) fn snapshot(&self) -> (u64, bool) {
        let word = self.word.load(Ordering::Acquire);
        (word >> 1, word & 1 == 1)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.snapshot().1
    }

    fn begin(&self, epoch: u64) {
        self.word.store(epoch << 1, Ordering::Release);
    }

    fn set_open(&self, open: bool) {
        if open {
            self.word.fetch_or(1, Ordering::AcqRel);
        } else {
            self.word.fetch_and(!1, Ordering::AcqRel);
        }
    }
}

// ---------------------------------------------------------------------------
// Teardown guard
// ---------------------------------------------------------------------------

/// Says goodbye on an open socket: `CLIENT_EXITED`, then a normal close.
///
/// If the guard is dropped while still armed (the task was aborted or
/// panicked) the goodbye is spawned onto the current runtime.
struct TeardownGuard<T: Connection> {
    conn: Option<Arc<T>>,
    exit_frame: Option<Vec<u8>>,
}

impl<T: Connection> TeardownGuard<T> {
    fn new(conn: Arc<T>, exit_frame: Option<Vec<u8>>) -> Self {
        Self {
            conn: Some(conn),
            exit_frame,
        }
    }

    /// The socket is already gone; nothing to say.
    fn disarm(&mut self) {
        self.conn = None;
    }

    async fn finish(&mut self) {
        if let Some(conn) = self.conn.take() {
            goodbye(conn.as_ref(), self.exit_frame.take()).await;
        }
    }
}

impl<T: Connection> Drop for TeardownGuard<T> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        let exit_frame = self.exit_frame.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    goodbye(conn.as_ref(), exit_frame).await;
                });
            }
            Err(_) => tracing::debug!(conn_id = %conn.id(), "no runtime, goodbye skipped"),
        }
    }
}

async fn goodbye<T: Connection>(conn: &T, exit_frame: Option<Vec<u8>>) {
    let conn_id = conn.id();
    if let Some(frame) = exit_frame {
        if let Err(e) = conn.send(&frame).await {
            tracing::debug!(%conn_id, error = %e, "exit frame not sent");
        }
    }
    if let Err(e) = conn.close(CloseFrame::normal(EXIT_REASON)).await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }
}

// ---------------------------------------------------------------------------
// ConnectionManager
// ---------------------------------------------------------------------------

/// Owns the socket for one room session and keeps it alive.
///
/// Built and spawned by [`TableClient::start`](crate::TableClient::start);
/// [`run`](Self::run) returns the reason the session ended.
pub struct ConnectionManager<K: Connector, R: RoomChecker, C: Codec> {
    connector: K,
    checker: R,
    codec: C,
    session: RoomSession,
    policy: RetryPolicy,
    link: Arc<LinkState>,
    events: mpsc::Sender<ConnEvent>,
    commands: mpsc::UnboundedReceiver<Outbound>,
    shutdown: oneshot::Receiver<()>,
}

/// How a single open socket ended.
enum SocketEnd {
    Dropped { clean: bool },
    Shutdown,
}

impl<K, R, C> ConnectionManager<K, R, C>
where
    K: Connector,
    R: RoomChecker,
    C: Codec,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        connector: K,
        checker: R,
        codec: C,
        session: RoomSession,
        policy: RetryPolicy,
        link: Arc<LinkState>,
        events: mpsc::Sender<ConnEvent>,
        commands: mpsc::UnboundedReceiver<Outbound>,
        shutdown: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            connector,
            checker,
            codec,
            session,
            policy,
            link,
            events,
            commands,
            shutdown,
        }
    }

    /// Runs until the session is closed for good.
    pub async fn run(mut self) -> CloseReason {
        let mut state = ConnState::initial();
        let mut epoch = 0u64;

        loop {
            state = match state {
                ConnState::Connecting { attempt } => {
                    epoch += 1;
                    self.link.begin(epoch);
                    let connecting = ConnState::Connecting { attempt };
                    self.emit_status(epoch, &connecting).await;
                    self.connect(connecting, epoch).await
                }
                ConnState::Reconnecting { attempt } => {
                    let reconnecting = ConnState::Reconnecting { attempt };
                    self.emit_status(epoch, &reconnecting).await;
                    self.reconnect(reconnecting).await
                }
                ConnState::Closed(reason) => {
                    self.link.set_open(false);
                    let closed = ConnState::Closed(reason.clone());
                    self.emit_status(epoch, &closed).await;
                    tracing::info!(room = %self.session.endpoint(), %reason, "session closed");
                    return reason;
                }
                // connect() never hands back an open state.
                open @ ConnState::Open { .. } => open.dropped(false, &self.policy),
            };
        }
    }

    async fn connect(&mut self, state: ConnState, epoch: u64) -> ConnState {
        let attempt = state.attempt().unwrap_or_default();
        let opening = match self.session.opening_envelope(attempt) {
            Ok(env) => env,
            Err(e) => {
                tracing::warn!(room = %self.session.endpoint(), error = %e, "cannot reconnect");
                return state.missing_token();
            }
        };

        let url = self.session.endpoint().socket_url();
        tracing::debug!(%url, attempt, epoch, "connecting");
        let result = tokio::select! {
            biased;
            _ = &mut self.shutdown => return state.abandon(),
            result = self.connector.connect(&url) => result,
        };
        let conn = match result {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(%url, attempt, error = %e, "connect failed");
                return self.settle(state.connect_failed(&self.policy));
            }
        };

        let mut state = state.opened();
        self.emit_status(epoch, &state).await;
        let end = self.drive(conn, epoch, opening, &mut state).await;
        self.link.set_open(false);

        match end {
            SocketEnd::Dropped { clean } => self.settle(state.dropped(clean, &self.policy)),
            SocketEnd::Shutdown => state.abandon(),
        }
    }

    /// A retry is only worth scheduling if the server issued a token.
    fn settle(&self, next: ConnState) -> ConnState {
        let next = next.require_token(self.session.token().is_some());
        if next == ConnState::Closed(CloseReason::MissingToken) {
            tracing::warn!(room = %self.session.endpoint(), "socket lost before the server issued a token");
        }
        next
    }

    async fn reconnect(&mut self, state: ConnState) -> ConnState {
        let endpoint = self.session.endpoint().clone();
        let status = tokio::select! {
            biased;
            _ = &mut self.shutdown => return state.abandon(),
            result = self.checker.check(&endpoint) => match result {
                Ok(status) => Some(status),
                Err(e) => {
                    tracing::warn!(room = %endpoint, error = %e, "room check failed");
                    None
                }
            },
        };

        let state = state.room_checked(status);
        if state.is_closed() {
            tracing::info!(room = %endpoint, ?status, "not retrying");
            return state;
        }

        tokio::select! {
            biased;
            _ = &mut self.shutdown => state.abandon(),
            () = tokio::time::sleep(self.policy.delay) => state.retry(),
        }
    }

    /// Pumps one open socket until it drops or the user leaves.
    async fn drive(
        &mut self,
        conn: K::Connection,
        epoch: u64,
        opening: Envelope,
        state: &mut ConnState,
    ) -> SocketEnd {
        let conn = Arc::new(conn);
        let conn_id = conn.id();
        let exit_frame = match self.codec.encode(&Envelope::request(Tag::ClientExited)) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "could not encode exit frame");
                None
            }
        };
        let mut guard = TeardownGuard::new(Arc::clone(&conn), exit_frame);

        if let Err(e) = self.send_envelope(conn.as_ref(), &opening).await {
            tracing::warn!(%conn_id, tag = %opening.tag, error = %e, "opening frame not sent");
            guard.disarm();
            return SocketEnd::Dropped { clean: false };
        }
        self.link.set_open(true);
        tracing::info!(%conn_id, epoch, tag = %opening.tag, "connected");

        let mut seq = 0u64;
        loop {
            tokio::select! {
                // Intents queued before a shutdown still go out ahead of the goodbye.
                biased;
                command = self.commands.recv() => match command {
                    Some(out) if out.epoch == epoch => {
                        if let Err(e) = self.send_envelope(conn.as_ref(), &out.envelope).await {
                            tracing::warn!(%conn_id, tag = %out.envelope.tag, error = %e, "send failed");
                        }
                    }
                    Some(out) => {
                        tracing::warn!(
                            %conn_id,
                            tag = %out.envelope.tag,
                            stamped = out.epoch,
                            current = epoch,
                            "dropping envelope queued for an earlier connection"
                        );
                    }
                    None => {
                        self.link.set_open(false);
                        guard.finish().await;
                        return SocketEnd::Shutdown;
                    }
                },
                _ = &mut self.shutdown => {
                    self.link.set_open(false);
                    guard.finish().await;
                    return SocketEnd::Shutdown;
                }
                inbound = conn.recv() => match inbound {
                    Ok(Inbound::Frame(bytes)) => {
                        let envelope = match self.codec.decode::<Envelope>(&bytes) {
                            Ok(env) => env,
                            Err(e) => {
                                tracing::warn!(%conn_id, len = bytes.len(), error = %e, "undecodable frame dropped");
                                continue;
                            }
                        };
                        seq += 1;
                        *state = state.clone().frame_received();
                        self.observe(&envelope, state);
                        if !self.emit_frame(epoch, seq, envelope).await {
                            self.link.set_open(false);
                            guard.finish().await;
                            return SocketEnd::Shutdown;
                        }
                    }
                    Ok(Inbound::Closed(frame)) => {
                        tracing::info!(%conn_id, close = %frame, "socket closed");
                        guard.disarm();
                        return SocketEnd::Dropped { clean: frame.is_clean() };
                    }
                    Err(e) => {
                        tracing::warn!(%conn_id, error = %e, "receive failed");
                        guard.disarm();
                        return SocketEnd::Dropped { clean: false };
                    }
                },
            }
        }
    }

    /// Session bookkeeping for an incoming envelope.
    fn observe(&mut self, envelope: &Envelope, state: &mut ConnState) {
        match envelope.tag {
            Tag::NewConn => {
                if let Some(token) = envelope.msg.as_deref() {
                    self.session.record_token(token);
                }
            }
            Tag::RoomSettings => {
                let name = envelope
                    .client
                    .as_ref()
                    .and_then(|c| c.settings.as_ref())
                    .and_then(|s| s.admin.as_ref())
                    .map(|a| a.room_name.as_str())
                    .filter(|n| !n.is_empty());
                if let Some(name) = name {
                    if let Err(e) = self.session.rename_room(name) {
                        tracing::warn!(room = name, error = %e, "ignoring room rename");
                    }
                }
            }
            _ => {}
        }
        if is_rejection(envelope) {
            tracing::info!(tag = %envelope.tag, msg = envelope.msg_str(), "server refused the session");
            *state = state.clone().rejected(envelope.tag);
        }
    }

    async fn send_envelope(
        &self,
        conn: &K::Connection,
        envelope: &Envelope,
    ) -> Result<(), crate::ClientError> {
        let bytes = self.codec.encode(envelope)?;
        conn.send(&bytes).await?;
        Ok(())
    }

    async fn emit_status(&self, epoch: u64, state: &ConnState) {
        tracing::debug!(epoch, %state, "connection state");
        let event = ConnEvent::Status {
            epoch,
            state: state.clone(),
        };
        if self.events.send(event).await.is_err() {
            tracing::debug!("event receiver dropped");
        }
    }

    /// Hands a frame to the handle, waiting for room in the channel.
    /// Returns `false` if shutdown was requested while waiting.
    async fn emit_frame(&mut self, epoch: u64, seq: u64, envelope: Envelope) -> bool {
        let event = ConnEvent::Frame {
            epoch,
            seq,
            envelope,
        };
        tokio::select! {
            biased;
            sent = self.events.send(event) => {
                if sent.is_err() {
                    tracing::debug!("event receiver dropped");
                }
                true
            }
            _ = &mut self.shutdown => {
                tracing::debug!(epoch, seq, "shutdown while waiting on the handle");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_state_snapshot_pairs_epoch_with_open_flag() {
        let link = LinkState::default();
        assert_eq!(link.snapshot(), (0, false));

        link.begin(1);
        link.set_open(true);
        assert_eq!(link.snapshot(), (1, true));
        assert!(link.is_open());

        // A new socket starts closed under its own epoch.
        link.begin(2);
        assert_eq!(link.snapshot(), (2, false));
        link.set_open(true);
        link.set_open(false);
        assert_eq!(link.snapshot(), (2, false));
    }
}
