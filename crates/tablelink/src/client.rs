//! The table client handle: spawns the connection manager and mirrors the
//! table from its events.

use std::sync::Arc;
use std::time::Duration;

use tablelink_protocol::{Codec, Envelope};
use tablelink_session::{CloseReason, ConnState, RoomChecker, RoomSession};
use tablelink_state::{Advisory, Presentation, TableView, reduce};
use tablelink_transport::Connector;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::manager::{ConnEvent, ConnectionManager, LinkState, Outbound};
use crate::{ClientConfig, ClientError, Intent};

/// What changed after one manager event.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// The connection state changed.
    Status(ConnState),

    /// A server envelope was applied to the view.
    Frame {
        envelope: Envelope,
        advisories: Vec<Advisory>,
    },
}

// ---------------------------------------------------------------------------
// Mirror
// ---------------------------------------------------------------------------

/// The handle's copy of the world, folded from manager events.
///
/// Events arrive on one ordered channel and the manager finishes a socket
/// before it announces the next, so every frame belongs to the socket of
/// the latest status. `epoch` and `seq` only label log lines here.
#[derive(Debug, Default)]
struct Mirror {
    view: TableView,
    presentation: Presentation,
    status: Option<ConnState>,
    room: String,
}

impl Mirror {
    fn new(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            ..Self::default()
        }
    }

    /// Folds one event in.
    fn apply(&mut self, event: ConnEvent) -> Update {
        match event {
            ConnEvent::Status { state, .. } => {
                self.presentation.apply_status(&state, &self.room);
                self.status = Some(state.clone());
                Update::Status(state)
            }
            ConnEvent::Frame {
                epoch,
                seq,
                envelope,
            } => {
                let advisories = reduce(&mut self.view, &envelope);
                for advisory in &advisories {
                    match advisory {
                        Advisory::RoomRenamed(name) => self.room.clone_from(name),
                        Advisory::ProtocolViolation(text) => {
                            tracing::warn!(epoch, seq, tag = %envelope.tag, "{text}");
                        }
                        Advisory::Reconciliation(e) => {
                            tracing::warn!(epoch, seq, tag = %envelope.tag, error = %e, "seat reconciliation failed");
                        }
                        _ => {}
                    }
                    self.presentation.apply(advisory);
                }
                Update::Frame {
                    envelope,
                    advisories,
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TableClient
// ---------------------------------------------------------------------------

/// A handle to one room session.
///
/// Dropping the handle asks the manager to say goodbye and stop; use
/// [`shutdown`](Self::shutdown) to wait for that to finish.
pub struct TableClient {
    commands: mpsc::UnboundedSender<Outbound>,
    events: mpsc::Receiver<ConnEvent>,
    link: Arc<LinkState>,
    mirror: Mirror,
    task: Option<JoinHandle<CloseReason>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    shutdown_timeout: Duration,
}

impl TableClient {
    /// Spawns the connection manager for `session` and returns its handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<K, R, C>(
        connector: K,
        checker: R,
        codec: C,
        session: RoomSession,
        config: &ClientConfig,
    ) -> Self
    where
        K: Connector,
        R: RoomChecker,
        C: Codec,
    {
        let (event_tx, event_rx) = mpsc::channel(config.event_capacity.max(1));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let link = Arc::new(LinkState::default());
        let room = session.endpoint().room().to_string();

        tracing::info!(room = %session.endpoint(), "starting table client");
        let manager = ConnectionManager::new(
            connector,
            checker,
            codec,
            session,
            config.retry,
            Arc::clone(&link),
            event_tx,
            cmd_rx,
            shutdown_rx,
        );
        let task = tokio::spawn(manager.run());

        Self {
            commands: cmd_tx,
            events: event_rx,
            link,
            mirror: Mirror::new(room),
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// Joins `room` on the configured server over WebSocket + MessagePack.
    ///
    /// # Errors
    /// [`ClientError::Session`] for an unusable server address or room id.
    #[cfg(all(feature = "websocket", feature = "http"))]
    pub fn connect(
        config: &ClientConfig,
        room: &str,
        settings: tablelink_protocol::ClientSettings,
    ) -> Result<Self, ClientError> {
        let session = RoomSession::join(config.endpoint(room)?, settings);
        Ok(Self::start(
            tablelink_transport::WebSocketConnector,
            tablelink_session::HttpRoomChecker::new(),
            tablelink_protocol::MsgPackCodec,
            session,
            config,
        ))
    }

    /// Waits for the next change and applies it.
    ///
    /// Returns `None` once the manager has stopped and every event has
    /// been consumed.
    pub async fn next(&mut self) -> Option<Update> {
        let event = self.events.recv().await?;
        Some(self.mirror.apply(event))
    }

    /// Queues an intent for the current socket.
    ///
    /// # Errors
    /// - [`ClientError::NotConnected`] unless the socket is open.
    /// - [`ClientError::NoClient`] if the intent needs your seat and the
    ///   server hasn't assigned one.
    /// - [`ClientError::Shutdown`] once the manager has stopped.
    pub fn send(&self, intent: Intent) -> Result<(), ClientError> {
        let (epoch, open) = self.link.snapshot();
        if !open {
            return Err(ClientError::NotConnected);
        }
        let envelope = intent.into_envelope(self.mirror.view.you())?;
        tracing::debug!(epoch, tag = %envelope.tag, "queueing envelope");
        self.commands
            .send(Outbound { epoch, envelope })
            .map_err(|_| ClientError::Shutdown)
    }

    pub fn view(&self) -> &TableView {
        &self.mirror.view
    }

    pub fn presentation(&self) -> &Presentation {
        &self.mirror.presentation
    }

    /// Closes the current modal.
    pub fn dismiss_modal(&mut self) {
        self.mirror.presentation.dismiss();
    }

    /// The last connection state delivered through [`next`](Self::next).
    pub fn status(&self) -> Option<&ConnState> {
        self.mirror.status.as_ref()
    }

    /// Whether the manager currently has an open socket.
    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    /// The room id, following renames.
    pub fn room(&self) -> &str {
        &self.mirror.room
    }

    /// Says goodbye to the server and stops the manager.
    ///
    /// Events still in flight are applied while waiting, so a manager
    /// blocked on a full channel can finish. Waits up to the configured
    /// shutdown timeout, then aborts. Returns the close reason when the
    /// manager stopped on its own.
    pub async fn shutdown(&mut self) -> Option<CloseReason> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let mut task = self.task.take()?;
        let abort = task.abort_handle();
        let events = &mut self.events;
        let mirror = &mut self.mirror;
        let finished = tokio::time::timeout(self.shutdown_timeout, async {
            loop {
                tokio::select! {
                    joined = &mut task => return joined,
                    Some(event) = events.recv() => {
                        mirror.apply(event);
                    }
                }
            }
        })
        .await;
        match finished {
            Ok(Ok(reason)) => {
                self.drain();
                Some(reason)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "connection manager failed");
                None
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.shutdown_timeout, "shutdown timed out, aborting");
                abort.abort();
                None
            }
        }
    }

    /// Applies events already queued by a stopped manager.
    fn drain(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.mirror.apply(event);
        }
    }
}

impl Drop for TableClient {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
