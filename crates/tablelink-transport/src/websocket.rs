//! WebSocket connector implementation using `tokio-tungstenite`.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::protocol::CloseFrame as WsCloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{CloseFrame, Connection, ConnectionId, Connector, Inbound, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Close code a peer reports when it closed without giving a status.
const CLOSE_NO_STATUS: u16 = 1005;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Connector`] that dials `ws://` (and, with the `tls` feature,
/// `wss://`) URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError> {
        let (ws, _response) =
            tokio_tungstenite::connect_async(url).await.map_err(|e| {
                TransportError::ConnectFailed {
                    url: url.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        e,
                    ),
                }
            })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, url, "WebSocket connection opened");

        // Split so a pending `recv` never blocks a `send`.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// Writing to a socket that is closing or closed is reported as
/// `ConnectionClosed`; anything else is a plain send failure.
fn send_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed
        | tungstenite::Error::Protocol(ProtocolError::SendAfterClosing) => {
            TransportError::ConnectionClosed(e.to_string())
        }
        e => TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            e,
        )),
    }
}

/// A single client WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let msg = Message::Binary(data.to_vec().into());
        self.sink.lock().await.send(msg).await.map_err(send_error)
    }

    async fn recv(&self) -> Result<Inbound, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Inbound::Frame(data.into()));
                }
                Some(Ok(Message::Text(text))) => {
                    return Ok(Inbound::Frame(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let frame = match frame {
                        Some(f) => CloseFrame {
                            code: u16::from(f.code),
                            reason: f.reason.as_str().to_string(),
                        },
                        None => CloseFrame {
                            code: CLOSE_NO_STATUS,
                            reason: String::new(),
                        },
                    };
                    tracing::debug!(id = %self.id, %frame, "peer closed connection");
                    return Ok(Inbound::Closed(frame));
                }
                Some(Ok(_)) => continue, // skip ping/pong/frame
                None => {
                    return Ok(Inbound::Closed(CloseFrame::abnormal(
                        "stream ended",
                    )));
                }
                Some(Err(
                    e @ (tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::AlreadyClosed
                    | tungstenite::Error::Protocol(
                        ProtocolError::ResetWithoutClosingHandshake,
                    )),
                )) => {
                    return Ok(Inbound::Closed(CloseFrame::abnormal(
                        e.to_string(),
                    )));
                }
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self, frame: CloseFrame) -> Result<(), TransportError> {
        let msg = Message::Close(Some(WsCloseFrame {
            code: CloseCode::from(frame.code),
            reason: frame.reason.into(),
        }));
        self.sink.lock().await.send(msg).await.map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
