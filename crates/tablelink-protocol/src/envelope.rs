//! The envelope: one unit of wire communication.

use serde::{Deserialize, Serialize};

use crate::types::null_as_default;
use crate::{Client, ProtocolError, Table, Tag};

/// Which side an envelope's tag belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client → server. The tag travels in `Request`.
    Request,
    /// Server → client. The tag travels in `Response`.
    Response,
}

/// A tag plus its optional payloads.
///
/// ## Example
///
/// ```rust
/// use tablelink_protocol::{Codec, Envelope, MsgPackCodec, Tag};
///
/// let chat = Envelope::request(Tag::ChatMsg).with_msg("gg");
/// let bytes = MsgPackCodec.encode(&chat).unwrap();
/// let decoded: Envelope = MsgPackCodec.decode(&bytes).unwrap();
/// assert_eq!(decoded, chat);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WireEnvelope", from = "WireEnvelope")]
pub struct Envelope {
    pub direction: Direction,
    pub tag: Tag,
    /// Identity/settings, or the acting player.
    pub client: Option<Client>,
    /// Chat text, error text, or the private reconnection token.
    pub msg: Option<String>,
    pub table: Option<Table>,
}

impl Envelope {
    /// An empty client → server envelope.
    pub fn request(tag: Tag) -> Self {
        Self::new(Direction::Request, tag)
    }

    /// An empty server → client envelope.
    pub fn response(tag: Tag) -> Self {
        Self::new(Direction::Response, tag)
    }

    fn new(direction: Direction, tag: Tag) -> Self {
        Self {
            direction,
            tag,
            client: None,
            msg: None,
            table: None,
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the message field. An empty string means "no message".
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        self.msg = (!msg.is_empty()).then_some(msg);
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    /// The message text, or `""`.
    pub fn msg_str(&self) -> &str {
        self.msg.as_deref().unwrap_or_default()
    }

    /// Checks the payload presence rules for this tag.
    ///
    /// # Errors
    /// Returns [`ProtocolError::MissingPayload`] when a "needs table" tag
    /// has no table, or a "needs player" tag has no client with an ID and
    /// a player.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.tag.needs_table() && self.table.is_none() {
            return Err(ProtocolError::MissingPayload {
                tag: self.tag,
                missing: "table",
            });
        }
        if self.tag.needs_player()
            && !self.client.as_ref().is_some_and(Client::has_player)
        {
            return Err(ProtocolError::MissingPayload {
                tag: self.tag,
                missing: "player",
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire shape
// ---------------------------------------------------------------------------

/// The envelope exactly as the server lays it out.
///
/// `Request` and `Response` are both present in the server's struct; a zero
/// (or missing) value means "unset". Requests omit `Response` entirely.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct WireEnvelope {
    client: Option<Client>,
    #[serde(skip_serializing_if = "is_zero")]
    request: u64,
    #[serde(skip_serializing_if = "is_zero")]
    response: u64,
    #[serde(deserialize_with = "null_as_default")]
    msg: String,
    table: Option<Table>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl From<Envelope> for WireEnvelope {
    fn from(env: Envelope) -> Self {
        let bits = env.tag.bits();
        let (request, response) = match env.direction {
            Direction::Request => (bits, 0),
            Direction::Response => (0, bits),
        };
        Self {
            client: env.client,
            request,
            response,
            msg: env.msg.unwrap_or_default(),
            table: env.table,
        }
    }
}

impl From<WireEnvelope> for Envelope {
    fn from(wire: WireEnvelope) -> Self {
        let (direction, bits) = if wire.response != 0 {
            (Direction::Response, wire.response)
        } else {
            (Direction::Request, wire.request)
        };
        Self {
            direction,
            tag: Tag::from_bits(bits),
            client: wire.client,
            msg: (!wire.msg.is_empty()).then_some(wire.msg),
            table: wire.table,
        }
    }
}
