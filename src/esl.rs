//! Event Socket client for the switch's inbound control connection.
//!
//! The protocol is line oriented: every message is a block of
//! `Name: value` header lines terminated by a blank line, optionally
//! followed by exactly `Content-Length` bytes of body. Only the small
//! subset needed to authenticate, subscribe, and receive events is
//! implemented here.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::event::Event;

/// Event names requested from the switch.
///
/// `vm::maintenance` is the `CUSTOM` subclass carrying voicemail activity.
pub const SUBSCRIBED_EVENTS: &[&str] = &[
    "CHANNEL_CREATE",
    "CHANNEL_ANSWER",
    "CHANNEL_HANGUP_COMPLETE",
    "CUSTOM",
    "vm::maintenance",
];

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_LENGTH: &str = "Content-Length";
const REPLY_TEXT: &str = "Reply-Text";

const AUTH_REQUEST: &str = "auth/request";
const COMMAND_REPLY: &str = "command/reply";
const EVENT_PLAIN: &str = "text/event-plain";
const EVENT_JSON: &str = "text/event-json";
const DISCONNECT_NOTICE: &str = "text/disconnect-notice";

const MAX_LINE_LEN: usize = 65_536;
const MAX_BODY_LEN: usize = 1_048_576; // 1 MB safety limit.

/// Encoding requested for subscribed events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// `text/event-plain`: header lines with URL-encoded values.
    #[default]
    Plain,
    /// `text/event-json`: one flat JSON object per event.
    Json,
}

impl EventFormat {
    /// Keyword used in the `event` subscription command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Json => "json",
        }
    }
}

/// Errors raised by the event socket client.
#[derive(Debug, thiserror::Error)]
pub enum EslError {
    /// Socket read or write failure.
    #[error("event socket I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Connecting and authenticating did not finish in time.
    #[error("timed out logging in to {addr}")]
    Timeout {
        /// Address that was dialed.
        addr: String,
    },
    /// The switch refused the password.
    #[error("event socket authentication rejected: {0}")]
    AuthRejected(String),
    /// A command received a `-ERR` reply.
    #[error("command `{command}` rejected: {reply}")]
    CommandRejected {
        /// The command verb that failed.
        command: String,
        /// Reply text from the switch.
        reply: String,
    },
    /// The peer sent something that is not a valid frame.
    #[error("malformed event socket frame: {0}")]
    Malformed(String),
    /// The peer closed the connection mid-exchange.
    #[error("event socket closed while waiting for {0}")]
    Closed(&'static str),
}

/// One protocol message: outer headers plus optional body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Outer (not URL-encoded) headers.
    pub headers: BTreeMap<String, String>,
    /// Body bytes decoded as UTF-8, when `Content-Length` was present.
    pub body: Option<String>,
}

impl Frame {
    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).map(String::as_str)
    }

    /// The `Reply-Text` header.
    pub fn reply_text(&self) -> Option<&str> {
        self.headers.get(REPLY_TEXT).map(String::as_str)
    }

    /// Whether this is a command reply starting with `+OK`.
    pub fn is_ok(&self) -> bool {
        self.reply_text().is_some_and(|t| t.starts_with("+OK"))
    }
}

/// An authenticated, subscribed connection to the switch.
pub struct EslConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    addr: String,
}

impl std::fmt::Debug for EslConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EslConnection")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl EslConnection {
    /// Dial the switch and authenticate.
    ///
    /// Waits for the `auth/request` greeting, sends the password, and
    /// requires a `+OK` reply. `login_timeout` bounds the whole exchange,
    /// including a peer that accepts but never greets.
    ///
    /// # Errors
    ///
    /// Returns [`EslError::Timeout`] if login does not finish within
    /// `login_timeout`, [`EslError::AuthRejected`] if the password is
    /// refused, or an I/O / framing error.
    pub async fn connect(
        host: &str,
        port: u16,
        password: &str,
        login_timeout: Duration,
    ) -> Result<Self, EslError> {
        let addr = format!("{host}:{port}");
        tokio::time::timeout(login_timeout, Self::login(addr.clone(), password))
            .await
            .map_err(|_| EslError::Timeout { addr })?
    }

    async fn login(addr: String, password: &str) -> Result<Self, EslError> {
        let stream = TcpStream::connect(&addr).await?;

        let (read_half, write_half) = stream.into_split();
        let mut conn = Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            addr,
        };

        loop {
            let frame = conn
                .read_frame()
                .await?
                .ok_or(EslError::Closed("auth/request"))?;
            if frame.content_type() == Some(AUTH_REQUEST) {
                break;
            }
            debug!(content_type = ?frame.content_type(), "ignoring frame before auth request");
        }

        let reply = conn.send_command(&format!("auth {password}")).await?;
        if !reply.is_ok() {
            return Err(EslError::AuthRejected(
                reply.reply_text().unwrap_or("no reply text").to_owned(),
            ));
        }

        info!(addr = %conn.addr, "event socket authenticated");
        Ok(conn)
    }

    /// Subscribe to `events` in the given encoding.
    ///
    /// # Errors
    ///
    /// Returns [`EslError::CommandRejected`] if the switch refuses the
    /// subscription.
    pub async fn subscribe(&mut self, format: EventFormat, events: &[&str]) -> Result<(), EslError> {
        let command = format!("event {} {}", format.as_str(), events.join(" "));
        let reply = self.send_command(&command).await?;
        if !reply.is_ok() {
            return Err(EslError::CommandRejected {
                command,
                reply: reply.reply_text().unwrap_or_default().to_owned(),
            });
        }
        info!(format = format.as_str(), events = %events.join(" "), "subscribed to events");
        Ok(())
    }

    /// Wait for the next event.
    ///
    /// Command replies and other non-event frames are skipped. A JSON event
    /// that fails to parse is logged and skipped. Returns `Ok(None)` when
    /// the switch sends a disconnect notice or closes the socket.
    ///
    /// # Errors
    ///
    /// Returns an error on socket failure or a malformed frame.
    pub async fn recv_event(&mut self) -> Result<Option<Event>, EslError> {
        loop {
            let Some(frame) = self.read_frame().await? else {
                info!(addr = %self.addr, "event socket closed by peer");
                return Ok(None);
            };
            let body = frame.body.as_deref().unwrap_or_default();
            match frame.content_type() {
                Some(EVENT_PLAIN) => return Ok(Some(Event::parse_plain(body))),
                Some(EVENT_JSON) => match Event::parse_json(body) {
                    Ok(event) => return Ok(Some(event)),
                    Err(e) => warn!(error = %e, "skipping unparseable json event"),
                },
                Some(DISCONNECT_NOTICE) => {
                    info!(addr = %self.addr, "event socket disconnect notice received");
                    return Ok(None);
                }
                other => debug!(content_type = ?other, "skipping non-event frame"),
            }
        }
    }

    /// Politely close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the `exit` command cannot be written.
    pub async fn disconnect(mut self) -> Result<(), EslError> {
        self.writer.write_all(b"exit\n\n").await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Address this connection was dialed at.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a command and wait for its `command/reply`.
    async fn send_command(&mut self, command: &str) -> Result<Frame, EslError> {
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\n\n").await?;
        self.writer.flush().await?;

        loop {
            let frame = self
                .read_frame()
                .await?
                .ok_or(EslError::Closed("command reply"))?;
            if frame.content_type() == Some(COMMAND_REPLY) {
                return Ok(frame);
            }
            debug!(content_type = ?frame.content_type(), "ignoring frame while awaiting reply");
        }
    }

    /// Read one frame. `Ok(None)` means clean EOF between frames.
    async fn read_frame(&mut self) -> Result<Option<Frame>, EslError> {
        let mut headers = BTreeMap::new();
        let mut line = Vec::new();
        // Reads stop one byte past the cap.
        let line_limit = u64::try_from(MAX_LINE_LEN)
            .unwrap_or(u64::MAX)
            .saturating_add(1);

        loop {
            line.clear();
            let bytes_read = (&mut self.reader)
                .take(line_limit)
                .read_until(b'\n', &mut line)
                .await?;
            if bytes_read == 0 {
                if headers.is_empty() {
                    return Ok(None);
                }
                return Err(EslError::Malformed("truncated header block".to_owned()));
            }
            if line.len() > MAX_LINE_LEN {
                return Err(EslError::Malformed("header line too long".to_owned()));
            }

            let text = String::from_utf8_lossy(&line);
            let trimmed = text.trim_end_matches(['\r', '\n']);
            if trimmed.is_empty() {
                // Leading blank lines between frames are padding.
                if headers.is_empty() {
                    continue;
                }
                break;
            }

            let (key, value) = trimmed
                .split_once(':')
                .ok_or_else(|| EslError::Malformed(format!("header without colon: {trimmed}")))?;
            headers.insert(key.trim().to_owned(), value.trim().to_owned());
        }

        let body = match headers.get(CONTENT_LENGTH) {
            Some(raw_len) => {
                let len: usize = raw_len
                    .parse()
                    .map_err(|_| EslError::Malformed(format!("bad Content-Length: {raw_len}")))?;
                if len > MAX_BODY_LEN {
                    return Err(EslError::Malformed(format!("body too large: {len} bytes")));
                }
                let mut buf = vec![0_u8; len];
                self.reader.read_exact(&mut buf).await?;
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            None => None,
        };

        Ok(Some(Frame { headers, body }))
    }
}
