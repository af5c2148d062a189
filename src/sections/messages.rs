//! The `replay.message.events` section: chat and lobby pings.
//!
//! # Record Layout
//!
//! ```text
//! [frame delta: 1-4 bytes]  same encoding as game events
//! [player: low 4 bits]
//! [flags: u8]
//! [payload]
//! ```
//!
//! | Flags | Payload |
//! |-------|---------|
//! | high bit clear | chat: length byte, then text |
//! | `0x80` | 4 bytes, sent by every player except the recorder |
//! | `0x83` | 8-byte ping |
//! | other high-bit values | none |
//!
//! For chat, the two low flag bits select the channel and bits `0x08` and
//! `0x10` add 64 and 128 to the length byte.

use std::fmt;

use serde::Serialize;

use crate::binary::Cursor;
use crate::error::Result;
use crate::events::read_timestamp;
use crate::stream::{RecordDecoder, StreamDecoder};

/// Section file name.
pub const MESSAGES_SECTION: &str = "replay.message.events";

const OBSERVER_PRESENCE_FLAGS: u8 = 0x80;
const PING_FLAGS: u8 = 0x83;

/// Chat channel from the low flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChatChannel {
    /// Everyone.
    All,
    /// Custom channel 1.
    Channel1,
    /// Teammates.
    Allies,
    /// Custom channel 3.
    Channel3,
}

impl ChatChannel {
    /// Extracts the channel from the flags byte.
    #[must_use]
    pub fn from_flags(flags: u8) -> Self {
        match flags & 0x03 {
            0 => ChatChannel::All,
            1 => ChatChannel::Channel1,
            2 => ChatChannel::Allies,
            _ => ChatChannel::Channel3,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ChatChannel::All => "All",
            ChatChannel::Channel1 => "Channel #1",
            ChatChannel::Allies => "Allies",
            ChatChannel::Channel3 => "Channel #3",
        }
    }
}

impl fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload of a message record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum MessagePayload {
    /// A chat line.
    Chat {
        /// Destination channel.
        channel: ChatChannel,
        /// Message text, decoded lossily.
        text: String,
    },
    /// Flags `0x83`.
    Ping {
        /// Raw payload.
        data: [u8; 8],
    },
    /// Flags `0x80`.
    ObserverPresence {
        /// Raw payload.
        data: [u8; 4],
    },
    /// Any other high-bit flag value; no payload.
    Other,
}

/// One record of the message section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    /// Absolute frame.
    pub frame: u64,
    /// Sending player's id (1-based).
    pub player_id: u8,
    /// Raw flags byte.
    pub flags: u8,
    /// Decoded payload.
    pub payload: MessagePayload,
}

impl MessageEvent {
    /// Returns `true` for a chat line.
    #[must_use]
    pub fn is_chat(&self) -> bool {
        matches!(self.payload, MessagePayload::Chat { .. })
    }

    /// Returns `true` for the presence record the recorder never sends.
    #[must_use]
    pub fn is_observer_presence(&self) -> bool {
        matches!(self.payload, MessagePayload::ObserverPresence { .. })
    }
}

impl fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            MessagePayload::Chat { channel, text } => write!(
                f,
                "[P{} @{}] ({}) {}",
                self.player_id, self.frame, channel, text
            ),
            MessagePayload::Ping { .. } => write!(f, "[P{} @{}] ping", self.player_id, self.frame),
            MessagePayload::ObserverPresence { .. } => {
                write!(f, "[P{} @{}] presence", self.player_id, self.frame)
            }
            MessagePayload::Other => write!(
                f,
                "[P{} @{}] flags 0x{:02X}",
                self.player_id, self.frame, self.flags
            ),
        }
    }
}

/// Decodes message records.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageDecoder;

impl RecordDecoder for MessageDecoder {
    type Record = MessageEvent;

    fn section(&self) -> &'static str {
        MESSAGES_SECTION
    }

    fn decode_record(&self, cursor: &mut Cursor<'_>, frame: &mut u64) -> Result<MessageEvent> {
        let delta = read_timestamp(cursor)?;
        let player_id = cursor.read_u8()? & 0x0F;
        let flags = cursor.read_u8()?;

        let payload = match flags {
            PING_FLAGS => MessagePayload::Ping {
                data: cursor.read_array()?,
            },
            OBSERVER_PRESENCE_FLAGS => MessagePayload::ObserverPresence {
                data: cursor.read_array()?,
            },
            f if f & 0x80 == 0 => decode_chat(cursor, f)?,
            _ => MessagePayload::Other,
        };

        *frame += u64::from(delta);
        Ok(MessageEvent {
            frame: *frame,
            player_id,
            flags,
            payload,
        })
    }
}

fn decode_chat(cursor: &mut Cursor<'_>, flags: u8) -> Result<MessagePayload> {
    let mut length = usize::from(cursor.read_u8()?);
    if flags & 0x08 != 0 {
        length += 64;
    }
    if flags & 0x10 != 0 {
        length += 128;
    }

    let text = String::from_utf8_lossy(cursor.read(length)?).into_owned();
    Ok(MessagePayload::Chat {
        channel: ChatChannel::from_flags(flags),
        text,
    })
}

/// Incremental decoder for the message section.
pub type MessageStream = StreamDecoder<MessageDecoder>;
