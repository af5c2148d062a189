//! Event timestamps and headers.

use serde::Serialize;

use crate::binary::Cursor;
use crate::error::Result;

/// Reads a variable-length frame delta.
///
/// The low 2 bits of the first byte give the number of extra bytes (0 to 3).
/// The first byte's upper 6 bits are the most significant bits of the value
/// and each extra byte shifts in 8 more. Shared by the message and game-event
/// streams; unrelated to the Blizzerial VarInt.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the extra bytes are missing.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::Cursor;
/// use sc2_replay_parser::events::read_timestamp;
///
/// // 1 extra byte: (0x01 << 8) | 0x02
/// let mut cursor = Cursor::new(&[0x05, 0x02]);
/// assert_eq!(read_timestamp(&mut cursor).unwrap(), 0x102);
/// ```
pub fn read_timestamp(cursor: &mut Cursor<'_>) -> Result<u32> {
    let first = cursor.read_u8()?;
    let extra = usize::from(first & 0x03);
    let mut value = u32::from(first >> 2);
    for &byte in cursor.read(extra)? {
        value = (value << 8) | u32::from(byte);
    }
    Ok(value)
}

/// The common prefix of every game event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EventHeader {
    /// Absolute frame: the running sum of deltas since the stream started.
    pub frame: u64,
    /// Frames since the previous event.
    pub frame_delta: u32,
    /// Player slot (low 5 bits of the type byte).
    pub player_id: u8,
    /// Event type (high 3 bits of the type byte).
    pub event_type: u8,
    /// Event code byte.
    pub event_code: u8,
}

impl EventHeader {
    /// High nibble of the event code.
    #[must_use]
    pub fn code_hi(&self) -> u8 {
        self.event_code >> 4
    }

    /// Low nibble of the event code.
    #[must_use]
    pub fn code_lo(&self) -> u8 {
        self.event_code & 0x0F
    }
}

/// Reads an event header, placing it `previous_frame + delta`.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the header is incomplete.
pub fn read_event_header(cursor: &mut Cursor<'_>, previous_frame: u64) -> Result<EventHeader> {
    let frame_delta = read_timestamp(cursor)?;
    let player_and_type = cursor.read_u8()?;
    let event_code = cursor.read_u8()?;

    Ok(EventHeader {
        frame: previous_frame + u64::from(frame_delta),
        frame_delta,
        player_id: player_and_type & 0x1F,
        event_type: player_and_type >> 5,
        event_code,
    })
}
