//! Handlers for opcodes with fixed or trivial payloads.

use super::header::EventHeader;
use super::types::{GameEventKind, SpeedDirection};
use crate::binary::Cursor;
use crate::error::Result;

/// Player joined; no payload.
pub fn decode_join(_header: &EventHeader, _cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    Ok(GameEventKind::Join)
}

/// Game started; no payload.
pub fn decode_start(_header: &EventHeader, _cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    Ok(GameEventKind::Start)
}

/// Player left; no payload.
pub fn decode_leave(_header: &EventHeader, _cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    Ok(GameEventKind::Leave)
}

/// Alliance change: 8 undecoded bytes.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_alliance_change(
    _header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    Ok(GameEventKind::AllianceChange {
        data: cursor.read_array()?,
    })
}

/// Game speed change: one undecoded byte. Code 0x83 raises the speed, any
/// other registered code lowers it.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_speed_change(header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    let direction = if header.event_code == 0x83 {
        SpeedDirection::Increase
    } else {
        SpeedDirection::Decrease
    };
    Ok(GameEventKind::SpeedChange {
        direction,
        data: cursor.read_u8()?,
    })
}

/// Ability use.
///
/// # Format
///
/// ```text
/// [4 bytes skipped] [ability code: 3 bytes, big-endian] [switch: 1]
/// [1 byte if switch is 0x30 or 0x50] [24 bytes skipped]
/// ```
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_ability(_header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    cursor.skip(4)?;
    let ability_code = crate::binary::be24(&cursor.read_array::<3>()?);
    let switch = cursor.read_u8()?;
    if switch == 0x30 || switch == 0x50 {
        cursor.skip(1)?;
    }
    cursor.skip(24)?;
    Ok(GameEventKind::Ability { ability_code })
}

/// Camera opcode 0x08: a big-endian u16 whose low nibble, times 8, gives the
/// number of bytes that follow.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_camera_unknown_08(
    _header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    let prefix: [u8; 2] = cursor.read_array()?;
    let length = usize::from(u16::from_be_bytes(prefix) & 0x0F) << 3;
    let mut data = prefix.to_vec();
    data.extend_from_slice(cursor.read(length)?);
    Ok(GameEventKind::Unknown { data })
}
