//! Resource transfer and request events.
//!
//! Both payloads carry four 4-byte resource slots: minerals, gas, and two
//! slots that are always skipped. The slot encodings differ:
//!
//! | Event | Slot value |
//! |-------|------------|
//! | Transfer | `be24(b0..b2) * (b3 >> 4) + (b3 & 0x0F)` |
//! | Request | `(b0 << 23) \| (b1 << 15) \| (b2 << 7) \| (b3 & 0x7F)` |

use super::header::EventHeader;
use super::types::GameEventKind;
use crate::binary::{be24, Cursor};
use crate::error::Result;

/// Number of 4-byte resource slots in a payload.
pub const RESOURCE_SLOTS: usize = 4;

/// Decodes a transfer slot: a 24-bit base, a multiplier nibble and an
/// additive nibble.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::events::transfer_amount;
///
/// assert_eq!(transfer_amount([0x01, 0x00, 0x00, 0x23]), 65536 * 2 + 3);
/// ```
#[must_use]
pub fn transfer_amount(slot: [u8; 4]) -> u32 {
    let [b0, b1, b2, _] = slot;
    let base = be24(&[b0, b1, b2]);
    let multiplier = u32::from(slot[3] >> 4);
    let extra = u32::from(slot[3] & 0x0F);
    base.wrapping_mul(multiplier).wrapping_add(extra)
}

/// Decodes a request slot.
#[must_use]
pub fn request_amount(slot: [u8; 4]) -> u32 {
    (u32::from(slot[0]) << 23)
        | (u32::from(slot[1]) << 15)
        | (u32::from(slot[2]) << 7)
        | u32::from(slot[3] & 0x7F)
}

fn read_slots(cursor: &mut Cursor<'_>) -> Result<[[u8; 4]; RESOURCE_SLOTS]> {
    let mut slots = [[0u8; 4]; RESOURCE_SLOTS];
    for slot in &mut slots {
        *slot = cursor.read_array()?;
    }
    Ok(slots)
}

/// Decodes a resource transfer (type 1, low nibble 0xF). The receiving
/// player is the high nibble of the event code.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_resource_transfer(
    header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    cursor.skip(1)?;
    let slots = read_slots(cursor)?;
    Ok(GameEventKind::ResourceTransfer {
        target_player: header.code_hi(),
        minerals: transfer_amount(slots[0]),
        gas: transfer_amount(slots[1]),
    })
}

/// Decodes a resource request (type 4, code 0xC6).
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_resource_request(
    _header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    let slots = read_slots(cursor)?;
    Ok(GameEventKind::ResourceRequest {
        minerals: request_amount(slots[0]),
        gas: request_amount(slots[1]),
    })
}

/// Decodes a resource request cancellation (type 4, low nibble 0x8).
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_cancel_resource_request(
    _header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    Ok(GameEventKind::CancelResourceRequest {
        data: cursor.read_array()?,
    })
}
