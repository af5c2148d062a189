//! Control group events (type 1, low nibble 0xD, high nibble <= 0x9).
//!
//! # Format
//!
//! The group number is the high nibble of the event code. The payload is
//! bit-packed:
//!
//! ```text
//! [action: 2 bits] [has mask: 1 bit] ([mask length: 8 bits] [mask bits])
//! ```

use std::fmt;

use serde::Serialize;

use super::header::EventHeader;
use super::types::GameEventKind;
use crate::binary::{BitCursor, Cursor};
use crate::error::Result;

/// Control group operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HotkeyAction {
    /// Assign the current selection to the group (Ctrl+N).
    Set,
    /// Add the current selection to the group (Shift+N).
    Add,
    /// Select the group (N).
    Get,
}

impl HotkeyAction {
    /// Maps the 2-bit wire value; 3 has no known meaning.
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(HotkeyAction::Set),
            1 => Some(HotkeyAction::Add),
            2 => Some(HotkeyAction::Get),
            _ => None,
        }
    }
}

/// A decoded control group event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hotkey {
    /// Control group number (0-9).
    pub group: u8,
    /// Operation on the group.
    pub action: HotkeyAction,
    /// Removal mask over the group, when present.
    pub mask: Option<Vec<u8>>,
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hotkey: {:?} group {}", self.action, self.group)
    }
}

/// Decodes a control group payload.
///
/// An action value of 3 decodes to [`GameEventKind::Unknown`] carrying the
/// mask bits, if any.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_hotkey(header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    let mut bits = BitCursor::new(cursor);
    let action = bits.read_u8(2)?;
    let has_mask = bits.read_u8(1)? != 0;

    let mask = if has_mask {
        let length = bits.read_u8(8)?;
        Some(bits.read_bits(usize::from(length))?)
    } else {
        None
    };

    Ok(match HotkeyAction::from_bits(action) {
        Some(action) => GameEventKind::Hotkey(Hotkey {
            group: header.code_hi(),
            action,
            mask,
        }),
        None => GameEventKind::Unknown {
            data: mask.unwrap_or_default(),
        },
    })
}
