//! Selection events (type 1, low nibble 0xC, high nibble <= 0xA).
//!
//! A selection payload is bit-packed after one leading byte. Older builds
//! start with a byte-sized deselect bitmap length; from build 16561 a 2-bit
//! modify mode replaces it. Both continue with the same unit type and unit id
//! lists and pad to the next byte boundary.

use std::fmt;

use serde::Serialize;

use super::header::EventHeader;
use super::types::GameEventKind;
use crate::binary::{BitCursor, Cursor};
use crate::error::Result;

/// Code of the only player-initiated selection; all others are automatic.
pub const MANUAL_SELECTION_CODE: u8 = 0xAC;

/// How a selection modifies the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SelectionModifier {
    /// Nothing is removed.
    None,
    /// Units to keep, as a bitmap over the previous selection.
    Bitmask(Vec<u8>),
    /// Indices into the previous selection to remove.
    DeselectIndices(Vec<u8>),
    /// Indices into the previous selection to keep.
    ReplaceIndices(Vec<u8>),
}

/// Count of selected units of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitTypeCount {
    /// Unit type id.
    pub unit_type: u16,
    /// Undecoded status byte (possibly hallucination state).
    pub status: u8,
    /// Number of units of this type.
    pub count: u8,
}

/// A decoded selection change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    /// The game made this selection rather than the player.
    pub automatic: bool,
    /// Change applied to the previous selection.
    pub modifier: SelectionModifier,
    /// Unit types added.
    pub unit_types: Vec<UnitTypeCount>,
    /// Unit ids added.
    pub unit_ids: Vec<u32>,
}

impl Selection {
    /// Returns the total number of units added.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.unit_types.iter().map(|t| usize::from(t.count)).sum()
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selection: {} unit(s) of {} type(s){}",
            self.unit_count(),
            self.unit_types.len(),
            if self.automatic { " (auto)" } else { "" }
        )
    }
}

/// Reads the unit type and unit id lists shared by every selection layout.
fn read_units(bits: &mut BitCursor<'_, '_>) -> Result<(Vec<UnitTypeCount>, Vec<u32>)> {
    let type_count = bits.read_u8(8)?;
    let mut unit_types = Vec::with_capacity(usize::from(type_count));
    for _ in 0..type_count {
        let id = bits.read_bits(16)?;
        let status = bits.read_u8(8)?;
        let count = bits.read_u8(8)?;
        unit_types.push(UnitTypeCount {
            unit_type: (u16::from(id[0]) << 8) | u16::from(id[1]),
            status,
            count,
        });
    }

    let id_count = bits.read_u8(8)?;
    let mut unit_ids = Vec::with_capacity(usize::from(id_count));
    for _ in 0..id_count {
        let b = bits.read_bits(32)?;
        unit_ids.push(
            (u32::from(b[0]) << 8)
                | u32::from(b[1])
                | (u32::from(b[2]) << 24)
                | (u32::from(b[3]) << 16),
        );
    }

    Ok((unit_types, unit_ids))
}

/// Decodes the selection layout with a leading deselect bitmap.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_selection(header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    cursor.skip(1)?;
    let deselect_bits = cursor.read_u8()?;

    let mut bits = BitCursor::new(cursor);
    let modifier = if deselect_bits > 0 {
        SelectionModifier::Bitmask(bits.read_bits(usize::from(deselect_bits))?)
    } else {
        SelectionModifier::None
    };
    let (unit_types, unit_ids) = read_units(&mut bits)?;
    bits.read_to_boundary();

    Ok(GameEventKind::Selection(Selection {
        automatic: header.event_code != MANUAL_SELECTION_CODE,
        modifier,
        unit_types,
        unit_ids,
    }))
}

/// Decodes the selection layout with a 2-bit modify mode.
///
/// | Mode | Payload |
/// |------|---------|
/// | 0 | none |
/// | 1 | 8-bit length, then that many bitmap bits |
/// | 2 | 8-bit count, then that many 8-bit indices to deselect |
/// | 3 | 8-bit count, then that many 8-bit indices to keep |
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_selection_with_mode(
    header: &EventHeader,
    cursor: &mut Cursor<'_>,
) -> Result<GameEventKind> {
    cursor.skip(1)?;

    let mut bits = BitCursor::new(cursor);
    let modifier = match bits.read_u8(2)? {
        1 => {
            let length = bits.read_u8(8)?;
            SelectionModifier::Bitmask(bits.read_bits(usize::from(length))?)
        }
        mode @ (2 | 3) => {
            let count = bits.read_u8(8)?;
            let indices = (0..count)
                .map(|_| bits.read_u8(8))
                .collect::<Result<Vec<_>>>()?;
            if mode == 2 {
                SelectionModifier::DeselectIndices(indices)
            } else {
                SelectionModifier::ReplaceIndices(indices)
            }
        }
        _ => SelectionModifier::None,
    };
    let (unit_types, unit_ids) = read_units(&mut bits)?;
    bits.read_to_boundary();

    Ok(GameEventKind::Selection(Selection {
        automatic: header.event_code != MANUAL_SELECTION_CODE,
        modifier,
        unit_types,
        unit_ids,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(code: u8) -> EventHeader {
        EventHeader {
            frame: 0,
            frame_delta: 0,
            player_id: 1,
            event_type: 1,
            event_code: code,
        }
    }

    fn selection(kind: GameEventKind) -> Selection {
        match kind {
            GameEventKind::Selection(selection) => selection,
            other => panic!("Expected Selection, got {other:?}"),
        }
    }

    #[test]
    fn test_aligned_selection() {
        let data = [
            0x00, // leading byte
            0x00, // no deselect bits
            0x01, // one unit type
            0x00, 0x2F, 0x01, 0x02, // type 0x002F, status 1, count 2
            0x02, // two unit ids
            0x12, 0x34, 0x56, 0x78, //
            0x00, 0x01, 0x00, 0x02,
        ];
        let mut cursor = Cursor::new(&data);
        let sel = selection(decode_selection(&header(0xAC), &mut cursor).unwrap());

        assert!(!sel.automatic);
        assert_eq!(sel.modifier, SelectionModifier::None);
        assert_eq!(
            sel.unit_types,
            vec![UnitTypeCount {
                unit_type: 0x002F,
                status: 1,
                count: 2
            }]
        );
        assert_eq!(sel.unit_ids, vec![0x5678_1234, 0x0002_0001]);
        assert_eq!(sel.unit_count(), 2);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_deselect_bits_shift_the_payload() {
        // 4 deselect bits, then empty type and id lists straddling bytes
        let data = [0x00, 0x04, 0x05, 0x00, 0x00];
        let mut cursor = Cursor::new(&data);
        let sel = selection(decode_selection(&header(0x1C), &mut cursor).unwrap());

        assert!(sel.automatic);
        assert_eq!(sel.modifier, SelectionModifier::Bitmask(vec![0x5]));
        assert!(sel.unit_types.is_empty());
        assert!(sel.unit_ids.is_empty());
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_truncated_selection() {
        let data = [0x00, 0x00, 0x01, 0x00, 0x2F];
        let mut cursor = Cursor::new(&data);
        let result = decode_selection(&header(0xAC), &mut cursor);
        assert!(result.unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_mode_none() {
        // mode 0 in the low 2 bits, then zero types and zero ids, then padding
        let data = [0x00, 0x00, 0x00, 0x00];
        let mut cursor = Cursor::new(&data);
        let sel = selection(decode_selection_with_mode(&header(0xAC), &mut cursor).unwrap());
        assert_eq!(sel.modifier, SelectionModifier::None);
        assert!(sel.unit_types.is_empty());
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_mode_deselect_indices() {
        // mode 2, count 1, index 5, zero types, zero ids; every byte-sized
        // field after the mode takes its high 6 bits from the current byte
        // and its low 2 bits from the next
        let data = [0x00, 0x02, 0x05, 0x01, 0x00, 0x00];
        let mut cursor = Cursor::new(&data);
        let sel = selection(decode_selection_with_mode(&header(0x2C), &mut cursor).unwrap());
        assert_eq!(sel.modifier, SelectionModifier::DeselectIndices(vec![5]));
        assert!(sel.automatic);
        assert!(cursor.is_empty());
    }
}
