//! Camera move events (type 3, low nibble 0x1).
//!
//! # Format
//!
//! The x and y coordinates are 16-bit fixed-point values (8-bit whole part,
//! 8-bit fraction) packed across the high nibble of the event code and the
//! next four bytes:
//!
//! ```text
//! XXXXCCCC XXXXXXXX YYYYXXXX YYYYYYYY FFFFYYYY
//!   code      b0       b1       b2       b3
//! ```
//!
//! `F` is a flag nibble. Bit 0 and bit 1 each announce a zoom block (one
//! skipped byte, then a byte whose high nibble is the next flag); bit 2
//! announces a 2-byte rotation block.

use std::fmt;

use serde::Serialize;

use super::header::EventHeader;
use super::types::GameEventKind;
use crate::binary::{BitCursor, Cursor};
use crate::error::Result;

/// A decoded camera move.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraMove {
    /// Horizontal map coordinate.
    pub x: f64,
    /// Vertical map coordinate.
    pub y: f64,
    /// Every flag nibble read, in order.
    pub flags: Vec<u8>,
    /// A zoom block was present.
    pub zoom: bool,
    /// A rotation block was present.
    pub rotate: bool,
}

impl fmt::Display for CameraMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CameraMove: ({:.2}, {:.2})", self.x, self.y)?;
        if self.zoom {
            f.write_str(" zoom")?;
        }
        if self.rotate {
            f.write_str(" rotate")?;
        }
        Ok(())
    }
}

/// Converts a 16-bit fixed-point pair to a coordinate.
fn fixed_point(bytes: &[u8]) -> f64 {
    let whole = bytes.first().copied().unwrap_or(0);
    let fraction = bytes.get(1).copied().unwrap_or(0);
    f64::from(whole) + f64::from(fraction) / 256.0
}

/// Decodes a camera move payload.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the payload is incomplete.
pub fn decode_camera_move(header: &EventHeader, cursor: &mut Cursor<'_>) -> Result<GameEventKind> {
    let packed: [u8; 4] = cursor.read_array()?;

    let mut flag = packed[3] >> 4;
    let mut flags = vec![flag];
    let mut zoom = false;
    let mut rotate = false;

    if flag & 0x1 != 0 {
        cursor.skip(1)?;
        flag = cursor.read_u8()? >> 4;
        flags.push(flag);
        zoom = true;
    }
    if flag & 0x2 != 0 {
        cursor.skip(1)?;
        flag = cursor.read_u8()? >> 4;
        flags.push(flag);
        zoom = true;
    }
    if flag & 0x4 != 0 {
        cursor.skip(2)?;
        flags.push(flag);
        rotate = true;
    }

    let window = [header.event_code, packed[0], packed[1], packed[2], packed[3]];
    let mut window_cursor = Cursor::new(&window);
    let mut bits = BitCursor::new(&mut window_cursor);
    bits.read_bits(4)?;
    let x = fixed_point(&bits.read_bits(16)?);
    let y = fixed_point(&bits.read_bits(16)?);

    Ok(GameEventKind::CameraMove(CameraMove {
        x,
        y,
        flags,
        zoom,
        rotate,
    }))
}
