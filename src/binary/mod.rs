//! Binary reading utilities for replay sections.
//!
//! - [`Cursor`] is a bounded, position-tracked reader over an in-memory byte
//!   slice. Opened in hesitant (transactional) mode it supports
//!   [`Cursor::commit`] and [`Cursor::rollback`], which the streaming decoders
//!   use to keep a partially received record for the next chunk.
//! - [`BitCursor`] layers bit-granularity reads on top of a `Cursor` for the
//!   bit-packed game-event payloads.
//!
//! Reading past the end never panics: it returns
//! [`ParserError::InsufficientData`](crate::error::ParserError::InsufficientData).
//!
//! # Example
//!
//! ```
//! use sc2_replay_parser::binary::{BitCursor, Cursor};
//!
//! let data = [0xF0, 0x0F, 0xFF];
//! let mut cursor = Cursor::new(&data);
//! let mut bits = BitCursor::new(&mut cursor);
//!
//! assert_eq!(bits.read_bits(4).unwrap(), vec![0x0]);
//! assert_eq!(bits.read_bits(4).unwrap(), vec![0xF]);
//! ```

mod bits;
mod cursor;

pub use bits::BitCursor;
pub use cursor::Cursor;

use crate::error::{ParserError, Result};

/// Reads a little-endian u32 value from the byte buffer at the given offset.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the buffer doesn't contain
/// at least 4 bytes starting from the given offset.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::read_u32_le;
///
/// let data = [0xE7, 0x03, 0x00, 0x00];
/// assert_eq!(read_u32_le(&data, 0).unwrap(), 999);
/// ```
pub fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32> {
    const SIZE: usize = 4;

    let end = offset.saturating_add(SIZE);
    if end > bytes.len() {
        return Err(ParserError::insufficient_data(
            SIZE,
            bytes.len().saturating_sub(offset),
        ));
    }

    let slice = &bytes[offset..end];
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

/// Reads a big-endian 24-bit value.
#[must_use]
pub fn be24(bytes: &[u8; 3]) -> u32 {
    let [high, mid, low] = *bytes;
    u32::from_be_bytes([0, high, mid, low])
}
