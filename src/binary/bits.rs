//! Bit-granularity reads over a [`Cursor`].

use super::Cursor;
use crate::error::Result;

/// Masks selecting the low `n` bits of a byte.
const LO_MASK: [u8; 9] = [0x00, 0x01, 0x03, 0x07, 0x0F, 0x1F, 0x3F, 0x7F, 0xFF];

/// Reads runs of bits that do not fall on byte boundaries.
///
/// Bits are taken from each byte starting at the least significant end. A run
/// that straddles bytes is returned as `ceil(n / 8)` byte-sized values: the
/// high remainder of the partially consumed byte is combined with the next
/// byte read, so multi-byte runs come back in wire order with any leftover
/// bits in the final value.
///
/// The bit cursor borrows the byte cursor mutably for its lifetime. Dropping
/// it mid-byte discards the unread bits of that byte, which is how the event
/// payloads pad to the next byte boundary.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::{BitCursor, Cursor};
///
/// let data = [0xF0, 0x0F, 0xFF];
/// let mut cursor = Cursor::new(&data);
/// let mut bits = BitCursor::new(&mut cursor);
///
/// bits.read_bits(4).unwrap();
/// assert_eq!(bits.read_bits(16).unwrap(), vec![0xF0, 0xFF]);
/// ```
#[derive(Debug)]
pub struct BitCursor<'c, 'a> {
    cursor: &'c mut Cursor<'a>,
    /// Bits of `current` already consumed, in `0..8`.
    shift: u8,
    current: u8,
}

impl<'c, 'a> BitCursor<'c, 'a> {
    /// Creates a byte-aligned bit cursor at the cursor's current position.
    pub fn new(cursor: &'c mut Cursor<'a>) -> Self {
        Self {
            cursor,
            shift: 0,
            current: 0,
        }
    }

    /// Returns the number of bits already consumed from the current byte.
    #[must_use]
    pub fn shift(&self) -> u8 {
        self.shift
    }

    /// Returns `true` when no partially consumed byte is pending.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        self.shift == 0
    }

    /// Takes `count` bits from the current byte. `shift + count` must be <= 8.
    fn take(&mut self, count: usize) -> Result<u8> {
        debug_assert!(usize::from(self.shift) + count <= 8);
        if self.shift == 0 {
            self.current = self.cursor.read_u8()?;
        }
        let value = (self.current >> self.shift) & LO_MASK[count];
        self.shift = ((usize::from(self.shift) + count) % 8) as u8;
        Ok(value)
    }

    /// Reads `count` bits, returning `ceil(count / 8)` values.
    ///
    /// A zero-length read returns an empty vector and consumes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if the underlying cursor runs out.
    pub fn read_bits(&mut self, count: usize) -> Result<Vec<u8>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let shift = usize::from(self.shift);
        if shift + count <= 8 {
            return Ok(vec![self.take(count)?]);
        }

        if shift == 0 {
            // Aligned: whole bytes come straight from the cursor
            let mut out = self.cursor.read(count / 8)?.to_vec();
            let tail = count % 8;
            if tail > 0 {
                out.push(self.take(tail)?);
            }
            return Ok(out);
        }

        let right_bits = shift;
        let left_bits = 8 - right_bits;
        let mut remaining = count - left_bits;
        let mut out = Vec::with_capacity(count.div_ceil(8));

        // Unread high bits of the current byte, parked above the next byte
        let mut buffer = u32::from(self.current & !LO_MASK[right_bits]) << left_bits;

        if remaining >= 8 {
            let left_mask = u32::from(LO_MASK[left_bits]);
            while remaining >= 8 {
                self.current = self.cursor.read_u8()?;
                buffer |= u32::from(self.current);
                out.push((buffer >> left_bits) as u8);
                buffer = (buffer & left_mask) << 8;
                remaining -= 8;
            }
            if remaining == 0 {
                return Ok(out);
            }
        }

        let end_bits = remaining.min(right_bits);
        buffer >>= 8 - end_bits;
        self.current = self.cursor.read_u8()?;
        buffer |= u32::from(self.current & LO_MASK[end_bits]);
        out.push(buffer as u8);
        remaining -= end_bits;
        self.shift = end_bits as u8;

        if remaining > 0 {
            out.push(self.take(remaining)?);
        }

        Ok(out)
    }

    /// Reads `count` whole bytes worth of bits.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if the underlying cursor runs out.
    pub fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>> {
        self.read_bits(count * 8)
    }

    /// Reads up to 8 bits as a single value.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if the underlying cursor runs out.
    pub fn read_u8(&mut self, count: usize) -> Result<u8> {
        debug_assert!(count <= 8);
        Ok(self.read_bits(count)?.first().copied().unwrap_or(0))
    }

    /// Returns the unread remainder of the current byte and realigns.
    ///
    /// Returns `None` when already aligned.
    pub fn read_to_boundary(&mut self) -> Option<u8> {
        if self.shift == 0 {
            return None;
        }
        let value = (self.current & !LO_MASK[usize::from(self.shift)]) >> self.shift;
        self.shift = 0;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_bits<R>(data: &[u8], f: impl FnOnce(&mut BitCursor<'_, '_>) -> R) -> R {
        let mut cursor = Cursor::new(data);
        let mut bits = BitCursor::new(&mut cursor);
        f(&mut bits)
    }

    #[test]
    fn test_read_nibbles() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            assert_eq!(bits.read_bits(4).unwrap(), vec![0]);
            assert_eq!(bits.read_bits(4).unwrap(), vec![15]);
            assert!(bits.is_aligned());
        });
    }

    #[test]
    fn test_read_whole_bytes_aligned() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            assert_eq!(bits.read_bits(24).unwrap(), vec![0xF0, 0x0F, 0xFF]);
        });
    }

    #[test]
    fn test_read_bytes_then_partial_aligned() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            assert_eq!(bits.read_bits(20).unwrap(), vec![0xF0, 0x0F, 0xF]);
            assert_eq!(bits.shift(), 4);
        });
    }

    #[test]
    fn test_read_multiple_bytes_shifted() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            bits.read_bits(4).unwrap();
            assert_eq!(bits.read_bits(16).unwrap(), vec![0xF0, 0xFF]);
        });
    }

    #[test]
    fn test_read_byte_and_partial_over_boundary_shifted() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            bits.read_bits(4).unwrap();
            assert_eq!(bits.read_bits(13).unwrap(), vec![0xF0, 0x1F]);
            assert_eq!(bits.shift(), 1);
        });
    }

    #[test]
    fn test_read_byte_and_partial_within_boundary_shifted() {
        with_bits(&[0xF0, 0xFA, 0xFA], |bits| {
            bits.read_bits(4).unwrap();
            assert_eq!(bits.read_bits(11).unwrap(), vec![0xFA, 0x7]);
        });
        with_bits(&[0xF0, 0xFA, 0xFA], |bits| {
            bits.read_bits(4).unwrap();
            assert_eq!(bits.read_bits(19).unwrap(), vec![0xFF, 0xAA, 0x7]);
        });
    }

    #[test]
    fn test_read_more_than_four_bytes_shifted() {
        let data = [0x74, 0x65, 0x63, 0x32, 0x37, 0x21];
        with_bits(&data, |bits| {
            bits.read_bits(4).unwrap();
            assert_eq!(
                bits.read_bits(40).unwrap(),
                vec![0x76, 0x56, 0x33, 0x23, 0x71]
            );
        });
        with_bits(&data, |bits| {
            bits.read_bits(3).unwrap();
            assert_eq!(
                bits.read_bits(40).unwrap(),
                vec![0x73, 0x2B, 0x19, 0x91, 0xB9]
            );
        });
    }

    #[test]
    fn test_read_few_bits_across_bytes() {
        with_bits(&[0xF0, 0xFA, 0x8E], |bits| {
            bits.read_bits(14).unwrap();
            assert_eq!(bits.read_bits(3).unwrap(), vec![0x6]);
        });
    }

    #[test]
    fn test_read_from_shifted_to_aligned() {
        with_bits(&[0xF0, 0xFA, 0x8E], |bits| {
            bits.read_bits(2).unwrap();
            assert_eq!(bits.read_bits(14).unwrap(), vec![0xF3, 0x3A]);
        });
    }

    #[test]
    fn test_read_zero_bits() {
        with_bits(&[0xF0], |bits| {
            assert!(bits.read_bits(0).unwrap().is_empty());
            assert!(bits.is_aligned());
        });
    }

    #[test]
    fn test_read_past_end() {
        with_bits(&[0xF0], |bits| {
            bits.read_bits(4).unwrap();
            assert!(bits.read_bits(8).unwrap_err().is_insufficient_data());
        });
    }

    #[test]
    fn test_read_to_boundary() {
        with_bits(&[0xF0, 0x0F, 0xFF], |bits| {
            assert_eq!(bits.read_to_boundary(), None);
            bits.read_bits(4).unwrap();
            assert_eq!(bits.read_to_boundary(), Some(0xF));
            assert_eq!(bits.read_to_boundary(), None);
            assert_eq!(bits.read_bits(8).unwrap(), vec![0x0F]);
        });
    }

    #[test]
    fn test_never_consumes_more_than_needed() {
        let data = [0xAB, 0xCD, 0xEF];
        let mut cursor = Cursor::new(&data);
        {
            let mut bits = BitCursor::new(&mut cursor);
            bits.read_bits(9).unwrap();
        }
        assert_eq!(cursor.position(), 2);
    }
}
