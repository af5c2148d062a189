//! The Blizzerial VarInt codec.
//!
//! A VarInt is a run of 7-bit groups, least significant group first, where bit
//! 7 of every byte except the last is set. The assembled value is zig-zag
//! style signed: bit 0 is the sign and the magnitude is the value shifted
//! right by one.
//!
//! Runs of up to four bytes always fit a native integer. Longer runs are kept
//! at full precision as a [`BigInt`].
//!
//! This is not the variable-length timestamp used by the event streams; see
//! [`crate::events::read_timestamp`] for that one.

use std::fmt;

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use serde::{Serialize, Serializer};

use crate::binary::Cursor;
use crate::error::Result;

/// Number of encoded bytes that still decode to a native integer.
pub const NATIVE_VARINT_BYTES: usize = 4;

/// A decoded Blizzerial integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Integer {
    /// A value from an Int8, an Int32 or a VarInt of at most four bytes.
    Native(i64),
    /// A VarInt longer than four bytes.
    Big(BigInt),
}

impl Integer {
    /// Returns the value as an `i64` when it fits.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Integer::Native(value) => Some(*value),
            Integer::Big(value) => value.to_i64(),
        }
    }

    /// Returns the value as an arbitrary-precision integer.
    #[must_use]
    pub fn to_bigint(&self) -> BigInt {
        match self {
            Integer::Native(value) => BigInt::from(*value),
            Integer::Big(value) => value.clone(),
        }
    }

    /// Returns `true` if the value is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        match self {
            Integer::Native(value) => *value < 0,
            Integer::Big(value) => value.sign() == num_bigint::Sign::Minus,
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::Native(value)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Integer::Native(value) => write!(f, "{value}"),
            Integer::Big(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Integer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        // Values past i64 have no JSON number form that survives a round trip
        match self.to_i64() {
            Some(value) => serializer.serialize_i64(value),
            None => serializer.collect_str(self),
        }
    }
}

/// Applies the bit-0 sign rule to an unsigned wire value.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::blizzerial::sign_and_shift;
///
/// assert_eq!(sign_and_shift(0x0A), 5);
/// assert_eq!(sign_and_shift(0x0B), -5);
/// ```
#[must_use]
pub fn sign_and_shift(value: u64) -> i64 {
    // value >> 1 always fits in i64
    #[allow(clippy::cast_possible_wrap)]
    let magnitude = (value >> 1) as i64;
    if value & 1 == 1 {
        -magnitude
    } else {
        magnitude
    }
}

/// Reads one VarInt (without a tag byte) from the cursor.
///
/// VarInts are also used bare, as lengths and hash indices.
///
/// # Errors
///
/// Returns `ParserError::InsufficientData` if the run of continuation bytes
/// reaches the end of the buffer.
pub fn read_varint(cursor: &mut Cursor<'_>) -> Result<Integer> {
    let mut native: u64 = 0;
    let mut big: Option<BigInt> = None;
    let mut count = 0usize;

    loop {
        let byte = cursor.read_u8()?;
        let group = u64::from(byte & 0x7F);

        if count < NATIVE_VARINT_BYTES {
            native |= group << (7 * count);
        } else {
            let acc = big.get_or_insert_with(|| BigInt::from(native));
            *acc += BigInt::from(group) << (7 * count);
        }
        count += 1;

        if byte < 0x80 {
            break;
        }
    }

    Ok(match big {
        None => Integer::Native(sign_and_shift(native)),
        Some(value) => {
            let negative = value.bit(0);
            let magnitude: BigInt = value >> 1u32;
            Integer::Big(if negative { -magnitude } else { magnitude })
        }
    })
}

/// Encodes an integer as a VarInt.
///
/// Zero is always encoded as positive, so a negative zero cannot be written.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::Cursor;
/// use sc2_replay_parser::blizzerial::{encode_varint, read_varint};
///
/// let bytes = encode_varint(&(-10649).into());
/// let mut cursor = Cursor::new(&bytes);
/// assert_eq!(read_varint(&mut cursor).unwrap().to_i64(), Some(-10649));
/// ```
#[must_use]
pub fn encode_varint(value: &BigInt) -> Vec<u8> {
    let negative = value.sign() == num_bigint::Sign::Minus;
    let mut wire: BigInt = value.magnitude().clone().into();
    wire <<= 1u32;
    if negative {
        wire += 1;
    }

    let mask = BigInt::from(0x7Fu8);
    let mut out = Vec::new();
    loop {
        let group = (&wire & &mask).to_u8().unwrap_or(0);
        wire >>= 7u32;
        if wire.is_zero() {
            out.push(group);
            return out;
        }
        out.push(group | 0x80);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Integer {
        let mut cursor = Cursor::new(bytes);
        read_varint(&mut cursor).unwrap()
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(decode(&[0x02]), Integer::Native(1));
        assert_eq!(decode(&[0x03]), Integer::Native(-1));
        assert_eq!(decode(&[0x00]), Integer::Native(0));
    }

    #[test]
    fn test_low_bits_of_each_group() {
        let value = decode(&[0x82, 0x07]).to_i64().unwrap();
        assert_eq!(value & 0x3F, (0x82 >> 1) & 0x3F);
        assert_eq!(value & (0x7F << 6), 0x7 << 6);
    }

    #[test]
    fn test_four_bytes_stay_native() {
        assert!(matches!(decode(&[0x81, 0x81, 0x81, 0x07]), Integer::Native(_)));
    }

    #[test]
    fn test_more_than_four_bytes_promote() {
        let value = decode(&[0x81, 0x81, 0x81, 0x81, 0x01]);
        assert!(matches!(value, Integer::Big(_)));
        assert!(value.is_negative());
    }

    #[test]
    fn test_big_sign_from_bit_zero() {
        let mut bytes = [0x82, 0x82, 0x82, 0x82, 0x82, 0x82, 0x82, 0x82, 0x01];
        assert!(!decode(&bytes).is_negative());
        bytes[0] = 0x83;
        assert!(decode(&bytes).is_negative());
    }

    #[test]
    fn test_unterminated_is_insufficient_data() {
        let mut cursor = Cursor::new(&[0x81, 0x81, 0x81]);
        assert!(read_varint(&mut cursor).unwrap_err().is_insufficient_data());
    }

    #[test]
    fn test_datetime_ticks() {
        let ticks = BigInt::from(129_627_762_525_904_000_i64);
        let bytes = encode_varint(&ticks);
        assert!(bytes.len() > NATIVE_VARINT_BYTES);
        assert_eq!(decode(&bytes).to_i64(), Some(129_627_762_525_904_000));
    }

    #[test]
    fn test_encode_small() {
        assert_eq!(encode_varint(&BigInt::from(5)), vec![0x0A]);
        assert_eq!(encode_varint(&BigInt::from(-5)), vec![0x0B]);
        assert_eq!(encode_varint(&BigInt::from(64)), vec![0x80, 0x01]);
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&Integer::Native(-3)).unwrap(), "-3");
        let huge = Integer::Big(BigInt::from(u64::MAX) * 4);
        assert_eq!(
            serde_json::to_string(&huge).unwrap(),
            format!("\"{}\"", BigInt::from(u64::MAX) * 4)
        );
    }
}
