//! Error types for the SC2 replay decoder.
//!
//! One enum covers every failure the decoders and the pipeline can report.
//! [`ParserError::InsufficientData`] is special: the streaming decoders use it
//! as the "need another chunk" signal and never surface it to callers. Every
//! other variant is fatal to the section (or stream) that produced it.

use thiserror::Error;

/// The main error type for replay decoding operations.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::error::{ParserError, Result};
///
/// fn example_operation() -> Result<()> {
///     Err(ParserError::MissingField {
///         section: "header".to_string(),
///         field: "version".to_string(),
///     })
/// }
/// assert!(example_operation().is_err());
/// ```
#[derive(Error, Debug)]
pub enum ParserError {
    /// An I/O error occurred while reading a section file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A read would run past the end of the available bytes.
    ///
    /// Streaming decoders treat this as "wait for the next chunk"; one-shot
    /// decoders surface it as a truncated section.
    #[error("Not enough data: requested {requested} bytes, but only {available} available")]
    InsufficientData {
        /// The number of bytes the read needed.
        requested: usize,
        /// The number of unread bytes left in the buffer.
        available: usize,
    },

    /// A Blizzerial tag byte did not match the schema node being decoded.
    #[error("Type mismatch reading {field}: expected tag {expected}, found {found}")]
    TypeMismatch {
        /// Schema name of the field being decoded.
        field: String,
        /// Tag byte the schema expects.
        expected: u8,
        /// Tag byte found on the wire.
        found: u8,
    },

    /// A length or element count was negative or larger than the data.
    #[error("Malformed length for {field}: {length}")]
    MalformedLength {
        /// Schema name of the field being decoded.
        field: String,
        /// The offending value, rendered as text (it may be arbitrary precision).
        length: String,
    },

    /// A hash entry carried a field index the schema does not declare.
    #[error("Field index {index} of {field} is not in the schema")]
    IndexNotInSchema {
        /// Schema name of the hash being decoded.
        field: String,
        /// The index found on the wire.
        index: String,
    },

    /// A decoded record lacks a field the section needs.
    #[error("Missing field {field} in {section}")]
    MissingField {
        /// Section being interpreted.
        section: String,
        /// Dotted path of the missing field.
        field: String,
    },

    /// The attributes section is malformed.
    #[error("Invalid attributes file: {reason}")]
    InvalidAttributes {
        /// A description of what is wrong.
        reason: String,
    },

    /// No handler is registered for an event type/code pair.
    #[error("Unrecognized opcode: event type {event_type}, code 0x{event_code:02X}")]
    UnrecognizedOpcode {
        /// The 3-bit event type.
        event_type: u8,
        /// The event code byte.
        event_code: u8,
    },

    /// A cursor move would leave the committed region or the buffer.
    #[error("Invalid seek to {target} (checkpoint {checkpoint}, length {length})")]
    InvalidSeek {
        /// Requested position.
        target: usize,
        /// Current checkpoint of the cursor.
        checkpoint: usize,
        /// Length of the underlying buffer.
        length: usize,
    },

    /// A stream decoder was fed after it already failed.
    #[error("The {section} stream was aborted by an earlier error")]
    StreamAborted {
        /// Section name.
        section: String,
    },

    /// A streaming section ended in the middle of a record.
    #[error("Leftover data in {section}: {bytes} bytes ({preview})")]
    LeftoverData {
        /// Section name.
        section: String,
        /// Number of bytes that never formed a complete record.
        bytes: usize,
        /// Hex preview of the leftover bytes.
        preview: String,
    },

    /// The external archive extraction step failed.
    #[error("Archive extraction failed: {reason}")]
    ExtractionFailed {
        /// A description of the failure.
        reason: String,
    },

    /// A section file could not be opened or read.
    #[error("Section {section} unreadable: {reason}")]
    SectionUnreadable {
        /// Section file name.
        section: String,
        /// The underlying cause.
        reason: String,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// A description of the problem.
        reason: String,
    },
}

impl ParserError {
    /// Creates an `InsufficientData` error.
    #[must_use]
    pub fn insufficient_data(requested: usize, available: usize) -> Self {
        ParserError::InsufficientData {
            requested,
            available,
        }
    }

    /// Creates a `LeftoverData` error with a hex preview of the bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use sc2_replay_parser::error::ParserError;
    ///
    /// let err = ParserError::leftover_data("replay.game.events", &[0x04, 0x21]);
    /// assert!(err.to_string().contains("04 21"));
    /// ```
    #[must_use]
    pub fn leftover_data(section: &str, bytes: &[u8]) -> Self {
        ParserError::LeftoverData {
            section: section.to_string(),
            bytes: bytes.len(),
            preview: bytes_to_hex(bytes),
        }
    }

    /// Creates a `SectionUnreadable` error from any displayable cause.
    #[must_use]
    pub fn section_unreadable(section: &str, reason: impl std::fmt::Display) -> Self {
        ParserError::SectionUnreadable {
            section: section.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the recoverable "need more input" signal.
    #[must_use]
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, ParserError::InsufficientData { .. })
    }
}

/// Converts a byte slice to a hexadecimal string representation.
///
/// If the slice is 8 bytes or less, formats as space-separated hex values.
/// If longer, shows the first 8 bytes followed by "...".
fn bytes_to_hex(bytes: &[u8]) -> String {
    if bytes.len() <= 8 {
        bytes
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        let prefix: String = bytes[..8]
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{prefix}... ({} bytes total)", bytes.len())
    }
}

/// A specialized Result type for replay decoding operations.
pub type Result<T> = std::result::Result<T, ParserError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_error_display() {
        let err = ParserError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        assert!(err.to_string().contains("I/O error"));

        let err = ParserError::insufficient_data(4, 1);
        assert!(err.to_string().contains("requested 4 bytes"));
        assert!(err.to_string().contains("only 1 available"));

        let err = ParserError::TypeMismatch {
            field: "gameLength".to_string(),
            expected: 9,
            found: 2,
        };
        assert!(err.to_string().contains("gameLength"));
        assert!(err.to_string().contains("expected tag 9"));

        let err = ParserError::UnrecognizedOpcode {
            event_type: 6,
            event_code: 0x1F,
        };
        assert!(err.to_string().contains("0x1F"));
    }

    #[test]
    fn test_is_insufficient_data() {
        assert!(ParserError::insufficient_data(1, 0).is_insufficient_data());
        assert!(!ParserError::ExtractionFailed {
            reason: "exit status 1".to_string()
        }
        .is_insufficient_data());
    }

    #[test]
    fn test_bytes_to_hex_short() {
        assert_eq!(bytes_to_hex(&[0xE7, 0x03, 0x00, 0x00]), "E7 03 00 00");
    }

    #[test]
    fn test_bytes_to_hex_long() {
        let result = bytes_to_hex(b"s2ma\0\0USabcdef");
        assert!(result.contains("..."));
        assert!(result.contains("14 bytes total"));
    }

    #[test]
    fn test_leftover_data_helper() {
        match ParserError::leftover_data("replay.message.events", &[0x08, 0x01]) {
            ParserError::LeftoverData {
                section,
                bytes,
                preview,
            } => {
                assert_eq!(section, "replay.message.events");
                assert_eq!(bytes, 2);
                assert_eq!(preview, "08 01");
            }
            _ => panic!("Expected LeftoverData variant"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        // Stage errors cross the parallel join boundary
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParserError>();
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "test error");
        let parser_err: ParserError = io_err.into();
        assert!(matches!(parser_err, ParserError::IoError(_)));
    }
}
