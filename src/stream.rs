//! Incremental decoding of the streaming sections.
//!
//! The message and game-event sections are read in chunks. A record may be
//! split across chunk boundaries, so a [`StreamDecoder`] keeps the bytes of
//! an incomplete trailing record and retries once more input arrives.
//!
//! Each call to [`StreamDecoder::feed`]:
//!
//! 1. appends the chunk to the retained tail
//! 2. decodes records through a hesitant [`Cursor`], committing after each one
//! 3. on `InsufficientData`, rolls back to the last commit and keeps only the
//!    unconsumed bytes
//!
//! Any other error aborts the stream; later calls return
//! [`ParserError::StreamAborted`]. Chunking is transparent: the concatenated
//! output of any sequence of feeds equals the output of one feed with all the
//! bytes.
//!
//! # Example
//!
//! ```
//! use sc2_replay_parser::stream::StreamDecoder;
//! use sc2_replay_parser::events::GameEventDecoder;
//!
//! // Two "start" events (type 0, code 0x05), split mid-record
//! let bytes = [0x00, 0x00, 0x05, 0x04, 0x00, 0x05];
//! let mut stream = StreamDecoder::new(GameEventDecoder::for_build(19776));
//!
//! let first = stream.feed(&bytes[..4]).unwrap();
//! assert_eq!(first.len(), 1);
//! assert_eq!(stream.pending(), 1);
//!
//! let second = stream.feed(&bytes[4..]).unwrap();
//! assert_eq!(second[0].frame(), 1);
//! stream.finish().unwrap();
//! ```

use tracing::trace;

use crate::binary::Cursor;
use crate::error::{ParserError, Result};

/// Decodes one record of a streaming section.
pub trait RecordDecoder {
    /// The decoded record type.
    type Record;

    /// Section file name, used in errors and logs.
    fn section(&self) -> &'static str;

    /// Decodes one record at the cursor.
    ///
    /// `frame` is the running frame counter of the stream. Implementations
    /// advance it only when the whole record decodes.
    ///
    /// # Errors
    ///
    /// `ParserError::InsufficientData` when the record is incomplete; any
    /// other error is fatal to the stream.
    fn decode_record(&self, cursor: &mut Cursor<'_>, frame: &mut u64) -> Result<Self::Record>;
}

/// Retained-tail driver for a [`RecordDecoder`].
#[derive(Debug)]
pub struct StreamDecoder<D> {
    decoder: D,
    pending: Vec<u8>,
    frame: u64,
    records: usize,
    aborted: bool,
}

impl<D: RecordDecoder> StreamDecoder<D> {
    /// Creates a stream at frame 0 with nothing retained.
    #[must_use]
    pub fn new(decoder: D) -> Self {
        Self {
            decoder,
            pending: Vec::new(),
            frame: 0,
            records: 0,
            aborted: false,
        }
    }

    /// Returns the record decoder.
    #[must_use]
    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Returns the number of retained bytes awaiting more input.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Returns the frame of the last decoded record.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns the number of records decoded so far.
    #[must_use]
    pub fn records(&self) -> usize {
        self.records
    }

    /// Returns `true` once a fatal error has been returned.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Appends a chunk and decodes every record it completes.
    ///
    /// # Errors
    ///
    /// - `ParserError::StreamAborted` if an earlier call failed
    /// - any fatal error from the record decoder
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<D::Record>> {
        if self.aborted {
            return Err(ParserError::StreamAborted {
                section: self.decoder.section().to_string(),
            });
        }

        self.pending.extend_from_slice(chunk);

        let mut records = Vec::new();
        let mut failure = None;
        let consumed = {
            let mut cursor = Cursor::hesitant(&self.pending);
            while !cursor.is_empty() {
                let mut frame = self.frame;
                match self.decoder.decode_record(&mut cursor, &mut frame) {
                    Ok(record) => {
                        cursor.commit();
                        self.frame = frame;
                        records.push(record);
                    }
                    Err(err) if err.is_insufficient_data() => {
                        cursor.rollback();
                        break;
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            cursor.checkpoint()
        };

        if let Some(err) = failure {
            self.aborted = true;
            self.pending.clear();
            return Err(err);
        }

        self.pending.drain(..consumed);
        self.records += records.len();

        trace!(
            section = self.decoder.section(),
            chunk = chunk.len(),
            decoded = records.len(),
            retained = self.pending.len(),
            "Decoded chunk"
        );

        Ok(records)
    }

    /// Ends the stream.
    ///
    /// # Errors
    ///
    /// - `ParserError::StreamAborted` if the stream already failed
    /// - `ParserError::LeftoverData` if bytes remain that never formed a record
    pub fn finish(self) -> Result<()> {
        if self.aborted {
            return Err(ParserError::StreamAborted {
                section: self.decoder.section().to_string(),
            });
        }
        if !self.pending.is_empty() {
            return Err(ParserError::leftover_data(
                self.decoder.section(),
                &self.pending,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records are a length byte followed by that many bytes; frame advances
    /// by one per record. A zero length byte is a fatal error.
    struct LengthPrefixed;

    impl RecordDecoder for LengthPrefixed {
        type Record = (u64, Vec<u8>);

        fn section(&self) -> &'static str {
            "test.section"
        }

        fn decode_record(&self, cursor: &mut Cursor<'_>, frame: &mut u64) -> Result<Self::Record> {
            let length = cursor.read_u8()?;
            if length == 0 {
                return Err(ParserError::InvalidAttributes {
                    reason: "zero length".to_string(),
                });
            }
            let body = cursor.read(usize::from(length))?.to_vec();
            *frame += 1;
            Ok((*frame, body))
        }
    }

    #[test]
    fn test_whole_buffer() {
        let mut stream = StreamDecoder::new(LengthPrefixed);
        let records = stream.feed(&[1, 0xAA, 2, 0xBB, 0xCC]).unwrap();
        assert_eq!(records, vec![(1, vec![0xAA]), (2, vec![0xBB, 0xCC])]);
        assert_eq!(stream.pending(), 0);
        assert_eq!(stream.records(), 2);
        stream.finish().unwrap();
    }

    #[test]
    fn test_retains_partial_record() {
        let mut stream = StreamDecoder::new(LengthPrefixed);
        let records = stream.feed(&[1, 0xAA, 3, 0xBB]).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stream.pending(), 2);
        assert_eq!(stream.frame(), 1);

        let records = stream.feed(&[0xCC, 0xDD]).unwrap();
        assert_eq!(records, vec![(2, vec![0xBB, 0xCC, 0xDD])]);
        assert_eq!(stream.pending(), 0);
    }

    #[test]
    fn test_empty_chunk() {
        let mut stream = StreamDecoder::new(LengthPrefixed);
        assert!(stream.feed(&[]).unwrap().is_empty());
        stream.finish().unwrap();
    }

    #[test]
    fn test_every_split_point_is_transparent() {
        let data = [1, 0xAA, 2, 0xBB, 0xCC, 3, 1, 2, 3, 1, 0xEE];
        let mut whole = StreamDecoder::new(LengthPrefixed);
        let expected = whole.feed(&data).unwrap();

        for split in 0..=data.len() {
            let mut stream = StreamDecoder::new(LengthPrefixed);
            let mut records = stream.feed(&data[..split]).unwrap();
            records.extend(stream.feed(&data[split..]).unwrap());
            assert_eq!(records, expected, "split at {split}");
            stream.finish().unwrap();
        }
    }

    #[test]
    fn test_fatal_error_aborts() {
        let mut stream = StreamDecoder::new(LengthPrefixed);
        let result = stream.feed(&[1, 0xAA, 0, 0xBB]);
        assert!(matches!(result, Err(ParserError::InvalidAttributes { .. })));
        assert!(stream.is_aborted());

        let again = stream.feed(&[1, 0xAA]);
        assert!(matches!(again, Err(ParserError::StreamAborted { .. })));
        assert!(matches!(
            stream.finish(),
            Err(ParserError::StreamAborted { .. })
        ));
    }

    #[test]
    fn test_finish_with_leftover() {
        let mut stream = StreamDecoder::new(LengthPrefixed);
        stream.feed(&[4, 0x01]).unwrap();
        match stream.finish() {
            Err(ParserError::LeftoverData {
                section,
                bytes,
                preview,
            }) => {
                assert_eq!(section, "test.section");
                assert_eq!(bytes, 2);
                assert_eq!(preview, "04 01");
            }
            other => panic!("Expected LeftoverData, got {other:?}"),
        }
    }
}
