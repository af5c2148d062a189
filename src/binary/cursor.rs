//! Bounded, position-tracked reader with commit/rollback.

use crate::error::{ParserError, Result};

/// A reader over an in-memory byte slice.
///
/// The cursor keeps a read position and a checkpoint, with
/// `0 <= checkpoint <= position <= len` at all times. In hesitant mode
/// [`commit`](Self::commit) moves the checkpoint up to the position after a
/// fully decoded unit and [`rollback`](Self::rollback) returns the position to
/// the checkpoint when a unit turns out to be incomplete. Outside hesitant mode
/// both are no-ops and the checkpoint stays at the start.
///
/// # Example
///
/// ```
/// use sc2_replay_parser::binary::Cursor;
///
/// let data = [1, 2, 3, 4];
/// let mut cursor = Cursor::hesitant(&data);
///
/// cursor.read(2).unwrap();
/// cursor.commit();
/// assert!(cursor.read(3).is_err());
/// cursor.read_u8().unwrap();
/// assert_eq!(cursor.rollback(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    checkpoint: usize,
    hesitant: bool,
}

impl<'a> Cursor<'a> {
    /// Creates a one-shot cursor; commit and rollback do nothing.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            checkpoint: 0,
            hesitant: false,
        }
    }

    /// Creates a transactional cursor for incremental decoding.
    #[must_use]
    pub fn hesitant(data: &'a [u8]) -> Self {
        Self {
            hesitant: true,
            ..Self::new(data)
        }
    }

    /// Returns the current read position.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the last committed position.
    #[must_use]
    pub fn checkpoint(&self) -> usize {
        self.checkpoint
    }

    /// Returns whether the cursor is transactional.
    #[must_use]
    pub fn is_hesitant(&self) -> bool {
        self.hesitant
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns `true` when every byte has been read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns the unread part of the buffer without consuming it.
    #[must_use]
    pub fn unread(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn ensure(&self, count: usize) -> Result<()> {
        if self.remaining() < count {
            return Err(ParserError::insufficient_data(count, self.remaining()));
        }
        Ok(())
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` at the end of the buffer.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly `count` bytes and advances past them.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if fewer than `count` bytes
    /// remain; the position is left unchanged.
    pub fn read(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let start = self.pos;
        self.pos += count;
        Ok(&self.data[start..self.pos])
    }

    /// Reads exactly `N` bytes into an array.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if fewer than `N` bytes remain.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    /// Advances the position by `count` bytes without returning them.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InsufficientData` if fewer than `count` bytes remain.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.pos += count;
        Ok(())
    }

    /// Moves the position back by `count` bytes.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InvalidSeek` if that would cross below the checkpoint.
    pub fn rewind(&mut self, count: usize) -> Result<()> {
        let target = self.pos.checked_sub(count).unwrap_or(usize::MAX);
        self.seek(target)
    }

    /// Moves the position to `target`, which must lie between the checkpoint
    /// and the end of the buffer.
    ///
    /// # Errors
    ///
    /// Returns `ParserError::InvalidSeek` for targets outside that range.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        if target < self.checkpoint || target > self.data.len() {
            return Err(ParserError::InvalidSeek {
                target,
                checkpoint: self.checkpoint,
                length: self.data.len(),
            });
        }
        self.pos = target;
        Ok(())
    }

    /// Marks everything read so far as consumed. Returns the checkpoint.
    pub fn commit(&mut self) -> usize {
        if self.hesitant {
            self.checkpoint = self.pos;
        }
        self.checkpoint
    }

    /// Returns to the last checkpoint. Returns the resulting position.
    pub fn rollback(&mut self) -> usize {
        if self.hesitant {
            self.pos = self.checkpoint;
        }
        self.pos
    }
}
