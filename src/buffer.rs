//! The text buffer an edit tree is applied to.
//!
//! The processor only ever reads a region and replaces a region, so any
//! document model exposing those two operations can be edited. Offsets are
//! byte offsets.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("invalid range: [{offset}, {offset}+{length}) in buffer of length {buffer_len}")]
    InvalidRange {
        offset: usize,
        length: usize,
        buffer_len: usize,
    },

    #[error("offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },
}

/// Mutable text consumed by the edit processor.
pub trait Buffer {
    /// Current length in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text currently stored at `[offset, offset + length)`.
    fn text(&self, offset: usize, length: usize) -> Result<String, BufferError>;

    /// Replace `[offset, offset + length)` with `text`.
    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), BufferError>;
}

fn checked_range(
    content: &str,
    offset: usize,
    length: usize,
) -> Result<(usize, usize), BufferError> {
    let end = offset
        .checked_add(length)
        .filter(|&end| end <= content.len())
        .ok_or(BufferError::InvalidRange {
            offset,
            length,
            buffer_len: content.len(),
        })?;
    for boundary in [offset, end] {
        if !content.is_char_boundary(boundary) {
            return Err(BufferError::NotCharBoundary { offset: boundary });
        }
    }
    Ok((offset, end))
}

impl Buffer for String {
    fn len(&self) -> usize {
        String::len(self)
    }

    fn text(&self, offset: usize, length: usize) -> Result<String, BufferError> {
        let (start, end) = checked_range(self, offset, length)?;
        Ok(self[start..end].to_string())
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<(), BufferError> {
        let (start, end) = checked_range(self, offset, length)?;
        self.replace_range(start..end, text);
        Ok(())
    }
}
