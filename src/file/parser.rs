//! Low-level byte stream cursor.
//!
//! [`crate::file::parser::Parser`] is a position-tracking view over a byte slice. It knows
//! nothing about pointers or object graphs; the graph [`crate::Reader`] is built on top of it.
//! All reads are bounds-checked and fail with [`crate::Error::TruncatedStream`] without
//! advancing the cursor.
//!
//! # Examples
//!
//! ```rust
//! use needlework::{Endianness, Parser};
//!
//! let data = [0x00, 0x02, b'h', b'i', 0x00];
//! let mut parser = Parser::new(&data, Endianness::Big);
//! assert_eq!(parser.read::<u16>()?, 2);
//! assert_eq!(parser.read_string_utf8()?, "hi");
//! assert_eq!(parser.remaining(), 0);
//! # Ok::<(), needlework::Error>(())
//! ```

use crate::{
    file::io::{read_at, read_be_at, read_le_at, BinaryIO},
    Endianness, Result,
};

/// A bounds-checked cursor over a byte slice.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
    endianness: Endianness,
}

impl<'a> Parser<'a> {
    /// Creates a cursor at position 0 that reads primitives in `endianness`.
    #[must_use]
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Parser {
            data,
            position: 0,
            endianness,
        }
    }

    /// Total length of the underlying data
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying data is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Moves the cursor to an absolute position. Seeking to the very end is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if `pos` lies beyond the data.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(truncated_error!(self.data.len(), pos - self.data.len(), 0));
        }

        self.position = pos;
        Ok(())
    }

    /// Advances the cursor by `step` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the step would leave the data.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        self.position = self.calc_end_position(step)?;
        Ok(())
    }

    /// Current cursor position
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Skips padding until the cursor is a multiple of `alignment`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if the padding would leave the data.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let padding = (alignment - (self.position % alignment)) % alignment;
        self.advance_by(padding)
    }

    /// Reads a primitive in the cursor's configured byte order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read<T: BinaryIO>(&mut self) -> Result<T> {
        read_at::<T>(self.data, &mut self.position, self.endianness)
    }

    /// Reads a little-endian primitive.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read_le<T: BinaryIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }

    /// Reads a big-endian primitive.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read_be<T: BinaryIO>(&mut self) -> Result<T> {
        read_be_at::<T>(self.data, &mut self.position)
    }

    /// Reads a NUL-terminated UTF-8 string and moves past the terminator.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if no terminator is found, or
    /// [`crate::Error::MalformedContainer`] for invalid UTF-8.
    pub fn read_string_utf8(&mut self) -> Result<String> {
        let start = self.position;
        let Some(length) = self.data[start..].iter().position(|&byte| byte == 0) else {
            return Err(truncated_error!(start, self.remaining() + 1, self.remaining()));
        };

        let string_data = &self.data[start..start + length];
        self.position = start + length + 1;

        String::from_utf8(string_data.to_vec()).map_err(|e| {
            malformed_error!(
                "Invalid UTF-8 string at offset {}-{}: {}",
                start,
                start + length,
                e.utf8_error()
            )
        })
    }

    /// Number of bytes between the cursor and the end of the data
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Fails unless at least `needed` bytes remain.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if fewer bytes remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(truncated_error!(self.position, needed, self.remaining()));
        }
        Ok(())
    }

    /// Position the cursor would reach after `length` more bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if that position lies beyond the data.
    pub fn calc_end_position(&self, length: usize) -> Result<usize> {
        let end = self
            .position
            .checked_add(length)
            .ok_or(truncated_error!(self.position, length, self.remaining()))?;

        if end > self.data.len() {
            return Err(truncated_error!(self.position, length, self.remaining()));
        }

        Ok(end)
    }

    /// Reads `length` raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        let end = self.calc_end_position(length)?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn read_in_configured_order() {
        let data = [0x12, 0x34, 0x12, 0x34];
        let mut parser = Parser::new(&data, Endianness::Big);
        assert_eq!(parser.read::<u16>().unwrap(), 0x1234);
        assert_eq!(parser.read_le::<u16>().unwrap(), 0x3412);

        let mut parser = Parser::new(&data, Endianness::Little);
        assert_eq!(parser.read::<u16>().unwrap(), 0x3412);
        assert_eq!(parser.read_be::<u16>().unwrap(), 0x1234);
    }

    #[test]
    fn test_parse_string() {
        let test_cases = vec![
            (vec![0x61, 0x62, 0x63, 0x00], "abc"),
            (vec![0x00], ""),
            (vec![0x6D, 0x61, 0x74, 0x00, 0xFF], "mat"),
        ];

        for (input, expected) in test_cases {
            let mut parser = Parser::new(&input, Endianness::Big);
            assert_eq!(parser.read_string_utf8().unwrap(), expected);
        }
    }

    #[test]
    fn test_parse_string_unterminated() {
        let data = [0x61, 0x62];
        let mut parser = Parser::new(&data, Endianness::Big);
        assert!(matches!(
            parser.read_string_utf8(),
            Err(Error::TruncatedStream { .. })
        ));
        assert_eq!(parser.pos(), 0);
    }

    #[test]
    fn test_parse_string_invalid_utf8() {
        let data = [0xC3, 0x28, 0x00];
        let mut parser = Parser::new(&data, Endianness::Big);
        assert!(matches!(
            parser.read_string_utf8(),
            Err(Error::MalformedContainer { .. })
        ));
    }

    #[test]
    fn seek_and_align() {
        let data = [0u8; 10];
        let mut parser = Parser::new(&data, Endianness::Little);
        parser.seek(1).unwrap();
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);
        parser.align(4).unwrap();
        assert_eq!(parser.pos(), 4);

        parser.seek(10).unwrap();
        assert_eq!(parser.remaining(), 0);
        assert!(parser.seek(11).is_err());

        parser.seek(9).unwrap();
        assert!(parser.align(4).is_err());
    }

    #[test]
    fn read_bytes_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut parser = Parser::new(&data, Endianness::Little);
        assert_eq!(parser.read_bytes(2).unwrap(), &[0x01, 0x02]);
        assert_eq!(parser.remaining(), 1);
        assert!(parser.ensure_remaining(2).is_err());
        assert!(matches!(
            parser.read_bytes(2),
            Err(Error::TruncatedStream {
                position: 2,
                needed: 2,
                available: 1
            })
        ));
    }
}
