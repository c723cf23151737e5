//! Endian-aware, bounds-checked primitive conversion.
//!
//! This module is the foundational layer for every byte that crosses the stream boundary.
//! The [`crate::file::io::BinaryIO`] trait abstracts over the conversion between fixed-size
//! byte arrays and primitive values. Reads are bounds-checked at a caller-tracked offset;
//! writes produce the on-disk bytes that a [`crate::file::sink::Sink`] appends.
//!
//! # Key Components
//!
//! - [`crate::file::io::BinaryIO`] - Conversion between primitives and their byte arrays
//! - [`crate::file::io::read_le_at`] / [`crate::file::io::read_be_at`] - Read with auto-advance
//! - [`crate::file::io::read_at`] - Read using a runtime [`crate::Endianness`]
//! - [`crate::file::io::encode`] - Convert a primitive into its on-disk bytes
//!
//! # Examples
//!
//! ```rust
//! use needlework::{file::io::{encode, read_at}, Endianness};
//!
//! let mut data = Vec::new();
//! data.extend_from_slice(&encode(0x0102_u16, Endianness::Big));
//! data.extend_from_slice(&encode(0x0304_0506_u32, Endianness::Little));
//! assert_eq!(data, [0x01, 0x02, 0x06, 0x05, 0x04, 0x03]);
//!
//! let mut offset = 0;
//! let first: u16 = read_at(&data, &mut offset, Endianness::Big)?;
//! let second: u32 = read_at(&data, &mut offset, Endianness::Little)?;
//! assert_eq!((first, second), (0x0102, 0x0304_0506));
//! # Ok::<(), needlework::Error>(())
//! ```
//!
//! # Error Handling
//!
//! Every read returns [`crate::Error::TruncatedStream`] when the buffer holds fewer bytes
//! than the primitive needs. The offset is left untouched in that case.

use crate::{Endianness, Result};

/// Trait for primitives that have a fixed-size on-disk representation.
///
/// Each implementation names the byte array type it converts from and to
/// (e.g. `[u8; 4]` for `u32`), in both byte orders.
pub trait BinaryIO: Sized + Copy {
    /// Byte array representation of the primitive.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Read T from a byte buffer in big-endian
    fn from_be_bytes(bytes: Self::Bytes) -> Self;

    /// Write T to a byte buffer in little-endian
    fn to_le_bytes(self) -> Self::Bytes;
    /// Write T to a byte buffer in big-endian
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_binary_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BinaryIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_binary_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

fn take<'a, T: BinaryIO>(data: &'a [u8], offset: usize) -> Result<&'a [u8]> {
    let type_len = std::mem::size_of::<T>();
    let available = data.len().saturating_sub(offset);
    match offset.checked_add(type_len) {
        Some(end) if end <= data.len() => Ok(&data[offset..end]),
        _ => Err(truncated_error!(offset, type_len, available)),
    }
}

fn convert<T: BinaryIO>(bytes: &[u8], offset: usize) -> Result<T::Bytes> {
    bytes
        .try_into()
        .map_err(|_| truncated_error!(offset, std::mem::size_of::<T>(), bytes.len()))
}

/// Safely reads a value of type `T` in little-endian byte order at `offset`, advancing it.
///
/// # Errors
///
/// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
pub fn read_le_at<T: BinaryIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = convert::<T>(take::<T>(data, *offset)?, *offset)?;
    *offset += std::mem::size_of::<T>();
    Ok(T::from_le_bytes(bytes))
}

/// Safely reads a value of type `T` in big-endian byte order at `offset`, advancing it.
///
/// # Errors
///
/// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
pub fn read_be_at<T: BinaryIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let bytes = convert::<T>(take::<T>(data, *offset)?, *offset)?;
    *offset += std::mem::size_of::<T>();
    Ok(T::from_be_bytes(bytes))
}

/// Reads a value of type `T` at `offset` using a byte order chosen at runtime.
///
/// # Errors
///
/// Returns [`crate::Error::TruncatedStream`] if there are insufficient bytes.
pub fn read_at<T: BinaryIO>(data: &[u8], offset: &mut usize, endianness: Endianness) -> Result<T> {
    match endianness {
        Endianness::Little => read_le_at(data, offset),
        Endianness::Big => read_be_at(data, offset),
    }
}

/// Converts `value` into its on-disk bytes in the given byte order.
pub fn encode<T: BinaryIO>(value: T, endianness: Endianness) -> T::Bytes {
    match endianness {
        Endianness::Little => value.to_le_bytes(),
        Endianness::Big => value.to_be_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    const TEST_BUFFER: [u8; 8] = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];

    #[test]
    fn read_le_values() {
        let mut offset = 0;
        assert_eq!(read_le_at::<u16>(&TEST_BUFFER, &mut offset).unwrap(), 0x0201);
        assert_eq!(read_le_at::<u32>(&TEST_BUFFER, &mut offset).unwrap(), 0x0605_0403);
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_be_values() {
        let mut offset = 0;
        assert_eq!(read_be_at::<u64>(&TEST_BUFFER, &mut offset).unwrap(), 0x0102_0304_0506_0708);
        assert_eq!(offset, 8);
    }

    #[test]
    fn read_runtime_endianness() {
        let mut offset = 0;
        assert_eq!(read_at::<i16>(&TEST_BUFFER, &mut offset, Endianness::Big).unwrap(), 0x0102);
        assert_eq!(
            read_at::<i16>(&TEST_BUFFER, &mut offset, Endianness::Little).unwrap(),
            0x0403
        );
    }

    #[test]
    fn read_floats() {
        let data = 1.5_f32.to_be_bytes();
        let mut offset = 0;
        assert_eq!(read_be_at::<f32>(&data, &mut offset).unwrap(), 1.5);
    }

    #[test]
    fn read_truncated_keeps_offset() {
        let mut offset = 6;
        let result = read_le_at::<u32>(&TEST_BUFFER, &mut offset);
        assert!(matches!(
            result,
            Err(Error::TruncatedStream {
                position: 6,
                needed: 4,
                available: 2
            })
        ));
        assert_eq!(offset, 6);
    }

    #[test]
    fn read_offset_overflow() {
        let mut offset = usize::MAX;
        assert!(read_le_at::<u8>(&TEST_BUFFER, &mut offset).is_err());
    }

    #[test]
    fn encode_both_orders() {
        assert_eq!(encode(0x1234_u16, Endianness::Big), [0x12, 0x34]);
        assert_eq!(encode(0x1234_u16, Endianness::Little), [0x34, 0x12]);
    }
}
