//! Cursor over a window of device flash memory.
//!
//! A [`Cursor`] is anchored at an absolute device offset (its `base`) and keeps a
//! relative advance (`rel`) within the window it was handed. Reads are little-endian
//! and non-consuming: they peek at a caller-supplied offset from the current
//! position, and only [`Cursor::advance`] moves the cursor forward.
//!
//! The `(base, rel)` bookkeeping is exposed as a plain [`Position`] value so the
//! drift correction done by the chain decoders can be reasoned about (and tested)
//! without any byte source at all.

use std::borrow::Cow;

use crate::{DecodeError, Result};

/// Absolute base of a cursor window plus the cursor's advance within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub base: u32,
    pub rel: u32,
}

impl Position {
    pub fn new(base: u32) -> Self {
        Self { base, rel: 0 }
    }

    /// Absolute device offset the cursor currently points at.
    pub fn absolute(&self) -> u64 {
        u64::from(self.base) + u64::from(self.rel)
    }

    /// Signed distance from the current position to `declared`.
    ///
    /// Positive when the declared offset lies ahead of the cursor.
    pub fn diff_to(&self, declared: u32) -> i64 {
        i64::from(declared) - self.absolute() as i64
    }

    pub fn is_at(&self, declared: u32) -> bool {
        self.absolute() == u64::from(declared)
    }
}

/// Readable window of device memory returned by a [`ByteSource`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    window: Cow<'a, [u8]>,
    position: Position,
}

impl<'a> Cursor<'a> {
    /// Create a cursor over `window`, whose first byte lives at device offset `base`.
    pub fn new(window: impl Into<Cow<'a, [u8]>>, base: u32) -> Self {
        Self { window: window.into(), position: Position::new(base) }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn absolute(&self) -> u64 {
        self.position.absolute()
    }

    /// Bytes left in the window past the current position.
    pub fn remaining(&self) -> usize {
        self.window.len().saturating_sub(self.position.rel as usize)
    }

    /// Move the cursor forward by `n` bytes.
    ///
    /// Advancing past the end of the window is allowed; the next read fails instead.
    pub fn advance(&mut self, n: u32) {
        self.position.rel = self.position.rel.saturating_add(n);
    }

    fn bytes<const N: usize>(&self, at: u32) -> Result<[u8; N]> {
        let start = self.position.rel as usize + at as usize;
        self.window
            .get(start..start + N)
            .and_then(|slice| <[u8; N]>::try_from(slice).ok())
            .ok_or_else(|| {
                DecodeError::out_of_range(
                    self.position.absolute() + u64::from(at),
                    N,
                    self.window.len(),
                )
            })
    }

    pub fn u8_at(&self, at: u32) -> Result<u8> {
        Ok(self.bytes::<1>(at)?[0])
    }

    pub fn i8_at(&self, at: u32) -> Result<i8> {
        Ok(i8::from_le_bytes(self.bytes(at)?))
    }

    pub fn u16_at(&self, at: u32) -> Result<u16> {
        Ok(u16::from_le_bytes(self.bytes(at)?))
    }

    pub fn i16_at(&self, at: u32) -> Result<i16> {
        Ok(i16::from_le_bytes(self.bytes(at)?))
    }

    pub fn u32_at(&self, at: u32) -> Result<u32> {
        Ok(u32::from_le_bytes(self.bytes(at)?))
    }

    pub fn i32_at(&self, at: u32) -> Result<i32> {
        Ok(i32::from_le_bytes(self.bytes(at)?))
    }

    /// Fixed-length text field, cut at the first NUL and right-trimmed.
    pub fn str_at(&self, at: u32, len: usize) -> Result<String> {
        let start = self.position.rel as usize + at as usize;
        let bytes = self.window.get(start..start + len).ok_or_else(|| {
            DecodeError::out_of_range(self.position.absolute() + u64::from(at), len, self.window.len())
        })?;
        let null_pos = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..null_pos]).trim_end().to_string())
    }
}

/// Source of device memory windows.
///
/// Implementations wrap whatever transport fetched the flash contents. The decoder
/// only ever asks for a window starting at an absolute offset and reads forward.
pub trait ByteSource: Sync {
    /// Return a readable window anchored at `offset`.
    fn read_from_offset(&self, offset: u32) -> Result<Cursor<'_>>;
}

/// Absolute device offset of a record stored relative to a region base.
pub(crate) fn region_offset(base: u32, rel: u32) -> Result<u32> {
    base.checked_add(rel)
        .ok_or_else(|| DecodeError::out_of_range(u64::from(base) + u64::from(rel), 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peeks_are_little_endian_and_non_consuming() {
        let data = [0x34, 0x12, 0xff, 0xfe, 0x78, 0x56, 0x34, 0x12];
        let cursor = Cursor::new(&data[..], 0x100);

        assert_eq!(cursor.u16_at(0).unwrap(), 0x1234);
        assert_eq!(cursor.i8_at(2).unwrap(), -1);
        assert_eq!(cursor.i16_at(2).unwrap(), -257);
        assert_eq!(cursor.u32_at(4).unwrap(), 0x1234_5678);
        assert_eq!(cursor.u8_at(0).unwrap(), 0x34);
        assert_eq!(cursor.position(), Position { base: 0x100, rel: 0 });
    }

    #[test]
    fn advance_moves_relative_position_only() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cursor = Cursor::new(&data[..], 0x40);
        cursor.advance(4);

        assert_eq!(cursor.position(), Position { base: 0x40, rel: 4 });
        assert_eq!(cursor.absolute(), 0x44);
        assert_eq!(cursor.u8_at(1).unwrap(), 6);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn reads_past_window_report_absolute_offset() {
        let data = [0u8; 4];
        let mut cursor = Cursor::new(&data[..], 0x200);
        cursor.advance(2);

        match cursor.u32_at(0) {
            Err(DecodeError::OutOfRange { offset, len, available }) => {
                assert_eq!(offset, 0x202);
                assert_eq!(len, 4);
                assert_eq!(available, 4);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn text_fields_stop_at_nul() {
        let mut data = [0u8; 16];
        data[..9].copy_from_slice(b"Sunday 42");
        data[10] = b'x';
        let cursor = Cursor::new(&data[..], 0);
        assert_eq!(cursor.str_at(0, 16).unwrap(), "Sunday 42");
    }

    #[test]
    fn position_diff_is_signed() {
        let position = Position { base: 1000, rel: 40 };
        assert_eq!(position.diff_to(1044), 4);
        assert_eq!(position.diff_to(1030), -10);
        assert!(position.is_at(1040));
    }
}
