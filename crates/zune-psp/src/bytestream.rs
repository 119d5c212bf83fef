/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Little endian byte cursors used by the block codecs
//!
//! [`ByteReader`] walks an in-memory file with an explicit, seekable
//! position. [`ByteWriter`] grows a buffer and supports reserving a length
//! field that is filled in once the body following it is known, see
//! [`LengthScope`].
use core::ops::{Deref, DerefMut};

use crate::errors::{ByteIoError, PspEncodeErrors};

/// Value stored in a reserved length field until it is patched
const LENGTH_PLACEHOLDER: u32 = 0x0BAD_F00D;

/// How [`ByteReader::read_ascii`] cleans up the string it read
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StringTrim {
    /// Keep every byte
    None,
    /// Stop at the first NUL byte
    NulTerminator,
    /// Remove whitespace and NULs from both ends
    WhiteSpace
}

/// A reader over a byte slice
pub struct ByteReader<'a> {
    data:     &'a [u8],
    position: usize
}

impl<'a> ByteReader<'a> {
    pub const fn new(data: &'a [u8]) -> ByteReader<'a> {
        ByteReader { data, position: 0 }
    }
    /// Current absolute offset into the stream
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }
    /// Total length of the stream
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }
    /// Whether the cursor reached the end of the stream
    #[inline]
    pub const fn eof(&self) -> bool {
        self.position >= self.data.len()
    }
    /// Move the cursor to an absolute offset, forwards or backwards.
    ///
    /// Offsets past the end of the stream are rejected
    pub fn set_position(&mut self, position: usize) -> Result<(), ByteIoError> {
        if position > self.data.len() {
            return Err(ByteIoError::SeekOutOfBounds {
                position,
                length: self.data.len()
            });
        }
        self.position = position;
        Ok(())
    }
    /// Skip `num` bytes
    pub fn skip(&mut self, num: usize) -> Result<(), ByteIoError> {
        match self.position.checked_add(num) {
            Some(position) if position <= self.data.len() => {
                self.position = position;
                Ok(())
            }
            _ => Err(ByteIoError::NotEnoughBytes {
                position:  self.position,
                requested: num,
                remaining: self.remaining()
            })
        }
    }
    /// Move the cursor `num` bytes back
    pub fn rewind(&mut self, num: usize) -> Result<(), ByteIoError> {
        match self.position.checked_sub(num) {
            Some(position) => self.set_position(position),
            None => Err(ByteIoError::SeekOutOfBounds {
                position: 0,
                length:   self.data.len()
            })
        }
    }
    /// Borrow the next `num` bytes and advance past them
    pub fn read_bytes(&mut self, num: usize) -> Result<&'a [u8], ByteIoError> {
        let end = self
            .position
            .checked_add(num)
            .filter(|end| *end <= self.data.len())
            .ok_or(ByteIoError::NotEnoughBytes {
                position:  self.position,
                requested: num,
                remaining: self.remaining()
            })?;

        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    #[inline]
    fn read_const_bytes<const N: usize>(&mut self) -> Result<[u8; N], ByteIoError> {
        let mut space = [0; N];
        space.copy_from_slice(self.read_bytes(N)?);
        Ok(space)
    }

    #[inline]
    pub fn read_u8_err(&mut self) -> Result<u8, ByteIoError> {
        let [byte] = self.read_const_bytes::<1>()?;
        Ok(byte)
    }
    /// Read an IEEE-754 double stored little endian
    pub fn get_f64_le_err(&mut self) -> Result<f64, ByteIoError> {
        Ok(f64::from_bits(self.get_u64_le_err()?))
    }
    /// Read a fixed length ASCII string
    ///
    /// Bytes outside the ASCII range are replaced with `?`
    pub fn read_ascii(&mut self, length: usize, trim: StringTrim) -> Result<String, ByteIoError> {
        let bytes = self.read_bytes(length)?;

        let bytes = match trim {
            StringTrim::NulTerminator => match bytes.iter().position(|x| *x == 0) {
                Some(end) => &bytes[..end],
                None => bytes
            },
            _ => bytes
        };

        let string: String = bytes
            .iter()
            .map(|&x| if x.is_ascii() { char::from(x) } else { '?' })
            .collect();

        match trim {
            StringTrim::WhiteSpace => Ok(string
                .trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0')
                .into()),
            _ => Ok(string)
        }
    }
}

macro_rules! get_single_type {
    ($name:tt,$int_type:tt) => {
        impl<'a> ByteReader<'a> {
            #[doc=concat!("Read ",stringify!($int_type)," as a little endian integer")]
            #[doc=concat!("Returning an error if the underlying buffer cannot support a ",stringify!($int_type)," read.")]
            #[inline]
            pub fn $name(&mut self) -> Result<$int_type, ByteIoError> {
                const SIZE_OF_VAL: usize = core::mem::size_of::<$int_type>();

                let space = self.read_const_bytes::<SIZE_OF_VAL>()?;

                Ok($int_type::from_le_bytes(space))
            }
        }
    };
}

get_single_type!(get_u16_le_err, u16);
get_single_type!(get_i16_le_err, i16);
get_single_type!(get_u32_le_err, u32);
get_single_type!(get_i32_le_err, i32);
get_single_type!(get_u64_le_err, u64);

/// A growable little endian writer
#[derive(Default)]
pub struct ByteWriter {
    buffer: Vec<u8>
}

impl ByteWriter {
    pub fn new() -> ByteWriter {
        ByteWriter { buffer: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> ByteWriter {
        ByteWriter {
            buffer: Vec::with_capacity(capacity)
        }
    }
    /// Offset the next write will land on
    #[inline]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    #[inline]
    pub fn write_all(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    pub fn write_f64_le(&mut self, value: f64) {
        self.write_u64_le(value.to_bits());
    }
    /// Overwrite four bytes at `offset` with `value`, the cursor does not move
    pub fn patch_u32_le(&mut self, offset: usize, value: u32) -> Result<(), ByteIoError> {
        let length = self.buffer.len();

        match self.buffer.get_mut(offset..offset.saturating_add(4)) {
            Some(slot) => {
                slot.copy_from_slice(&value.to_le_bytes());
                Ok(())
            }
            None => Err(ByteIoError::SeekOutOfBounds {
                position: offset,
                length
            })
        }
    }
    /// Reserve a length field and return a guard that patches it
    /// with the size of everything written through it.
    pub fn length_scope(&mut self) -> LengthScope<'_> {
        LengthScope::new(self)
    }
    /// Write a length field followed by the body produced by `body`.
    ///
    /// The length field is patched whether `body` succeeds or not.
    ///
    /// # Returns
    /// The number of bytes in the body
    pub fn write_length_scoped<F>(&mut self, body: F) -> Result<usize, PspEncodeErrors>
    where
        F: FnOnce(&mut ByteWriter) -> Result<(), PspEncodeErrors>
    {
        let mut scope = self.length_scope();
        body(&mut *scope)?;
        scope.finish()
    }
}

macro_rules! write_single_type {
    ($name:tt,$int_type:tt) => {
        impl ByteWriter {
            #[doc=concat!("Write ",stringify!($int_type)," as a little endian integer")]
            #[inline]
            pub fn $name(&mut self, value: $int_type) {
                self.buffer.extend_from_slice(&value.to_le_bytes());
            }
        }
    };
}

write_single_type!(write_u16_le, u16);
write_single_type!(write_i16_le, i16);
write_single_type!(write_u32_le, u32);
write_single_type!(write_i32_le, i32);
write_single_type!(write_u64_le, u64);

/// A reserved 32 bit length field.
///
/// Created by [`ByteWriter::length_scope`], it dereferences to the writer so the
/// body is written through it. When finished or dropped it stores the
/// number of bytes written after the field into the field, exactly once.
pub struct LengthScope<'a> {
    writer:        &'a mut ByteWriter,
    length_offset: usize,
    body_start:    usize,
    patched:       bool
}

impl<'a> LengthScope<'a> {
    fn new(writer: &'a mut ByteWriter) -> LengthScope<'a> {
        let length_offset = writer.position();
        writer.write_u32_le(LENGTH_PLACEHOLDER);
        let body_start = writer.position();

        LengthScope {
            writer,
            length_offset,
            body_start,
            patched: false
        }
    }
    /// Patch the length field now and return the body size
    pub fn finish(mut self) -> Result<usize, PspEncodeErrors> {
        self.patch()
    }

    fn patch(&mut self) -> Result<usize, PspEncodeErrors> {
        let length = self.writer.position() - self.body_start;

        if self.patched {
            return Ok(length);
        }
        self.patched = true;

        // the field is written even for oversized bodies so the
        // placeholder never leaks into the output
        let (value, result) = match u32::try_from(length) {
            Ok(value) => (value, Ok(length)),
            Err(_) => (u32::MAX, Err(PspEncodeErrors::BlockTooLarge(length)))
        };
        self.writer
            .patch_u32_le(self.length_offset, value)
            .map_err(|_| PspEncodeErrors::Generic("Length field vanished from buffer"))?;

        result
    }
}

impl Deref for LengthScope<'_> {
    type Target = ByteWriter;

    fn deref(&self) -> &Self::Target {
        self.writer
    }
}

impl DerefMut for LengthScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.writer
    }
}

impl Drop for LengthScope<'_> {
    fn drop(&mut self) {
        let _ = self.patch();
    }
}
