/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Errors that may occur while reading or writing PSP files
use core::fmt::{Debug, Display, Formatter};

use crate::constants::{Compression, PSP_BLOCK_IDENTIFIER};

/// Errors raised by the byte cursor
pub enum ByteIoError {
    /// A read asked for more bytes than the stream still holds
    ///
    /// # Arguments
    /// - position: Cursor position when the read was attempted
    /// - requested: Number of bytes asked for
    /// - remaining: Number of bytes left in the stream
    NotEnoughBytes {
        position:  usize,
        requested: usize,
        remaining: usize
    },
    /// A seek tried to move the cursor outside the stream
    SeekOutOfBounds { position: usize, length: usize }
}

impl Debug for ByteIoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            ByteIoError::NotEnoughBytes {
                position,
                requested,
                remaining
            } => {
                writeln!(
                    f,
                    "Not enough bytes at offset {position}, requested {requested} but only {remaining} remain"
                )
            }
            ByteIoError::SeekOutOfBounds { position, length } => {
                writeln!(
                    f,
                    "Cannot seek to {position}, stream length is {length}"
                )
            }
        }
    }
}

/// Errors that can occur during PSP decoding
#[non_exhaustive]
pub enum PspDecodeErrors {
    /// The file does not start with the `Paint Shop Pro Image File` signature
    InvalidSignature,
    /// A block did not start with the block marker `~BK\0`
    InvalidBlockSignature { offset: usize, found: u32 },
    /// The stream ended before a complete value could be read
    UnexpectedEndOfData {
        position:  usize,
        requested: usize,
        remaining: usize
    },
    /// Bit depth is not one of 1, 4, 8, 24 or 48
    UnsupportedBitDepth(u16),
    /// The major version uses a layout this decoder cannot follow
    UnsupportedFormatVersion(u16),
    /// A compressed channel could not be inflated
    CompressedDataCorrupt(String),
    /// The attributes block announced layers but no raster layer was found
    RasterLayerNotFound,
    /// An indexed image did not carry a color palette
    ColorPaletteNotFound,
    /// A mandatory top level block is absent
    MissingBlock(&'static str),
    /// A nested block had a different id than the one its parent requires
    UnexpectedBlockType {
        offset:   usize,
        expected: u16,
        found:    u16
    },
    /// The compression field holds an unknown value
    UnknownCompression(u16),
    /// A channel is tagged with a bitmap type we do not know
    UnknownBitmapType(u16),
    /// A channel is tagged with a channel type we do not know
    UnknownChannelType(u16),
    /// Self described lengths disagree with the data
    CorruptBlock { offset: usize, reason: &'static str },
    /// Image width or height is not positive
    InvalidDimensions(i64, i64),
    /// Dimensions exceed the limits set in decoder options
    ///
    /// # Arguments
    /// - 1st argument is the configured limit
    /// - 2nd argument is the value found in the file
    LargeDimensions(usize, usize),
    /// A pixel referenced a palette entry that does not exist
    ///
    /// Only reported in strict mode
    InvalidPaletteIndex(usize, usize),
    Generic(&'static str)
}

impl Debug for PspDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            PspDecodeErrors::InvalidSignature => {
                writeln!(f, "Invalid file signature, not a Paint Shop Pro image")
            }
            PspDecodeErrors::InvalidBlockSignature { offset, found } => {
                writeln!(
                    f,
                    "Invalid block signature at offset {offset}, expected {:#010x} but found {found:#010x}",
                    PSP_BLOCK_IDENTIFIER
                )
            }
            PspDecodeErrors::UnexpectedEndOfData {
                position,
                requested,
                remaining
            } => {
                writeln!(
                    f,
                    "Unexpected end of data at offset {position}, needed {requested} bytes but only {remaining} remain"
                )
            }
            PspDecodeErrors::UnsupportedBitDepth(depth) => {
                writeln!(
                    f,
                    "Unsupported bit depth {depth}, supported depths are 1, 4, 8, 24 and 48"
                )
            }
            PspDecodeErrors::UnsupportedFormatVersion(major) => {
                writeln!(f, "Unsupported format version, major version {major}")
            }
            PspDecodeErrors::CompressedDataCorrupt(reason) => {
                writeln!(f, "Compressed data is corrupt: {reason}")
            }
            PspDecodeErrors::RasterLayerNotFound => {
                writeln!(f, "The image does not contain any raster layer")
            }
            PspDecodeErrors::ColorPaletteNotFound => {
                writeln!(f, "Indexed image without a color palette")
            }
            PspDecodeErrors::MissingBlock(name) => {
                writeln!(f, "Required block {name} was not found")
            }
            PspDecodeErrors::UnexpectedBlockType {
                offset,
                expected,
                found
            } => {
                writeln!(
                    f,
                    "Unexpected block type {found} at offset {offset}, expected {expected}"
                )
            }
            PspDecodeErrors::UnknownCompression(value) => {
                writeln!(f, "Unknown compression type {value}")
            }
            PspDecodeErrors::UnknownBitmapType(value) => {
                writeln!(f, "Unknown channel bitmap type {value}")
            }
            PspDecodeErrors::UnknownChannelType(value) => {
                writeln!(f, "Unknown channel type {value}")
            }
            PspDecodeErrors::CorruptBlock { offset, reason } => {
                writeln!(f, "Corrupt block at offset {offset}: {reason}")
            }
            PspDecodeErrors::InvalidDimensions(width, height) => {
                writeln!(f, "Invalid image dimensions {width}x{height}")
            }
            PspDecodeErrors::LargeDimensions(supported, found) => {
                writeln!(
                    f,
                    "Too large dimensions, supported {supported} but found {found}"
                )
            }
            PspDecodeErrors::InvalidPaletteIndex(index, len) => {
                writeln!(
                    f,
                    "Palette index {index} out of range, palette has {len} entries"
                )
            }
            PspDecodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
        }
    }
}

impl Display for PspDecodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for PspDecodeErrors {}

impl From<&'static str> for PspDecodeErrors {
    fn from(r: &'static str) -> Self {
        Self::Generic(r)
    }
}

impl From<ByteIoError> for PspDecodeErrors {
    fn from(r: ByteIoError) -> Self {
        match r {
            ByteIoError::NotEnoughBytes {
                position,
                requested,
                remaining
            } => PspDecodeErrors::UnexpectedEndOfData {
                position,
                requested,
                remaining
            },
            ByteIoError::SeekOutOfBounds { position, length } => {
                PspDecodeErrors::UnexpectedEndOfData {
                    position:  length,
                    requested: position.saturating_sub(length),
                    remaining: 0
                }
            }
        }
    }
}

/// Errors encountered during encoding
#[non_exhaustive]
pub enum PspEncodeErrors {
    /// The document has no layers, readers reject such files
    NoLayers,
    /// The document holds more layers than the target version allows
    TooManyLayers { limit: usize, found: usize },
    /// Only Paint Shop Pro 5, 6 and 7 files can be written
    UnsupportedVersion(u16),
    /// The compression cannot be used for layer data
    UnsupportedCompression(Compression),
    /// A layer's pixel buffer does not match the document size
    LayerDimensionMismatch {
        layer:    usize,
        expected: (usize, usize),
        found:    (usize, usize)
    },
    /// The dimensions cannot be stored in the signed 32 bit fields of the format
    TooLargeDimensions(usize),
    /// A block body grew past what a 32 bit length can describe
    BlockTooLarge(usize),
    /// The composite thumbnail could not be JPEG encoded
    JpegEncode(String),
    IoError(std::io::Error),
    Generic(&'static str)
}

impl Debug for PspEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            PspEncodeErrors::NoLayers => {
                writeln!(f, "The document has no layers, at least one is required")
            }
            PspEncodeErrors::TooManyLayers { limit, found } => {
                writeln!(
                    f,
                    "Too many layers, the selected version supports {limit} but the document has {found}"
                )
            }
            PspEncodeErrors::UnsupportedVersion(major) => {
                writeln!(
                    f,
                    "Cannot write major version {major}, supported versions are 3, 4 and 5"
                )
            }
            PspEncodeErrors::UnsupportedCompression(compression) => {
                writeln!(f, "Cannot write layer data with {compression:?} compression")
            }
            PspEncodeErrors::LayerDimensionMismatch {
                layer,
                expected,
                found
            } => {
                writeln!(
                    f,
                    "Layer {layer} has dimensions {found:?} but the document is {expected:?}"
                )
            }
            PspEncodeErrors::TooLargeDimensions(found) => {
                writeln!(
                    f,
                    "Too large image dimensions {found}, PSP can only encode images less than {}",
                    i32::MAX
                )
            }
            PspEncodeErrors::BlockTooLarge(size) => {
                writeln!(f, "Block of {size} bytes does not fit a 32 bit length")
            }
            PspEncodeErrors::JpegEncode(reason) => {
                writeln!(f, "Could not encode the JPEG thumbnail: {reason}")
            }
            PspEncodeErrors::IoError(err) => {
                writeln!(f, "I/O error {:?}", err)
            }
            PspEncodeErrors::Generic(reason) => {
                writeln!(f, "{reason}")
            }
        }
    }
}

impl Display for PspEncodeErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        writeln!(f, "{:?}", self)
    }
}

impl std::error::Error for PspEncodeErrors {}

impl From<&'static str> for PspEncodeErrors {
    fn from(r: &'static str) -> Self {
        Self::Generic(r)
    }
}

impl From<std::io::Error> for PspEncodeErrors {
    fn from(value: std::io::Error) -> Self {
        PspEncodeErrors::IoError(value)
    }
}
