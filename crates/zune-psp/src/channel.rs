/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Channel sub blocks, one compressed 8 bit plane each
use log::{trace, warn};

use crate::block::write_block_start;
use crate::bytestream::{ByteReader, ByteWriter};
use crate::constants::{BlockId, ChannelType, Compression, DibType};
use crate::deflate::{deflate_zlib, inflate_zlib};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::rle;
use crate::version::Framing;

/// Chunk size of a modern channel header, the chunk size field included
const MODERN_CHANNEL_HEADER_SIZE: u32 = 16;
/// Size of a legacy channel header
const LEGACY_CHANNEL_HEADER_SIZE: u32 = 12;

/// Best ratio a run length stream can reach, a two byte run expands to 127 bytes
const RLE_MAX_EXPANSION: usize = 64;
/// Best ratio a deflate stream can reach
const DEFLATE_MAX_EXPANSION: usize = 1032;

/// A decoded channel
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChannelSubBlock {
    pub compressed_length:   u32,
    pub uncompressed_length: u32,
    pub bitmap_type:         DibType,
    pub channel_type:        ChannelType,
    /// The uncompressed plane
    pub data:                Vec<u8>
}

impl ChannelSubBlock {
    /// Read a channel body, the cursor must be past the block header.
    ///
    /// `compression` is the mode of the enclosing image, in strict mode
    /// a plane that decompresses short is an error.
    pub fn read(
        reader: &mut ByteReader, compression: Compression, framing: Framing, strict: bool
    ) -> Result<ChannelSubBlock, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = match framing {
            Framing::Modern => Some(reader.get_u32_le_err()?),
            Framing::Legacy => None
        };
        let compressed_length = reader.get_u32_le_err()?;
        let uncompressed_length = reader.get_u32_le_err()?;

        let bitmap_int = reader.get_u16_le_err()?;
        let bitmap_type =
            DibType::from_int(bitmap_int).ok_or(PspDecodeErrors::UnknownBitmapType(bitmap_int))?;

        let channel_int = reader.get_u16_le_err()?;
        let channel_type = ChannelType::from_int(channel_int)
            .ok_or(PspDecodeErrors::UnknownChannelType(channel_int))?;

        if let Some(chunk_size) = chunk_size {
            let consumed = reader.position() - start;
            reader.skip((chunk_size as usize).saturating_sub(consumed))?;
        }

        trace!(
            "Channel {bitmap_type:?}/{channel_type:?}, compressed {compressed_length}, uncompressed {uncompressed_length}"
        );

        let data = if compressed_length > 0 {
            let offset = reader.position();
            let payload = reader.read_bytes(compressed_length as usize)?;

            decompress_plane(
                payload,
                uncompressed_length as usize,
                compression,
                offset,
                strict
            )?
        } else {
            Vec::new()
        };

        Ok(ChannelSubBlock {
            compressed_length,
            uncompressed_length,
            bitmap_type,
            channel_type,
            data
        })
    }
}

fn decompress_plane(
    payload: &[u8], uncompressed_length: usize, compression: Compression, offset: usize,
    strict: bool
) -> Result<Vec<u8>, PspDecodeErrors> {
    match compression {
        Compression::None => Ok(payload.to_vec()),
        Compression::RLE => {
            if uncompressed_length > payload.len().saturating_mul(RLE_MAX_EXPANSION) {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset,
                    reason: "run length plane declares more data than it can hold"
                });
            }
            let mut output = vec![0; uncompressed_length];
            let written = rle::decompress(payload, &mut output);

            if written < uncompressed_length {
                if strict {
                    return Err(PspDecodeErrors::CompressedDataCorrupt(format!(
                        "run length stream produced {written} bytes, expected {uncompressed_length}"
                    )));
                }
                warn!(
                    "Run length stream produced {written} bytes, expected {uncompressed_length}, padding with zeroes"
                );
            }
            Ok(output)
        }
        Compression::LZ77 => {
            if uncompressed_length > payload.len().saturating_mul(DEFLATE_MAX_EXPANSION) {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset,
                    reason: "deflate plane declares more data than it can hold"
                });
            }
            inflate_zlib(payload, uncompressed_length, strict)
        }
        Compression::JPEG => Err(PspDecodeErrors::Generic(
            "JPEG compressed channels are not supported"
        ))
    }
}

/// A plane compressed and ready to be written
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct EncodedChannel {
    pub bitmap_type:         DibType,
    pub channel_type:        ChannelType,
    pub uncompressed_length: u32,
    pub payload:             Vec<u8>
}

impl EncodedChannel {
    /// Compress `plane` with `compression`
    ///
    /// Uncompressed planes record an uncompressed length of zero, the
    /// compressed length alone describes them.
    pub fn compress(
        plane: &[u8], compression: Compression, bitmap_type: DibType, channel_type: ChannelType
    ) -> Result<EncodedChannel, PspEncodeErrors> {
        let plane_length =
            u32::try_from(plane.len()).map_err(|_| PspEncodeErrors::BlockTooLarge(plane.len()))?;

        let (uncompressed_length, payload) = if plane.is_empty() {
            (0, Vec::new())
        } else {
            match compression {
                Compression::None => (0, plane.to_vec()),
                Compression::RLE => (plane_length, rle::compress(plane)),
                Compression::LZ77 => (plane_length, deflate_zlib(plane)?),
                Compression::JPEG => return Err(PspEncodeErrors::UnsupportedCompression(compression))
            }
        };

        Ok(EncodedChannel {
            bitmap_type,
            channel_type,
            uncompressed_length,
            payload
        })
    }

    pub fn compressed_length(&self) -> usize {
        self.payload.len()
    }

    /// Write the channel as a complete sub block
    pub fn write(&self, writer: &mut ByteWriter, framing: Framing) -> Result<(), PspEncodeErrors> {
        let compressed_length = u32::try_from(self.payload.len())
            .ok()
            .filter(|x| x.checked_add(MODERN_CHANNEL_HEADER_SIZE).is_some())
            .ok_or(PspEncodeErrors::BlockTooLarge(self.payload.len()))?;

        write_block_start(
            writer,
            BlockId::Channel as u16,
            framing,
            LEGACY_CHANNEL_HEADER_SIZE
        );
        match framing {
            Framing::Modern => {
                writer.write_u32_le(MODERN_CHANNEL_HEADER_SIZE + compressed_length);
                writer.write_u32_le(MODERN_CHANNEL_HEADER_SIZE);
            }
            Framing::Legacy => {
                writer.write_u32_le(LEGACY_CHANNEL_HEADER_SIZE + compressed_length);
            }
        }
        writer.write_u32_le(compressed_length);
        writer.write_u32_le(self.uncompressed_length);
        writer.write_u16_le(self.bitmap_type as u16);
        writer.write_u16_le(self.channel_type as u16);
        writer.write_all(&self.payload);

        Ok(())
    }
}
