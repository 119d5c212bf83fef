/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Stored previews of the merged image
//!
//! Modern files carry a composite image bank: attribute chunks for the
//! full size composite and a small thumbnail, the thumbnail as a JPEG
//! stream and the composite as ordinary channel blocks. Legacy files
//! carry a single thumbnail block instead.
use log::{debug, trace};

use crate::block::{write_block, write_block_start, BlockHeader};
use crate::bytestream::{ByteReader, ByteWriter};
use crate::channel::{ChannelSubBlock, EncodedChannel};
use crate::constants::{
    BlockId, ChannelType, CompositeImageType, Compression, DibType, PSP_MAJOR_VERSION_5,
    PSP_V5_THUMBNAIL_BLOCK
};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::layer::Rect;
use crate::palette::ColorPalette;
use crate::pixels::{split_planes, PixelSource};
use crate::render::{fit_dimensions, resize_rgba};
use crate::version::{FormatVersion, Framing};

/// Fixed header of the composite image bank
const BANK_HEADER_SIZE: u32 = 8;
const ATTRIBUTES_CHUNK_SIZE: u32 = 24;
const JPEG_CHUNK_SIZE: u32 = 14;
const IMAGE_CHUNK_SIZE: u32 = 8;
/// Initial length of the legacy thumbnail block
const THUMBNAIL_INITIAL_LENGTH: u32 = 24;

/// Longest edge of the JPEG thumbnail in modern files
pub const JPEG_THUMBNAIL_MAX_EDGE: usize = 200;
/// Longest edge of the thumbnail in legacy files
pub const LEGACY_THUMBNAIL_MAX_EDGE: usize = 300;

/// A decoded preview, RGBA with 8 bits per channel
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PspPreview {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u8>
}

/// Describes one image of the composite bank
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CompositeAttributes {
    pub width:       i32,
    pub height:      i32,
    pub bit_depth:   u16,
    pub compression: Compression,
    pub plane_count: u16,
    pub color_count: u32,
    pub image_type:  CompositeImageType
}

impl CompositeAttributes {
    /// Attributes of a 24 bit image
    pub fn new(
        width: i32, height: i32, image_type: CompositeImageType, compression: Compression
    ) -> CompositeAttributes {
        CompositeAttributes {
            width,
            height,
            bit_depth: 24,
            compression,
            plane_count: 1,
            color_count: 1 << 24,
            image_type
        }
    }

    pub fn read(reader: &mut ByteReader) -> Result<CompositeAttributes, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = reader.get_u32_le_err()?;
        let width = reader.get_i32_le_err()?;
        let height = reader.get_i32_le_err()?;
        let bit_depth = reader.get_u16_le_err()?;

        let compression_int = reader.get_u16_le_err()?;
        let compression = Compression::from_int(compression_int)
            .ok_or(PspDecodeErrors::UnknownCompression(compression_int))?;

        let plane_count = reader.get_u16_le_err()?;
        let color_count = reader.get_u32_le_err()?;

        let type_int = reader.get_u16_le_err()?;
        let image_type = CompositeImageType::from_int(type_int).ok_or(
            PspDecodeErrors::CorruptBlock {
                offset: start,
                reason: "unknown composite image type"
            }
        )?;

        let consumed = reader.position() - start;
        reader.skip((chunk_size as usize).saturating_sub(consumed))?;

        trace!("Composite attributes {image_type:?} {width}x{height}, {bit_depth} bits, {compression:?}");

        Ok(CompositeAttributes {
            width,
            height,
            bit_depth,
            compression,
            plane_count,
            color_count,
            image_type
        })
    }

    /// Write as a complete attributes chunk
    pub fn write(&self, writer: &mut ByteWriter) {
        write_block_start(
            writer,
            BlockId::CompositeImageAttributes as u16,
            Framing::Modern,
            0
        );
        writer.write_u32_le(ATTRIBUTES_CHUNK_SIZE);
        writer.write_u32_le(ATTRIBUTES_CHUNK_SIZE);
        writer.write_i32_le(self.width);
        writer.write_i32_le(self.height);
        writer.write_u16_le(self.bit_depth);
        writer.write_u16_le(self.compression as u16);
        writer.write_u16_le(self.plane_count);
        writer.write_u32_le(self.color_count);
        writer.write_u16_le(self.image_type as u16);
    }
}

/// The JPEG stream of the thumbnail
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct JpegImage {
    pub uncompressed_length: u32,
    pub image_type:          DibType,
    pub data:                Vec<u8>
}

impl JpegImage {
    pub fn read(reader: &mut ByteReader) -> Result<JpegImage, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = reader.get_u32_le_err()?;
        let compressed_length = reader.get_u32_le_err()?;
        let uncompressed_length = reader.get_u32_le_err()?;

        let type_int = reader.get_u16_le_err()?;
        let image_type =
            DibType::from_int(type_int).ok_or(PspDecodeErrors::UnknownBitmapType(type_int))?;

        let consumed = reader.position() - start;
        reader.skip((chunk_size as usize).saturating_sub(consumed))?;

        let data = reader.read_bytes(compressed_length as usize)?.to_vec();

        trace!("JPEG thumbnail of {compressed_length} bytes");

        Ok(JpegImage {
            uncompressed_length,
            image_type,
            data
        })
    }

    /// Write as a complete JPEG chunk
    pub fn write(&self, writer: &mut ByteWriter) -> Result<(), PspEncodeErrors> {
        let compressed_length = u32::try_from(self.data.len())
            .ok()
            .filter(|x| x.checked_add(JPEG_CHUNK_SIZE).is_some())
            .ok_or(PspEncodeErrors::BlockTooLarge(self.data.len()))?;

        write_block_start(writer, BlockId::JPEGImage as u16, Framing::Modern, 0);
        writer.write_u32_le(JPEG_CHUNK_SIZE + compressed_length);
        writer.write_u32_le(JPEG_CHUNK_SIZE);
        writer.write_u32_le(compressed_length);
        writer.write_u32_le(self.uncompressed_length);
        writer.write_u16_le(self.image_type as u16);
        writer.write_all(&self.data);

        Ok(())
    }
}

/// The full size composite stored as channels
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CompositeImageInfo {
    pub bitmap_count:  u16,
    pub channel_count: u16,
    /// Present for indexed composites
    pub palette:       Option<ColorPalette>,
    pub channels:      Vec<ChannelSubBlock>
}

impl CompositeImageInfo {
    /// Read the composite image chunk whose header is `header`
    pub fn read(
        reader: &mut ByteReader, header: &BlockHeader, compression: Compression,
        version: FormatVersion, strict: bool
    ) -> Result<CompositeImageInfo, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = reader.get_u32_le_err()?;
        let bitmap_count = reader.get_u16_le_err()?;
        let channel_count = reader.get_u16_le_err()?;

        let consumed = reader.position() - start;
        reader.skip((chunk_size as usize).saturating_sub(consumed))?;

        let (palette, channels) = read_image_sub_blocks(
            reader,
            header,
            compression,
            version,
            channel_count,
            strict
        )?;

        Ok(CompositeImageInfo {
            bitmap_count,
            channel_count,
            palette,
            channels
        })
    }
}

/// Read palette and channel sub blocks until `channel_count` channels are
/// found, never past the end of `header`'s body
fn read_image_sub_blocks(
    reader: &mut ByteReader, header: &BlockHeader, compression: Compression,
    version: FormatVersion, channel_count: u16, strict: bool
) -> Result<(Option<ColorPalette>, Vec<ChannelSubBlock>), PspDecodeErrors> {
    let framing = version.framing();
    let end = header.body_end();

    let mut palette = None;
    let mut channels = Vec::with_capacity(usize::from(channel_count));

    while channels.len() < usize::from(channel_count) {
        if reader.position() >= end {
            return Err(PspDecodeErrors::CorruptBlock {
                offset: header.offset,
                reason: "image block ended before all of its channels"
            });
        }
        let block = BlockHeader::read(reader, framing)?;

        match BlockId::from_int(block.id) {
            Some(BlockId::ColorPalette) => palette = Some(ColorPalette::read(reader, version)?),
            Some(BlockId::Channel) => {
                channels.push(ChannelSubBlock::read(reader, compression, framing, strict)?);
            }
            _ => debug!("Skipping block {} inside an image block", block.id)
        }

        if reader.position() > block.body_end() {
            return Err(PspDecodeErrors::CorruptBlock {
                offset: block.offset,
                reason: "image data overruns its block"
            });
        }
        reader.set_position(block.body_end())?;
    }
    Ok((palette, channels))
}

/// Contents of a composite image bank
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeImageBank {
    pub attributes: Vec<CompositeAttributes>,
    pub jpeg:       Option<JpegImage>,
    pub image:      Option<CompositeImageInfo>
}

impl CompositeImageBank {
    /// Read the bank whose header is `header`, the cursor must be past it
    pub fn read(
        reader: &mut ByteReader, header: &BlockHeader, version: FormatVersion, strict: bool
    ) -> Result<CompositeImageBank, PspDecodeErrors> {
        let end = header.body_end();
        let start = reader.position();

        let block_size = reader.get_u32_le_err()?;
        let attribute_count = reader.get_u32_le_err()?;

        let consumed = reader.position() - start;
        reader.skip((block_size as usize).saturating_sub(consumed))?;

        let mut bank = CompositeImageBank::default();

        for _ in 0..attribute_count {
            if reader.position() >= end {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset: header.offset,
                    reason: "composite bank ended before its attribute chunks"
                });
            }
            let chunk = BlockHeader::read_expecting(
                reader,
                Framing::Modern,
                BlockId::CompositeImageAttributes as u16
            )?;
            bank.attributes.push(CompositeAttributes::read(reader)?);
            reader.set_position(chunk.body_end().max(reader.position()))?;
        }

        // one image follows each attribute chunk
        for _ in 0..attribute_count {
            if reader.position() >= end {
                break;
            }
            let chunk = BlockHeader::read(reader, Framing::Modern)?;

            match BlockId::from_int(chunk.id) {
                Some(BlockId::CompositeImage) => {
                    let compression = bank
                        .composite_attributes()
                        .map_or(Compression::LZ77, |x| x.compression);

                    bank.image = Some(CompositeImageInfo::read(
                        reader,
                        &chunk,
                        compression,
                        version,
                        strict
                    )?);
                }
                Some(BlockId::JPEGImage) => bank.jpeg = Some(JpegImage::read(reader)?),
                _ => debug!("Skipping block {} inside the composite bank", chunk.id)
            }

            if reader.position() > chunk.body_end() {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset: chunk.offset,
                    reason: "composite data overruns its block"
                });
            }
            reader.set_position(chunk.body_end())?;
        }
        Ok(bank)
    }

    /// Attributes of the full size composite
    pub fn composite_attributes(&self) -> Option<&CompositeAttributes> {
        self.attributes
            .iter()
            .find(|x| x.image_type == CompositeImageType::Composite)
    }

    /// Attributes of the JPEG thumbnail
    pub fn thumbnail_attributes(&self) -> Option<&CompositeAttributes> {
        self.attributes
            .iter()
            .find(|x| x.image_type == CompositeImageType::Thumbnail)
    }

    /// Rebuild the full size composite, `None` when the bank does not hold one
    pub fn decode_composite(
        &self, transparency_index: Option<usize>, strict: bool, offset: usize
    ) -> Result<Option<PspPreview>, PspDecodeErrors> {
        let (Some(attributes), Some(image)) = (self.composite_attributes(), &self.image) else {
            return Ok(None);
        };
        let width = usize::try_from(attributes.width).unwrap_or(0);
        let height = usize::try_from(attributes.height).unwrap_or(0);

        let source = PixelSource {
            width,
            height,
            bit_depth: attributes.bit_depth,
            bitmap_count: image.bitmap_count,
            channels: &image.channels,
            palette: image.palette.as_ref(),
            transparency_index: transparency_index.filter(|_| attributes.bit_depth < 24),
            strict,
            offset
        };

        Ok(Some(PspPreview {
            width,
            height,
            pixels: source.reconstruct()?
        }))
    }
}

/// The thumbnail block of legacy files
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailBlock {
    pub width:               i32,
    pub height:              i32,
    pub bit_depth:           u16,
    pub compression:         Compression,
    pub plane_count:         u16,
    pub color_count:         u32,
    pub palette_entry_count: u32,
    pub channel_count:       u16,
    pub palette:             Option<ColorPalette>,
    pub channels:            Vec<ChannelSubBlock>
}

impl ThumbnailBlock {
    /// Read the thumbnail whose header is `header`, the cursor must be past it
    pub fn read(
        reader: &mut ByteReader, header: &BlockHeader, strict: bool
    ) -> Result<ThumbnailBlock, PspDecodeErrors> {
        let width = reader.get_i32_le_err()?;
        let height = reader.get_i32_le_err()?;
        let bit_depth = reader.get_u16_le_err()?;

        let compression_int = reader.get_u16_le_err()?;
        let compression = Compression::from_int(compression_int)
            .ok_or(PspDecodeErrors::UnknownCompression(compression_int))?;

        let plane_count = reader.get_u16_le_err()?;
        let color_count = reader.get_u32_le_err()?;
        let palette_entry_count = reader.get_u32_le_err()?;
        let channel_count = reader.get_u16_le_err()?;

        trace!("Thumbnail {width}x{height}, {bit_depth} bits, {channel_count} channels");

        let (palette, channels) = read_image_sub_blocks(
            reader,
            header,
            compression,
            FormatVersion::new(PSP_MAJOR_VERSION_5, 0),
            channel_count,
            strict
        )?;

        Ok(ThumbnailBlock {
            width,
            height,
            bit_depth,
            compression,
            plane_count,
            color_count,
            palette_entry_count,
            channel_count,
            palette,
            channels
        })
    }

    pub fn decode(&self, strict: bool, offset: usize) -> Result<PspPreview, PspDecodeErrors> {
        let width = usize::try_from(self.width).unwrap_or(0);
        let height = usize::try_from(self.height).unwrap_or(0);

        let source = PixelSource {
            width,
            height,
            bit_depth: self.bit_depth,
            bitmap_count: 1,
            channels: &self.channels,
            palette: self.palette.as_ref(),
            transparency_index: None,
            strict,
            offset
        };

        Ok(PspPreview {
            width,
            height,
            pixels: source.reconstruct()?
        })
    }
}

/// Split RGBA pixels into compressed composite planes
///
/// Color planes come first, an alpha plane is added when `with_alpha` is set.
/// `on_channel` is called after each plane is compressed.
pub fn encode_planes(
    rgba: &[u8], width: usize, height: usize, with_alpha: bool, compression: Compression,
    framing: Framing, mut on_channel: impl FnMut()
) -> Result<Vec<EncodedChannel>, PspEncodeErrors> {
    let rect = Rect::new(0, 0, clamp_i32(width), clamp_i32(height));
    let planes = split_planes(rgba, width, rect, with_alpha);

    let channel_types = [
        ChannelType::Red,
        ChannelType::Green,
        ChannelType::Blue,
        ChannelType::Composite
    ];
    let mut channels = Vec::with_capacity(planes.len());

    for (i, (plane, channel_type)) in planes.iter().zip(channel_types).enumerate() {
        let bitmap_type = match (framing, i) {
            (Framing::Legacy, _) => DibType::Thumbnail,
            (Framing::Modern, 0..=2) => DibType::Composite,
            (Framing::Modern, _) => DibType::CompositeTransparencyMask
        };
        channels.push(EncodedChannel::compress(
            plane,
            compression,
            bitmap_type,
            channel_type
        )?);
        on_channel();
    }
    Ok(channels)
}

fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Encode the thumbnail of a merged image as a baseline JPEG
///
/// Fully transparent pixels are painted white since JPEG has no alpha.
///
/// # Returns
/// The thumbnail width, height and the JPEG stream
#[allow(clippy::cast_possible_truncation)]
pub fn encode_jpeg_thumbnail(
    rgba: &[u8], width: usize, height: usize, quality: u8
) -> Result<(usize, usize, Vec<u8>), PspEncodeErrors> {
    let (thumb_width, thumb_height) = fit_dimensions(width, height, JPEG_THUMBNAIL_MAX_EDGE);
    let fitted = resize_rgba(rgba, width, height, thumb_width, thumb_height);

    let rgb: Vec<u8> = fitted
        .chunks_exact(4)
        .flat_map(|pix| {
            if pix[3] == 0 {
                [255, 255, 255]
            } else {
                [pix[0], pix[1], pix[2]]
            }
        })
        .collect();

    let mut jpeg = Vec::new();
    let encoder = jpeg_encoder::Encoder::new(&mut jpeg, quality);

    encoder
        .encode(
            &rgb,
            thumb_width as u16,
            thumb_height as u16,
            jpeg_encoder::ColorType::Rgb
        )
        .map_err(|x| PspEncodeErrors::JpegEncode(x.to_string()))?;

    Ok((thumb_width, thumb_height, jpeg))
}

/// Everything the composite bank of a modern file holds
pub struct EncodedComposite {
    pub width:            i32,
    pub height:           i32,
    pub compression:      Compression,
    pub thumbnail_width:  i32,
    pub thumbnail_height: i32,
    pub jpeg:             Vec<u8>,
    /// 2 when the composite has an alpha plane
    pub bitmap_count:     u16,
    pub channels:         Vec<EncodedChannel>
}

/// Write the composite image bank
pub fn write_composite_bank(
    writer: &mut ByteWriter, composite: &EncodedComposite
) -> Result<(), PspEncodeErrors> {
    let thumbnail = CompositeAttributes::new(
        composite.thumbnail_width,
        composite.thumbnail_height,
        CompositeImageType::Thumbnail,
        Compression::JPEG
    );
    let full = CompositeAttributes::new(
        composite.width,
        composite.height,
        CompositeImageType::Composite,
        composite.compression
    );
    let jpeg = JpegImage {
        uncompressed_length: 0,
        image_type:          DibType::Thumbnail,
        data:                composite.jpeg.clone()
    };

    write_block(
        writer,
        BlockId::CompositeImageBank as u16,
        Framing::Modern,
        0,
        |w| {
            w.write_u32_le(BANK_HEADER_SIZE);
            w.write_u32_le(2);

            thumbnail.write(w);
            full.write(w);
            jpeg.write(w)?;

            write_block(
                w,
                BlockId::CompositeImage as u16,
                Framing::Modern,
                0,
                |w| {
                    w.write_u32_le(IMAGE_CHUNK_SIZE);
                    w.write_u16_le(composite.bitmap_count);
                    w.write_u16_le(composite.channels.len() as u16);

                    for channel in &composite.channels {
                        channel.write(w, Framing::Modern)?;
                    }
                    Ok(())
                }
            )?;
            Ok(())
        }
    )?;
    Ok(())
}

/// Write the thumbnail block of a legacy file, `channels` hold 24 bit planes
pub fn write_thumbnail_block(
    writer: &mut ByteWriter, width: i32, height: i32, compression: Compression,
    channels: &[EncodedChannel]
) -> Result<(), PspEncodeErrors> {
    write_block(
        writer,
        PSP_V5_THUMBNAIL_BLOCK,
        Framing::Legacy,
        THUMBNAIL_INITIAL_LENGTH,
        |w| {
            w.write_i32_le(width);
            w.write_i32_le(height);
            w.write_u16_le(24);
            w.write_u16_le(compression as u16);
            w.write_u16_le(1);
            w.write_u32_le(1 << 24);
            w.write_u32_le(0);
            w.write_u16_le(channels.len() as u16);

            for channel in channels {
                channel.write(w, Framing::Legacy)?;
            }
            Ok(())
        }
    )?;
    Ok(())
}
