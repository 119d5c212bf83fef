/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The layer container block
//!
//! `LayerStart` holds one `Layer` block per layer. Each layer block starts
//! with a layer info chunk followed, for raster layers, by a bitmap info
//! chunk and its channel sub blocks.
use log::{debug, trace, warn};

use crate::attributes::ImageAttributes;
use crate::block::{write_block, BlockHeader};
use crate::bytestream::{ByteReader, ByteWriter, StringTrim};
use crate::channel::{ChannelSubBlock, EncodedChannel};
use crate::constants::{
    BlendMode, BlockId, Compression, LayerFlags, LayerType, PSP_BLOCK_IDENTIFIER,
    PSP_X2_LAYER_MARKER_BLOCK
};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::version::{FormatVersion, Framing};

/// Size of a legacy layer info chunk
pub const LEGACY_LAYER_INFO_SIZE: u32 = 375;
/// Fixed part of a modern layer info chunk, the name follows the length prefix
const MODERN_LAYER_INFO_BASE_SIZE: u32 = 121;
/// Size of the fixed name field in legacy files
const LEGACY_NAME_LENGTH: usize = 256;
/// Header of a modern bitmap info chunk
const BITMAP_INFO_CHUNK_SIZE: u32 = 8;
const BLEND_RANGE_COUNT: usize = 5;

/// A rectangle stored as left, top, right and bottom edges,
/// right and bottom are exclusive
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Rect {
    pub left:   i32,
    pub top:    i32,
    pub right:  i32,
    pub bottom: i32
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Rect {
        Rect {
            left,
            top,
            right,
            bottom
        }
    }

    pub const fn empty() -> Rect {
        Rect::new(0, 0, 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    pub fn width(&self) -> usize {
        usize::try_from(i64::from(self.right) - i64::from(self.left)).unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        usize::try_from(i64::from(self.bottom) - i64::from(self.top)).unwrap_or(0)
    }

    /// The overlap of two rectangles, empty if they do not touch
    pub fn intersect(&self, other: &Rect) -> Rect {
        let rect = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom)
        );
        if rect.is_empty() {
            Rect::empty()
        } else {
            rect
        }
    }

    fn read(reader: &mut ByteReader) -> Result<Rect, PspDecodeErrors> {
        Ok(Rect::new(
            reader.get_i32_le_err()?,
            reader.get_i32_le_err()?,
            reader.get_i32_le_err()?,
            reader.get_i32_le_err()?
        ))
    }

    fn write(&self, writer: &mut ByteWriter) {
        writer.write_i32_le(self.left);
        writer.write_i32_le(self.top);
        writer.write_i32_le(self.right);
        writer.write_i32_le(self.bottom);
    }
}

/// Source and destination ranges of a blend range slot
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct BlendRange {
    pub source:      u32,
    pub destination: u32
}

/// Per layer metadata
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    pub name:                   String,
    pub layer_type:             LayerType,
    pub image_rect:             Rect,
    /// Bounding box of the pixels actually stored, may be empty
    pub save_rect:              Rect,
    pub opacity:                u8,
    pub blend_mode:             BlendMode,
    pub flags:                  LayerFlags,
    pub protected_transparency: u8,
    pub link_group:             u8,
    pub mask_rect:              Rect,
    pub save_mask_rect:         Rect,
    pub mask_linked:            u8,
    pub mask_disabled:          u8,
    pub invert_mask_on_blend:   u8,
    pub blend_range_count:      u16,
    pub blend_ranges:           [BlendRange; BLEND_RANGE_COUNT],
    /// Paint Shop Pro 8 and later
    pub use_highlight_color:    u8,
    pub highlight_color:        u32,
    /// Legacy files store the bitmap layout inside the info chunk
    pub legacy_bitmap_count:    u16,
    pub legacy_channel_count:   u16
}

impl LayerInfo {
    /// A visible raster layer covering `image_rect`
    pub fn new_raster(
        name: &str, image_rect: Rect, save_rect: Rect, opacity: u8, blend_mode: BlendMode,
        visible: bool
    ) -> LayerInfo {
        let mut flags = LayerFlags::empty();
        flags.set(LayerFlags::VISIBLE, visible);

        LayerInfo {
            name: name.to_string(),
            layer_type: LayerType::Raster,
            image_rect,
            save_rect,
            opacity,
            blend_mode,
            flags,
            protected_transparency: 0,
            link_group: 0,
            mask_rect: Rect::empty(),
            save_mask_rect: Rect::empty(),
            mask_linked: 0,
            mask_disabled: 0,
            invert_mask_on_blend: 0,
            blend_range_count: 0,
            blend_ranges: [BlendRange::default(); BLEND_RANGE_COUNT],
            use_highlight_color: 0,
            highlight_color: 0,
            legacy_bitmap_count: 0,
            legacy_channel_count: 0
        }
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(LayerFlags::VISIBLE)
    }

    /// Read a layer info chunk, the cursor must be at the start of the layer body
    pub fn read(reader: &mut ByteReader, version: FormatVersion) -> Result<LayerInfo, PspDecodeErrors> {
        let start = reader.position();
        let framing = version.framing();

        let (chunk_size, name) = match framing {
            Framing::Modern => {
                let chunk_size = reader.get_u32_le_err()?;
                let name_length = reader.get_u16_le_err()?;
                let name = reader.read_ascii(usize::from(name_length), StringTrim::None)?;
                (Some(chunk_size), name)
            }
            Framing::Legacy => {
                let name = reader.read_ascii(LEGACY_NAME_LENGTH, StringTrim::NulTerminator)?;
                (None, name)
            }
        };

        let type_int = reader.read_u8_err()?;
        let layer_type = match (LayerType::from_int(type_int), framing) {
            (Some(LayerType::Undefined), Framing::Legacy) => LayerType::Raster,
            (Some(layer_type), _) => layer_type,
            (None, _) => {
                debug!("Unknown layer type {type_int}, layer will be skipped");
                LayerType::Undefined
            }
        };
        let image_rect = Rect::read(reader)?;
        let save_rect = Rect::read(reader)?;
        let opacity = reader.read_u8_err()?;

        let blend_int = reader.read_u8_err()?;
        let blend_mode = BlendMode::from_int(blend_int).unwrap_or_else(|| {
            debug!("Unknown blend mode {blend_int}, using normal");
            BlendMode::Normal
        });
        let flags = LayerFlags::from_bits_retain(reader.read_u8_err()?);
        let protected_transparency = reader.read_u8_err()?;
        let link_group = reader.read_u8_err()?;
        let mask_rect = Rect::read(reader)?;
        let save_mask_rect = Rect::read(reader)?;
        let mask_linked = reader.read_u8_err()?;
        let mask_disabled = reader.read_u8_err()?;
        let invert_mask_on_blend = reader.read_u8_err()?;
        let blend_range_count = reader.get_u16_le_err()?;

        let mut blend_ranges = [BlendRange::default(); BLEND_RANGE_COUNT];
        for range in blend_ranges.iter_mut() {
            range.source = reader.get_u32_le_err()?;
            range.destination = reader.get_u32_le_err()?;
        }

        let mut info = LayerInfo {
            name,
            layer_type,
            image_rect,
            save_rect,
            opacity,
            blend_mode,
            flags,
            protected_transparency,
            link_group,
            mask_rect,
            save_mask_rect,
            mask_linked,
            mask_disabled,
            invert_mask_on_blend,
            blend_range_count,
            blend_ranges,
            use_highlight_color: 0,
            highlight_color: 0,
            legacy_bitmap_count: 0,
            legacy_channel_count: 0
        };

        if version.has_layer_highlight() {
            info.use_highlight_color = reader.read_u8_err()?;
            info.highlight_color = reader.get_u32_le_err()?;
        } else if framing == Framing::Legacy {
            info.legacy_bitmap_count = reader.get_u16_le_err()?;
            info.legacy_channel_count = reader.get_u16_le_err()?;
        }

        if let Some(chunk_size) = chunk_size {
            let consumed = reader.position() - start;
            reader.skip((chunk_size as usize).saturating_sub(consumed))?;
        }

        trace!(
            "Layer {:?}, type {:?}, save rect {:?}",
            info.name,
            info.layer_type,
            info.save_rect
        );
        Ok(info)
    }

    /// Write the layer info chunk
    pub fn write(&self, writer: &mut ByteWriter, version: FormatVersion) -> Result<(), PspEncodeErrors> {
        let framing = version.framing();

        let mut name: Vec<u8> = self
            .name
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect();

        match framing {
            Framing::Modern => {
                name.truncate(usize::from(u16::MAX));

                let mut chunk_size = MODERN_LAYER_INFO_BASE_SIZE + name.len() as u32;
                if version.has_layer_highlight() {
                    chunk_size += 5;
                }
                writer.write_u32_le(chunk_size);
                writer.write_u16_le(name.len() as u16);
                writer.write_all(&name);
            }
            Framing::Legacy => {
                // 255 characters at most, the last byte is always a terminator
                name.truncate(LEGACY_NAME_LENGTH - 1);
                name.resize(LEGACY_NAME_LENGTH, 0);
                writer.write_all(&name);
            }
        }
        let layer_type = match framing {
            Framing::Modern => self.layer_type as u8,
            Framing::Legacy => LayerType::Undefined as u8
        };
        writer.write_u8(layer_type);
        self.image_rect.write(writer);
        self.save_rect.write(writer);
        writer.write_u8(self.opacity);
        writer.write_u8(self.blend_mode as u8);
        writer.write_u8(self.flags.bits());
        writer.write_u8(self.protected_transparency);
        writer.write_u8(self.link_group);
        self.mask_rect.write(writer);
        self.save_mask_rect.write(writer);
        writer.write_u8(self.mask_linked);
        writer.write_u8(self.mask_disabled);
        writer.write_u8(self.invert_mask_on_blend);
        writer.write_u16_le(self.blend_range_count);

        for range in &self.blend_ranges {
            writer.write_u32_le(range.source);
            writer.write_u32_le(range.destination);
        }

        if version.has_layer_highlight() {
            writer.write_u8(self.use_highlight_color);
            writer.write_u32_le(self.highlight_color);
        } else if framing == Framing::Legacy {
            writer.write_u16_le(self.legacy_bitmap_count);
            writer.write_u16_le(self.legacy_channel_count);
        }
        Ok(())
    }
}

/// The channels of a layer's bitmap
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LayerBitmapInfo {
    /// 1 for opaque bitmaps, 2 when a transparency mask is present
    pub bitmap_count:  u16,
    pub channel_count: u16,
    pub channels:      Vec<ChannelSubBlock>
}

impl LayerBitmapInfo {
    /// Read a modern bitmap info chunk and its channels
    pub fn read_modern(
        reader: &mut ByteReader, compression: Compression, strict: bool
    ) -> Result<LayerBitmapInfo, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = reader.get_u32_le_err()?;
        let bitmap_count = reader.get_u16_le_err()?;
        let channel_count = reader.get_u16_le_err()?;

        let consumed = reader.position() - start;
        reader.skip((chunk_size as usize).saturating_sub(consumed))?;

        let channels = read_channels(reader, compression, Framing::Modern, channel_count, strict)?;

        Ok(LayerBitmapInfo {
            bitmap_count,
            channel_count,
            channels
        })
    }

    /// Read legacy channels, their count comes from the layer info chunk
    pub fn read_legacy(
        reader: &mut ByteReader, compression: Compression, bitmap_count: u16, channel_count: u16,
        strict: bool
    ) -> Result<LayerBitmapInfo, PspDecodeErrors> {
        let channels = read_channels(reader, compression, Framing::Legacy, channel_count, strict)?;

        Ok(LayerBitmapInfo {
            bitmap_count,
            channel_count,
            channels
        })
    }
}

/// Read `count` channel sub blocks, each introduced by a block header
pub(crate) fn read_channels(
    reader: &mut ByteReader, compression: Compression, framing: Framing, count: u16, strict: bool
) -> Result<Vec<ChannelSubBlock>, PspDecodeErrors> {
    let mut channels = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        let header = BlockHeader::read_expecting(reader, framing, BlockId::Channel as u16)?;
        channels.push(ChannelSubBlock::read(reader, compression, framing, strict)?);

        if reader.position() < header.body_end() {
            reader.set_position(header.body_end())?;
        }
    }
    Ok(channels)
}

/// Compressed planes of a layer waiting to be written
#[derive(Debug, Clone)]
pub struct EncodedBitmap {
    pub bitmap_count: u16,
    pub channels:     Vec<EncodedChannel>
}

impl EncodedBitmap {
    pub fn write(&self, writer: &mut ByteWriter, framing: Framing) -> Result<(), PspEncodeErrors> {
        if framing == Framing::Modern {
            writer.write_u32_le(BITMAP_INFO_CHUNK_SIZE);
            writer.write_u16_le(self.bitmap_count);
            writer.write_u16_le(self.channels.len() as u16);
        }
        for channel in &self.channels {
            channel.write(writer, framing)?;
        }
        Ok(())
    }
}

/// A pixel carrying layer found by the layer scan
#[derive(Debug, Clone)]
pub struct RasterLayer {
    /// Offset of the layer block
    pub offset: usize,
    pub info:   LayerInfo,
    /// `None` when the save rectangle is empty
    pub bitmap: Option<LayerBitmapInfo>
}

/// Read the layer container whose header is `header`
///
/// Every layer block counts against the layer count of `attributes`,
/// raster and floating selection layers are returned in file order.
pub fn read_layer_block(
    reader: &mut ByteReader, header: &BlockHeader, attributes: &ImageAttributes,
    version: FormatVersion, strict: bool
) -> Result<Vec<RasterLayer>, PspDecodeErrors> {
    let framing = version.framing();
    let end = header.body_end();
    let layer_count = usize::from(attributes.layer_count);

    let mut found = Vec::with_capacity(layer_count);
    let mut index = 0;

    while index < layer_count {
        if reader.position() >= end {
            if strict {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset: header.offset,
                    reason: "layer container ended before the declared layer count"
                });
            }
            warn!("Layer container holds {index} of {layer_count} declared layers");
            break;
        }
        let block = BlockHeader::read(reader, framing)?;

        if block.id == BlockId::Layer as u16 {
            index += 1;

            let info = LayerInfo::read(reader, version)?;
            let mut bitmap_offset = reader.position();

            if info.layer_type.has_pixels() {
                if version.has_layer_marker_block() {
                    bitmap_offset = skip_layer_marker(reader, version)?;
                }
                found.push((block.offset, info, bitmap_offset));
            } else {
                debug!("Skipping {:?} layer {:?}", info.layer_type, info.name);
            }
        } else {
            debug!("Skipping block {} inside the layer container", block.id);
        }

        if reader.position() > block.body_end() {
            return Err(PspDecodeErrors::CorruptBlock {
                offset: block.offset,
                reason: "layer data overruns its block"
            });
        }
        reader.set_position(block.body_end())?;
    }

    if found.is_empty() {
        return Err(PspDecodeErrors::RasterLayerNotFound);
    }

    let mut layers = Vec::with_capacity(found.len());

    for (offset, info, bitmap_offset) in found {
        let bitmap = if info.save_rect.is_empty() {
            None
        } else {
            reader.set_position(bitmap_offset)?;

            Some(match framing {
                Framing::Modern => {
                    LayerBitmapInfo::read_modern(reader, attributes.compression, strict)?
                }
                Framing::Legacy => LayerBitmapInfo::read_legacy(
                    reader,
                    attributes.compression,
                    info.legacy_bitmap_count,
                    info.legacy_channel_count,
                    strict
                )?
            })
        };
        layers.push(RasterLayer {
            offset,
            info,
            bitmap
        });
    }
    reader.set_position(end)?;

    Ok(layers)
}

/// Skip the block Paint Shop Pro X2 and later place between a raster layer's
/// info chunk and its bitmap info chunk
///
/// # Returns
/// The offset of the bitmap info chunk
fn skip_layer_marker(reader: &mut ByteReader, version: FormatVersion) -> Result<usize, PspDecodeErrors> {
    let unsupported = PspDecodeErrors::UnsupportedFormatVersion(version.major);

    if reader.get_u32_le_err()? != PSP_BLOCK_IDENTIFIER {
        return Err(unsupported);
    }
    let id = reader.get_u16_le_err()?;
    let length = reader.get_u32_le_err()?;

    if id != PSP_X2_LAYER_MARKER_BLOCK {
        return Err(unsupported);
    }
    reader.skip(length as usize)?;

    if reader.get_u32_le_err()? != BITMAP_INFO_CHUNK_SIZE {
        return Err(unsupported);
    }
    reader.rewind(4)?;

    Ok(reader.position())
}

/// A layer ready to be written
pub struct LayerRecord {
    pub info:   LayerInfo,
    pub bitmap: EncodedBitmap
}

/// Write the layer container and every layer in `layers`
pub fn write_layer_block(
    writer: &mut ByteWriter, layers: &[LayerRecord], version: FormatVersion
) -> Result<(), PspEncodeErrors> {
    let framing = version.framing();

    write_block(writer, BlockId::LayerStart as u16, framing, 0, |w| {
        for layer in layers {
            write_block(
                w,
                BlockId::Layer as u16,
                framing,
                LEGACY_LAYER_INFO_SIZE,
                |w| {
                    layer.info.write(w, version)?;
                    layer.bitmap.write(w, framing)
                }
            )?;
        }
        Ok(())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ChannelType, DibType};

    fn record(name: &str, save_rect: Rect, framing: Framing) -> LayerRecord {
        let mut info = LayerInfo::new_raster(
            name,
            Rect::new(0, 0, 4, 4),
            save_rect,
            200,
            BlendMode::Multiply,
            true
        );
        let plane = vec![7_u8; save_rect.width() * save_rect.height()];
        let channels: Vec<EncodedChannel> = [ChannelType::Red, ChannelType::Green, ChannelType::Blue]
            .into_iter()
            .map(|c| EncodedChannel::compress(&plane, Compression::LZ77, DibType::Image, c).unwrap())
            .collect();

        if framing == Framing::Legacy {
            info.legacy_bitmap_count = 1;
            info.legacy_channel_count = 3;
        }
        LayerRecord {
            info,
            bitmap: EncodedBitmap {
                bitmap_count: 1,
                channels
            }
        }
    }

    fn write_and_scan(layers: &[LayerRecord], version: FormatVersion) -> Vec<RasterLayer> {
        let mut writer = ByteWriter::new();
        write_layer_block(&mut writer, layers, version).unwrap();
        let bytes = writer.into_inner();

        let attributes = ImageAttributes::new(4, 4, Compression::LZ77, layers.len() as u16);

        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, version.framing()).unwrap();
        assert_eq!(header.body_end(), bytes.len());

        let found = read_layer_block(&mut reader, &header, &attributes, version, true).unwrap();
        assert!(reader.eof());
        found
    }

    #[test]
    fn rect_geometry() {
        let rect = Rect::new(2, 3, 5, 9);
        assert_eq!((rect.width(), rect.height()), (3, 6));
        assert!(Rect::new(4, 0, 4, 10).is_empty());
        assert_eq!(Rect::new(5, 5, 1, 1).width(), 0);

        let clipped = rect.intersect(&Rect::new(0, 0, 4, 4));
        assert_eq!(clipped, Rect::new(2, 3, 4, 4));
        assert!(rect.intersect(&Rect::new(10, 10, 20, 20)).is_empty());
    }

    #[test]
    fn legacy_info_is_fixed_size() {
        let info = record("Background", Rect::new(0, 0, 4, 4), Framing::Legacy).info;
        let mut writer = ByteWriter::new();
        info.write(&mut writer, FormatVersion::new(3, 0)).unwrap();
        assert_eq!(writer.position(), LEGACY_LAYER_INFO_SIZE as usize);
    }

    #[test]
    fn modern_info_size_follows_name() {
        let info = record("Background", Rect::new(0, 0, 4, 4), Framing::Modern).info;
        let mut writer = ByteWriter::new();
        info.write(&mut writer, FormatVersion::new(5, 0)).unwrap();
        let bytes = writer.into_inner();

        assert_eq!(bytes.len(), 121 + "Background".len());
        assert_eq!(&bytes[..4], &(bytes.len() as u32).to_le_bytes());
    }

    #[test]
    fn long_names() {
        let name: String = "abcdefghij".repeat(30);

        let legacy = write_and_scan(
            &[record(&name, Rect::new(0, 0, 4, 4), Framing::Legacy)],
            FormatVersion::new(3, 0)
        );
        assert_eq!(legacy[0].info.name, name[..255]);

        let modern = write_and_scan(
            &[record(&name, Rect::new(0, 0, 4, 4), Framing::Modern)],
            FormatVersion::new(5, 0)
        );
        assert_eq!(modern[0].info.name, name);
    }

    #[test]
    fn layers_round_trip_in_both_framings() {
        for (major, framing) in [(3, Framing::Legacy), (4, Framing::Modern), (6, Framing::Modern)] {
            let layers = [
                record("One", Rect::new(0, 0, 4, 4), framing),
                record("Empty", Rect::empty(), framing),
                record("Two", Rect::new(1, 1, 3, 2), framing)
            ];
            let found = write_and_scan(&layers, FormatVersion::new(major, 0));

            assert_eq!(found.len(), 3);
            assert_eq!(found[0].info.name, "One");
            assert_eq!(found[0].info.opacity, 200);
            assert_eq!(found[0].info.blend_mode, BlendMode::Multiply);
            assert_eq!(found[0].info.layer_type, LayerType::Raster);
            assert!(found[0].info.is_visible());
            assert!(found[1].bitmap.is_none());

            let bitmap = found[2].bitmap.as_ref().unwrap();
            assert_eq!(bitmap.channels.len(), 3);
            assert_eq!(bitmap.channels[1].channel_type, ChannelType::Green);
            assert_eq!(bitmap.channels[2].data, vec![7; 2]);
        }
    }

    #[test]
    fn no_raster_layers() {
        let mut info = record("Vector", Rect::empty(), Framing::Modern);
        info.info.layer_type = LayerType::Vector;

        let version = FormatVersion::new(5, 0);
        let mut writer = ByteWriter::new();
        write_layer_block(&mut writer, &[info], version).unwrap();
        let bytes = writer.into_inner();

        let attributes = ImageAttributes::new(4, 4, Compression::LZ77, 1);
        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, Framing::Modern).unwrap();

        let result = read_layer_block(&mut reader, &header, &attributes, version, false);
        assert!(matches!(result, Err(PspDecodeErrors::RasterLayerNotFound)));
    }

    #[test]
    fn declared_count_larger_than_container() {
        let version = FormatVersion::new(5, 0);
        let mut writer = ByteWriter::new();
        write_layer_block(
            &mut writer,
            &[record("Only", Rect::new(0, 0, 4, 4), Framing::Modern)],
            version
        )
        .unwrap();
        let bytes = writer.into_inner();

        let attributes = ImageAttributes::new(4, 4, Compression::LZ77, 2);

        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, Framing::Modern).unwrap();
        let found = read_layer_block(&mut reader, &header, &attributes, version, false).unwrap();
        assert_eq!(found.len(), 1);

        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, Framing::Modern).unwrap();
        let result = read_layer_block(&mut reader, &header, &attributes, version, true);
        assert!(matches!(result, Err(PspDecodeErrors::CorruptBlock { .. })));
    }
}
