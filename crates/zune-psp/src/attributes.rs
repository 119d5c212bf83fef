/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! General image attributes block
use log::trace;

use crate::block::write_block_start;
use crate::bytestream::{ByteReader, ByteWriter};
use crate::constants::{BlockId, Compression, GraphicContents, ResolutionMetric};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::version::{FormatVersion, Framing};

/// Body size written by Paint Shop Pro 6 and later
const MODERN_ATTRIBUTES_SIZE: u32 = 46;
/// Body size written by Paint Shop Pro 5
const LEGACY_ATTRIBUTES_SIZE: u32 = 38;

/// Canvas wide properties of a file
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttributes {
    pub width:            i32,
    pub height:           i32,
    pub resolution:       f64,
    pub resolution_unit:  ResolutionMetric,
    pub compression:      Compression,
    pub bit_depth:        u16,
    pub plane_count:      u16,
    pub color_count:      u32,
    pub grayscale:        u8,
    pub total_image_size: u32,
    pub active_layer:     i32,
    pub layer_count:      u16,
    /// Always empty for legacy files
    pub graphic_contents: GraphicContents
}

impl ImageAttributes {
    /// Attributes of a 24 bit image as written by the encoder
    pub fn new(width: i32, height: i32, compression: Compression, layer_count: u16) -> ImageAttributes {
        ImageAttributes {
            width,
            height,
            resolution: 0.0,
            resolution_unit: ResolutionMetric::Undefined,
            compression,
            bit_depth: 24,
            plane_count: 1,
            color_count: 1 << 24,
            grayscale: 0,
            total_image_size: 0,
            active_layer: 0,
            layer_count,
            graphic_contents: GraphicContents::RASTER_LAYERS
        }
    }

    /// Read the attributes body, the cursor must be past the block header
    pub fn read(reader: &mut ByteReader, version: FormatVersion) -> Result<ImageAttributes, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = match version.framing() {
            Framing::Modern => Some(reader.get_u32_le_err()?),
            Framing::Legacy => None
        };
        let width = reader.get_i32_le_err()?;
        let height = reader.get_i32_le_err()?;
        let resolution = reader.get_f64_le_err()?;
        let resolution_unit = ResolutionMetric::from_int(reader.read_u8_err()?);
        let compression_int = reader.get_u16_le_err()?;
        let compression = Compression::from_int(compression_int)
            .ok_or(PspDecodeErrors::UnknownCompression(compression_int))?;
        let bit_depth = reader.get_u16_le_err()?;
        let plane_count = reader.get_u16_le_err()?;
        let color_count = reader.get_u32_le_err()?;
        let grayscale = reader.read_u8_err()?;
        let total_image_size = reader.get_u32_le_err()?;
        let active_layer = reader.get_i32_le_err()?;
        let layer_count = reader.get_u16_le_err()?;

        let mut graphic_contents = GraphicContents::empty();

        if let Some(chunk_size) = chunk_size {
            graphic_contents = GraphicContents::from_bits_retain(reader.get_u32_le_err()?);

            let consumed = reader.position() - start;
            reader.skip((chunk_size as usize).saturating_sub(consumed))?;
        }

        trace!("Image width: {width}, height: {height}");
        trace!("Bit depth: {bit_depth}, compression: {compression:?}");
        trace!("Layer count: {layer_count}, graphic contents: {graphic_contents:?}");

        Ok(ImageAttributes {
            width,
            height,
            resolution,
            resolution_unit,
            compression,
            bit_depth,
            plane_count,
            color_count,
            grayscale,
            total_image_size,
            active_layer,
            layer_count,
            graphic_contents
        })
    }

    /// Write the complete attributes block
    pub fn write(&self, writer: &mut ByteWriter, version: FormatVersion) -> Result<(), PspEncodeErrors> {
        let framing = version.framing();

        write_block_start(
            writer,
            BlockId::ImageAttributes as u16,
            framing,
            LEGACY_ATTRIBUTES_SIZE
        );
        match framing {
            Framing::Modern => {
                writer.write_u32_le(MODERN_ATTRIBUTES_SIZE);
                writer.write_u32_le(MODERN_ATTRIBUTES_SIZE);
            }
            Framing::Legacy => writer.write_u32_le(LEGACY_ATTRIBUTES_SIZE)
        }
        writer.write_i32_le(self.width);
        writer.write_i32_le(self.height);
        writer.write_f64_le(self.resolution);
        writer.write_u8(self.resolution_unit as u8);
        writer.write_u16_le(self.compression as u16);
        writer.write_u16_le(self.bit_depth);
        writer.write_u16_le(self.plane_count);
        writer.write_u32_le(self.color_count);
        writer.write_u8(self.grayscale);
        writer.write_u32_le(self.total_image_size);
        writer.write_i32_le(self.active_layer);
        writer.write_u16_le(self.layer_count);

        if framing == Framing::Modern {
            writer.write_u32_le(self.graphic_contents.bits());
        }
        Ok(())
    }
}
