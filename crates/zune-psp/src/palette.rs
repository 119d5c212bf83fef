/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Color palette block
use log::trace;

use crate::block::write_block_start;
use crate::bytestream::{ByteReader, ByteWriter};
use crate::constants::BlockId;
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::version::{FormatVersion, Framing};

const PALETTE_CHUNK_SIZE: u32 = 8;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PaletteEntry {
    pub red:      u8,
    pub green:    u8,
    pub blue:     u8,
    pub reserved: u8
}

impl PaletteEntry {
    pub const fn new(red: u8, green: u8, blue: u8) -> PaletteEntry {
        PaletteEntry {
            red,
            green,
            blue,
            reserved: 0
        }
    }
}

/// An ordered color table, entry positions are the pixel indices
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ColorPalette {
    pub entries: Vec<PaletteEntry>
}

impl ColorPalette {
    pub fn new(entries: Vec<PaletteEntry>) -> ColorPalette {
        ColorPalette { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PaletteEntry> {
        self.entries.get(index)
    }

    /// Read a palette body, the cursor must be past the block header
    pub fn read(reader: &mut ByteReader, version: FormatVersion) -> Result<ColorPalette, PspDecodeErrors> {
        let start = reader.position();

        let chunk_size = match version.framing() {
            Framing::Modern => Some(reader.get_u32_le_err()?),
            Framing::Legacy => None
        };
        let count = reader.get_u32_le_err()? as usize;

        if let Some(chunk_size) = chunk_size {
            let consumed = reader.position() - start;
            reader.skip((chunk_size as usize).saturating_sub(consumed))?;
        }
        let entries = reader
            .read_bytes(count.saturating_mul(4))?
            .chunks_exact(4)
            .map(|x| PaletteEntry {
                red:      x[0],
                green:    x[1],
                blue:     x[2],
                reserved: x[3]
            })
            .collect();

        trace!("Palette with {count} entries");

        Ok(ColorPalette { entries })
    }

    /// Write a complete palette block
    pub fn write(&self, writer: &mut ByteWriter, version: FormatVersion) -> Result<(), PspEncodeErrors> {
        let framing = version.framing();
        let count = u32::try_from(self.entries.len())
            .map_err(|_| PspEncodeErrors::BlockTooLarge(self.entries.len()))?;

        write_block_start(writer, BlockId::ColorPalette as u16, framing, 4);

        writer.write_length_scoped(|w| {
            if framing == Framing::Modern {
                w.write_u32_le(PALETTE_CHUNK_SIZE);
            }
            w.write_u32_le(count);

            for entry in &self.entries {
                w.write_all(&[entry.red, entry.green, entry.blue, entry.reserved]);
            }
            Ok(())
        })?;

        Ok(())
    }
}
