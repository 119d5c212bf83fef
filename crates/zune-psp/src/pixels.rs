/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Pixel reconstruction
//!
//! Turns the channel planes of a bitmap into RGBA pixels and back.
//! Decoding handles 1, 4 and 8 bit palette images and 24 and 48 bit
//! RGB images, encoding always produces 8 bit RGB planes with an
//! optional alpha plane.
use log::warn;

use crate::channel::ChannelSubBlock;
use crate::constants::ChannelType;
use crate::errors::PspDecodeErrors;
use crate::layer::Rect;
use crate::palette::{ColorPalette, PaletteEntry};

/// Everything needed to rebuild the pixels of one bitmap
pub struct PixelSource<'a> {
    pub width:              usize,
    pub height:             usize,
    pub bit_depth:          u16,
    /// 1 for opaque bitmaps, 2 when a transparency mask is present
    pub bitmap_count:       u16,
    pub channels:           &'a [ChannelSubBlock],
    pub palette:            Option<&'a ColorPalette>,
    pub transparency_index: Option<usize>,
    pub strict:             bool,
    /// Offset of the owning block, used in errors
    pub offset:             usize
}

/// Scale a 16 bit sample to 8 bits, truncating
#[inline]
pub const fn scale16(sample: u16) -> u8 {
    ((sample as u32 * 255) / 65535) as u8
}

/// Bytes in one row of a bitmap with `bits` bits per pixel
#[inline]
pub const fn packed_stride(width: usize, bits: usize) -> usize {
    (width * bits + 7) / 8
}

/// Expand a 1 or 4 bit plane into one palette index per byte
///
/// 4 bit rows hold the even column in the high nibble, 1 bit rows
/// are most significant bit first. Every row starts on a byte boundary.
pub fn expand_packed(
    plane: &[u8], width: usize, height: usize, bits: u16, offset: usize
) -> Result<Vec<u8>, PspDecodeErrors> {
    let stride = packed_stride(width, usize::from(bits));

    if plane.len() < stride * height {
        return Err(PspDecodeErrors::CorruptBlock {
            offset,
            reason: "packed plane is smaller than its bitmap"
        });
    }
    let mut output = vec![0_u8; width * height];

    if width == 0 {
        return Ok(output);
    }

    for (row, out) in plane
        .chunks_exact(stride)
        .zip(output.chunks_exact_mut(width))
    {
        match bits {
            4 => {
                for (x, pix) in out.iter_mut().enumerate() {
                    let byte = row[x >> 1];
                    *pix = if x & 1 == 0 { byte >> 4 } else { byte & 0x0F };
                }
            }
            1 => {
                for (x, pix) in out.iter_mut().enumerate() {
                    let byte = row[x >> 3];
                    *pix = (byte >> (7 - (x & 7))) & 1;
                }
            }
            _ => return Err(PspDecodeErrors::UnsupportedBitDepth(bits))
        }
    }
    Ok(output)
}

/// Looks up palette entries, tolerating or rejecting missing ones
struct PaletteLookup<'a> {
    palette: &'a ColorPalette,
    strict:  bool,
    warned:  bool
}

impl PaletteLookup<'_> {
    fn get(&mut self, index: u8) -> Result<PaletteEntry, PspDecodeErrors> {
        match self.palette.get(usize::from(index)) {
            Some(entry) => Ok(*entry),
            None if self.strict => Err(PspDecodeErrors::InvalidPaletteIndex(
                usize::from(index),
                self.palette.len()
            )),
            None => {
                if !self.warned {
                    warn!(
                        "Palette index {index} out of range, palette has {} entries, using black",
                        self.palette.len()
                    );
                    self.warned = true;
                }
                Ok(PaletteEntry::default())
            }
        }
    }
}

impl PixelSource<'_> {
    /// Rebuild the bitmap as RGBA, four bytes per pixel, rows top to bottom
    pub fn reconstruct(&self) -> Result<Vec<u8>, PspDecodeErrors> {
        let pixels = self.width * self.height;
        let initial_alpha = if self.bitmap_count == 1 { 255 } else { 0 };

        let mut output = vec![0_u8; pixels * 4];
        output
            .chunks_exact_mut(4)
            .for_each(|pix| pix[3] = initial_alpha);

        if pixels == 0 {
            return Ok(output);
        }

        match self.bit_depth {
            24 => self.decode_rgb(&mut output)?,
            48 => self.decode_rgb16(&mut output)?,
            8 => self.decode_indexed(&mut output)?,
            4 | 1 => self.decode_packed(&mut output)?,
            depth => return Err(PspDecodeErrors::UnsupportedBitDepth(depth))
        }
        Ok(output)
    }

    fn plane<'b>(&self, channel: &'b ChannelSubBlock, length: usize) -> Result<&'b [u8], PspDecodeErrors> {
        channel
            .data
            .get(..length)
            .ok_or(PspDecodeErrors::CorruptBlock {
                offset: self.offset,
                reason: "channel data is smaller than the save rectangle"
            })
    }

    fn lookup(&self) -> Result<PaletteLookup<'_>, PspDecodeErrors> {
        let palette = self.palette.ok_or(PspDecodeErrors::ColorPaletteNotFound)?;

        Ok(PaletteLookup {
            palette,
            strict: self.strict,
            warned: false
        })
    }

    fn decode_rgb(&self, output: &mut [u8]) -> Result<(), PspDecodeErrors> {
        let pixels = self.width * self.height;

        for channel in self.channels {
            let component = if channel.bitmap_type.is_color() {
                match channel.channel_type {
                    ChannelType::Red => 0,
                    ChannelType::Green => 1,
                    ChannelType::Blue => 2,
                    ChannelType::Composite => continue
                }
            } else if channel.bitmap_type.is_transparency_mask() {
                3
            } else {
                continue;
            };
            let plane = self.plane(channel, pixels)?;

            for (pix, value) in output.chunks_exact_mut(4).zip(plane) {
                pix[component] = *value;
            }
        }
        Ok(())
    }

    fn decode_rgb16(&self, output: &mut [u8]) -> Result<(), PspDecodeErrors> {
        let pixels = self.width * self.height;

        for channel in self.channels {
            if channel.bitmap_type.is_color() {
                let component = match channel.channel_type {
                    ChannelType::Red => 0,
                    ChannelType::Green => 1,
                    ChannelType::Blue => 2,
                    ChannelType::Composite => continue
                };
                let plane = self.plane(channel, pixels * 2)?;

                for (pix, sample) in output.chunks_exact_mut(4).zip(plane.chunks_exact(2)) {
                    pix[component] = scale16(u16::from_le_bytes([sample[0], sample[1]]));
                }
            } else if channel.bitmap_type.is_transparency_mask() {
                // masks stay one byte per pixel at this depth
                let plane = self.plane(channel, pixels)?;

                for (pix, value) in output.chunks_exact_mut(4).zip(plane) {
                    pix[3] = *value;
                }
            }
        }
        Ok(())
    }

    fn decode_indexed(&self, output: &mut [u8]) -> Result<(), PspDecodeErrors> {
        let pixels = self.width * self.height;
        let mut lookup = self.lookup()?;

        for channel in self.channels {
            let is_color = channel.bitmap_type.is_color();

            if !is_color && !channel.bitmap_type.is_transparency_mask() {
                continue;
            }
            let plane = self.plane(channel, pixels)?;

            for (pix, index) in output.chunks_exact_mut(4).zip(plane) {
                let entry = lookup.get(*index)?;

                if is_color {
                    pix[0] = entry.red;
                    pix[1] = entry.green;
                    pix[2] = entry.blue;

                    if self.transparency_index == Some(usize::from(*index)) {
                        pix[3] = 0;
                    }
                } else {
                    // the mask byte indexes the palette and its red component is the alpha
                    pix[3] = entry.red;
                }
            }
        }
        Ok(())
    }

    fn decode_packed(&self, output: &mut [u8]) -> Result<(), PspDecodeErrors> {
        let pixels = self.width * self.height;
        let mut lookup = self.lookup()?;

        let image = self.channels.first().ok_or(PspDecodeErrors::CorruptBlock {
            offset: self.offset,
            reason: "bitmap has no channels"
        })?;
        let indices = expand_packed(
            &image.data,
            self.width,
            self.height,
            self.bit_depth,
            self.offset
        )?;

        let mask = match self.channels.get(1) {
            Some(channel)
                if self.bitmap_count == 2 && channel.bitmap_type.is_transparency_mask() =>
            {
                Some(self.plane(channel, pixels)?)
            }
            _ => None
        };

        for (i, (pix, index)) in output.chunks_exact_mut(4).zip(&indices).enumerate() {
            let entry = lookup.get(*index)?;

            pix[0] = entry.red;
            pix[1] = entry.green;
            pix[2] = entry.blue;

            if self.transparency_index == Some(usize::from(*index)) {
                pix[3] = 0;
            } else if let Some(mask) = mask {
                pix[3] = mask[i];
            }
        }
        Ok(())
    }
}

/// Whether any pixel inside `rect` of an RGBA canvas `canvas_width` wide
/// is not fully opaque
pub fn has_transparency(rgba: &[u8], canvas_width: usize, rect: Rect) -> bool {
    rect_rows(rgba, canvas_width, rect).any(|row| row.chunks_exact(4).any(|pix| pix[3] < 255))
}

/// Split the pixels inside `rect` into R, G, B and, when `with_alpha`,
/// A planes of `rect.width() * rect.height()` bytes each
pub fn split_planes(rgba: &[u8], canvas_width: usize, rect: Rect, with_alpha: bool) -> Vec<Vec<u8>> {
    let channel_count = if with_alpha { 4 } else { 3 };
    let size = rect.width() * rect.height();

    let mut planes = vec![Vec::with_capacity(size); channel_count];

    for row in rect_rows(rgba, canvas_width, rect) {
        for pix in row.chunks_exact(4) {
            for (plane, value) in planes.iter_mut().zip(pix) {
                plane.push(*value);
            }
        }
    }
    planes
}

fn rect_rows(rgba: &[u8], canvas_width: usize, rect: Rect) -> impl Iterator<Item = &[u8]> {
    let row_bytes = canvas_width * 4;
    let start = rect.left as usize * 4;
    let end = start + rect.width() * 4;

    (rect.top as usize..rect.bottom as usize)
        .filter_map(move |y| rgba.get(y * row_bytes + start..y * row_bytes + end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DibType;

    fn channel(bitmap_type: DibType, channel_type: ChannelType, data: Vec<u8>) -> ChannelSubBlock {
        ChannelSubBlock {
            compressed_length: data.len() as u32,
            uncompressed_length: data.len() as u32,
            bitmap_type,
            channel_type,
            data
        }
    }

    fn source<'a>(
        width: usize, height: usize, bit_depth: u16, bitmap_count: u16,
        channels: &'a [ChannelSubBlock], palette: Option<&'a ColorPalette>
    ) -> PixelSource<'a> {
        PixelSource {
            width,
            height,
            bit_depth,
            bitmap_count,
            channels,
            palette,
            transparency_index: None,
            strict: false,
            offset: 0
        }
    }

    fn ramp(count: usize) -> ColorPalette {
        ColorPalette::new(
            (0..count)
                .map(|x| PaletteEntry::new(x as u8 * 10, x as u8 * 20, x as u8 * 30))
                .collect()
        )
    }

    #[test]
    fn sixteen_bit_scaling() {
        assert_eq!(scale16(65535), 255);
        assert_eq!(scale16(0), 0);
        assert_eq!(scale16(32768), 127);
    }

    #[test]
    fn one_bit_expansion() {
        let indices = expand_packed(&[0b1011_0000], 8, 1, 1, 0).unwrap();
        assert_eq!(indices, [1, 0, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn four_bit_expansion() {
        let indices = expand_packed(&[0x3F], 2, 1, 4, 0).unwrap();
        assert_eq!(indices, [0x3, 0xF]);
    }

    #[test]
    fn packed_rows_round_up() {
        // 3 pixels of 4 bits need 2 bytes per row, 10 pixels of 1 bit need 2
        assert_eq!(packed_stride(3, 4), 2);
        assert_eq!(packed_stride(10, 1), 2);

        let plane = [0x12, 0x30, 0x45, 0x60];
        let indices = expand_packed(&plane, 3, 2, 4, 0).unwrap();
        assert_eq!(indices, [1, 2, 3, 4, 5, 6]);

        assert!(expand_packed(&plane[..3], 3, 2, 4, 0).is_err());
    }

    #[test]
    fn rgb_with_mask() {
        let channels = [
            channel(DibType::Image, ChannelType::Red, vec![1, 2]),
            channel(DibType::Image, ChannelType::Green, vec![3, 4]),
            channel(DibType::Image, ChannelType::Blue, vec![5, 6]),
            channel(DibType::TransparencyMask, ChannelType::Composite, vec![7, 8])
        ];
        let rgba = source(2, 1, 24, 2, &channels, None).reconstruct().unwrap();
        assert_eq!(rgba, [1, 3, 5, 7, 2, 4, 6, 8]);

        let rgba = source(2, 1, 24, 1, &channels[..3], None)
            .reconstruct()
            .unwrap();
        assert_eq!(rgba, [1, 3, 5, 255, 2, 4, 6, 255]);
    }

    #[test]
    fn sixteen_bit_planes() {
        let red = [0xFF, 0xFF, 0x00, 0x80];
        let channels = [
            channel(DibType::Image, ChannelType::Red, red.to_vec()),
            channel(DibType::Image, ChannelType::Green, vec![0; 4]),
            channel(DibType::Image, ChannelType::Blue, vec![0; 4]),
            channel(DibType::TransparencyMask, ChannelType::Composite, vec![9, 10])
        ];
        let rgba = source(2, 1, 48, 2, &channels, None).reconstruct().unwrap();
        assert_eq!(rgba, [255, 0, 0, 9, 127, 0, 0, 10]);
    }

    #[test]
    fn transparency_index_clears_alpha() {
        let palette = ramp(8);
        let plane = vec![3, 1, 3, 7];
        let channels = [channel(DibType::Image, ChannelType::Composite, plane)];

        let mut src = source(4, 1, 8, 1, &channels, Some(&palette));
        src.transparency_index = Some(3);
        let rgba = src.reconstruct().unwrap();

        let alpha: Vec<u8> = rgba.chunks_exact(4).map(|x| x[3]).collect();
        assert_eq!(alpha, [0, 255, 0, 255]);
        assert_eq!(&rgba[4..7], &[10, 20, 30]);
    }

    #[test]
    fn indexed_mask_reads_red_of_entry() {
        let palette = ramp(8);
        let channels = [
            channel(DibType::Image, ChannelType::Composite, vec![1, 2]),
            channel(DibType::TransparencyMask, ChannelType::Composite, vec![5, 0])
        ];
        let rgba = source(2, 1, 8, 2, &channels, Some(&palette))
            .reconstruct()
            .unwrap();
        assert_eq!(rgba[3], 50);
        assert_eq!(rgba[7], 0);
    }

    #[test]
    fn packed_mask_is_direct_alpha() {
        let palette = ramp(2);
        let channels = [
            channel(DibType::Image, ChannelType::Composite, vec![0b0100_0000]),
            channel(DibType::TransparencyMask, ChannelType::Composite, vec![77, 200])
        ];
        let rgba = source(2, 1, 1, 2, &channels, Some(&palette))
            .reconstruct()
            .unwrap();
        assert_eq!(rgba, [0, 0, 0, 77, 10, 20, 30, 200]);
    }

    #[test]
    fn missing_palette_entry() {
        let palette = ramp(2);
        let channels = [channel(DibType::Image, ChannelType::Composite, vec![1, 9])];

        let rgba = source(2, 1, 8, 1, &channels, Some(&palette))
            .reconstruct()
            .unwrap();
        assert_eq!(&rgba[4..], &[0, 0, 0, 255]);

        let mut strict = source(2, 1, 8, 1, &channels, Some(&palette));
        strict.strict = true;
        assert!(matches!(
            strict.reconstruct(),
            Err(PspDecodeErrors::InvalidPaletteIndex(9, 2))
        ));
    }

    #[test]
    fn short_plane_is_corrupt() {
        let channels = [channel(DibType::Image, ChannelType::Red, vec![1])];
        let result = source(2, 2, 24, 1, &channels, None).reconstruct();
        assert!(matches!(result, Err(PspDecodeErrors::CorruptBlock { .. })));
    }

    #[test]
    fn other_depths_are_rejected() {
        let result = source(1, 1, 16, 1, &[], None).reconstruct();
        assert!(matches!(result, Err(PspDecodeErrors::UnsupportedBitDepth(16))));
    }

    #[test]
    fn split_inside_rect() {
        // 3x2 canvas, take the right 2x2 block
        let mut rgba = vec![0_u8; 3 * 2 * 4];
        for (i, pix) in rgba.chunks_exact_mut(4).enumerate() {
            pix.copy_from_slice(&[i as u8, 10 + i as u8, 20 + i as u8, 255]);
        }
        rgba[4 * 5 + 3] = 128;

        let rect = Rect::new(1, 0, 3, 2);
        assert!(has_transparency(&rgba, 3, rect));
        assert!(!has_transparency(&rgba, 3, Rect::new(0, 0, 3, 1)));

        let planes = split_planes(&rgba, 3, rect, true);
        assert_eq!(planes.len(), 4);
        assert_eq!(planes[0], [1, 2, 4, 5]);
        assert_eq!(planes[2], [21, 22, 24, 25]);
        assert_eq!(planes[3], [255, 255, 255, 128]);
    }
}
