/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Paint Shop Pro file encoding
use std::io::Write;

use log::{debug, trace};

use crate::attributes::ImageAttributes;
use crate::bytestream::ByteWriter;
use crate::channel::EncodedChannel;
use crate::composite::{
    encode_jpeg_thumbnail, encode_planes, write_composite_bank, write_thumbnail_block,
    EncodedComposite, LEGACY_THUMBNAIL_MAX_EDGE
};
use crate::constants::{
    ChannelType, Compression, DibType, GraphicContents, ResolutionMetric, PSP_MAJOR_VERSION_5,
    PSP_MAJOR_VERSION_7, PSP_SIGNATURE
};
use crate::creator::{unix_timestamp, CreatorMetadata};
use crate::document::{PspDocument, ResolutionUnit};
use crate::errors::PspEncodeErrors;
use crate::layer::{write_layer_block, EncodedBitmap, LayerInfo, LayerRecord, Rect};
use crate::pixels::split_planes;
use crate::render::{fit_dimensions, flatten, resize_rgba};
use crate::version::{FormatVersion, Framing};

/// Options for the encoder
///
/// # Example
/// ```
/// use zune_psp::constants::Compression;
/// use zune_psp::PspEncoderOptions;
///
/// let options = PspEncoderOptions::default()
///     .set_version(4)
///     .set_compression(Compression::RLE);
/// ```
#[derive(Debug, Copy, Clone)]
pub struct PspEncoderOptions {
    version:      FormatVersion,
    compression:  Compression,
    jpeg_quality: u8
}

impl Default for PspEncoderOptions {
    fn default() -> Self {
        PspEncoderOptions {
            version:      FormatVersion::new(PSP_MAJOR_VERSION_7, 0),
            compression:  Compression::LZ77,
            jpeg_quality: 75
        }
    }
}

impl PspEncoderOptions {
    /// Set the major version to write
    ///
    /// 3 writes Paint Shop Pro 5 files, 4 and 5 write Paint Shop Pro 6 and 7 files.
    /// Other versions are rejected when encoding.
    pub fn set_version(mut self, major: u16) -> Self {
        self.version = FormatVersion::new(major, 0);
        self
    }

    /// Set the compression of layer and composite channels
    ///
    /// JPEG is rejected when encoding.
    pub fn set_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Quality of the JPEG thumbnail of modern files, clamped to 1..=100
    pub fn set_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub const fn version(&self) -> FormatVersion {
        self.version
    }

    pub const fn compression(&self) -> Compression {
        self.compression
    }

    pub const fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }
}

/// Reports the share of channels written so far
struct Progress<'p, 'a> {
    callback: Option<&'p mut (dyn FnMut(u32) + 'a)>,
    done:     u32,
    total:    u32
}

impl Progress<'_, '_> {
    fn step(&mut self) {
        self.done += 1;

        if let Some(callback) = self.callback.as_deref_mut() {
            let percent = if self.total == 0 {
                100
            } else {
                (100 * self.done / self.total).min(100)
            };
            callback(percent);
        }
    }
}

/// What the encoder learned about a layer before writing it
struct LayerPlan {
    save_rect: Rect,
    has_alpha: bool
}

impl LayerPlan {
    fn channel_count(&self) -> u32 {
        match (self.save_rect.is_empty(), self.has_alpha) {
            (true, _) => 0,
            (false, false) => 3,
            (false, true) => 4
        }
    }
}

/// A Paint Shop Pro image encoder
///
/// Writes every layer of a [`PspDocument`] as a 24 bit raster layer, along
/// with a composite or thumbnail preview and the creator metadata.
///
/// # Example
/// ```
/// use zune_psp::{PspDocument, PspEncoder, PspEncoderOptions, PspLayer};
///
/// let mut document = PspDocument::new(16, 16);
/// let mut layer = PspLayer::new("Background", 16, 16);
/// layer.set_pixel(3, 4, [255, 0, 0, 255]);
/// document.layers.push(layer);
///
/// let mut encoder = PspEncoder::new(&document, PspEncoderOptions::default());
/// let bytes = encoder.encode().unwrap();
/// assert!(bytes.starts_with(b"Paint Shop Pro Image File"));
/// ```
pub struct PspEncoder<'a> {
    document: &'a PspDocument,
    options:  PspEncoderOptions,
    progress: Option<Box<dyn FnMut(u32) + 'a>>
}

impl<'a> PspEncoder<'a> {
    pub fn new(document: &'a PspDocument, options: PspEncoderOptions) -> PspEncoder<'a> {
        PspEncoder {
            document,
            options,
            progress: None
        }
    }

    /// Register a callback receiving the percentage of channels written,
    /// it is called once per channel
    pub fn set_progress_callback<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut(u32) + 'a
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Encode the document and write it to `sink`
    ///
    /// # Returns
    /// The number of bytes written
    pub fn encode_to<W: Write>(&mut self, mut sink: W) -> Result<usize, PspEncodeErrors> {
        let bytes = self.encode()?;
        sink.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Encode the document into a new buffer
    pub fn encode(&mut self) -> Result<Vec<u8>, PspEncodeErrors> {
        let document = self.document;
        let version = self.options.version;
        let compression = self.options.compression;

        self.validate()?;

        let width = document.width;
        let height = document.height;

        let plans: Vec<LayerPlan> = document
            .layers
            .iter()
            .map(|layer| {
                let save_rect = layer.save_rectangle();
                let has_alpha = !save_rect.is_empty() && layer.has_transparency(save_rect);
                LayerPlan {
                    save_rect,
                    has_alpha
                }
            })
            .collect();

        let flat = plans.iter().all(|x| !x.has_alpha);

        let mut attributes = ImageAttributes::new(
            width as i32,
            height as i32,
            compression,
            document.layers.len() as u16
        );
        if let Some(resolution) = document.resolution {
            attributes.resolution = resolution.value;
            attributes.resolution_unit = match resolution.unit {
                ResolutionUnit::Inch => ResolutionMetric::Inch,
                ResolutionUnit::Centimeter => ResolutionMetric::Centimeter
            };
        }
        if flat {
            attributes.graphic_contents |= GraphicContents::FLAT_IMAGE;
        }

        // the merged image decides the composite channel count
        let (preview, composite_alpha) = match version.framing() {
            Framing::Modern => {
                let merged = flatten(&document.layers, width, height, [0, 0, 0, 0]);
                let has_alpha = merged.chunks_exact(4).any(|x| x[3] < 255);
                (merged, has_alpha)
            }
            Framing::Legacy => {
                let merged = flatten(&document.layers, width, height, [255, 255, 255, 255]);
                (merged, false)
            }
        };
        let composite_channels = if composite_alpha { 4 } else { 3 };

        let mut progress = Progress {
            callback: self.progress.as_deref_mut(),
            done:     0,
            total:    plans.iter().map(LayerPlan::channel_count).sum::<u32>() + composite_channels
        };

        let mut writer = ByteWriter::with_capacity(width * height * 4 + 1024);

        if !version.is_legacy() {
            attributes.graphic_contents |= GraphicContents::COMPOSITE | GraphicContents::THUMBNAIL;

            if composite_alpha {
                attributes.graphic_contents |= GraphicContents::COMPOSITE_TRANSPARENCY;
            }
        }

        writer.write_all(&PSP_SIGNATURE);
        writer.write_u16_le(version.major);
        writer.write_u16_le(version.minor);

        attributes.write(&mut writer, version)?;

        let creator = document.creator().unwrap_or_else(CreatorMetadata::new);
        creator.write(&mut writer, version, unix_timestamp())?;

        match version.framing() {
            Framing::Modern => {
                let channels = encode_planes(
                    &preview,
                    width,
                    height,
                    composite_alpha,
                    compression,
                    Framing::Modern,
                    || progress.step()
                )?;
                let (thumbnail_width, thumbnail_height, jpeg) =
                    encode_jpeg_thumbnail(&preview, width, height, self.options.jpeg_quality)?;

                trace!("JPEG thumbnail {thumbnail_width}x{thumbnail_height}, {} bytes", jpeg.len());

                let composite = EncodedComposite {
                    width: width as i32,
                    height: height as i32,
                    compression,
                    thumbnail_width: thumbnail_width as i32,
                    thumbnail_height: thumbnail_height as i32,
                    jpeg,
                    bitmap_count: if composite_alpha { 2 } else { 1 },
                    channels
                };
                write_composite_bank(&mut writer, &composite)?;
            }
            Framing::Legacy => {
                let (thumb_width, thumb_height) =
                    fit_dimensions(width, height, LEGACY_THUMBNAIL_MAX_EDGE);
                let fitted = resize_rgba(&preview, width, height, thumb_width, thumb_height);

                let channels = encode_planes(
                    &fitted,
                    thumb_width,
                    thumb_height,
                    false,
                    Compression::LZ77,
                    Framing::Legacy,
                    || progress.step()
                )?;
                write_thumbnail_block(
                    &mut writer,
                    thumb_width as i32,
                    thumb_height as i32,
                    Compression::LZ77,
                    &channels
                )?;
            }
        }

        let canvas = Rect::new(0, 0, width as i32, height as i32);
        let mut records = Vec::with_capacity(document.layers.len());

        for (layer, plan) in document.layers.iter().zip(&plans) {
            let mut info = LayerInfo::new_raster(
                &layer.name,
                canvas,
                plan.save_rect,
                layer.opacity,
                layer.blend_mode,
                layer.visible
            );
            let planes = split_planes(layer.pixels(), width, plan.save_rect, plan.has_alpha);
            let channel_types = [
                ChannelType::Red,
                ChannelType::Green,
                ChannelType::Blue,
                ChannelType::Composite
            ];
            let mut channels = Vec::with_capacity(planes.len());

            for (i, (plane, channel_type)) in planes.iter().zip(channel_types).enumerate() {
                let bitmap_type = if i < 3 {
                    DibType::Image
                } else {
                    DibType::TransparencyMask
                };
                channels.push(EncodedChannel::compress(
                    plane,
                    compression,
                    bitmap_type,
                    channel_type
                )?);

                if !plan.save_rect.is_empty() {
                    progress.step();
                }
            }
            let bitmap_count = if plan.has_alpha { 2 } else { 1 };

            if version.is_legacy() {
                info.legacy_bitmap_count = bitmap_count;
                info.legacy_channel_count = channels.len() as u16;
            }
            debug!(
                "Layer {:?}, save rect {:?}, {} channels",
                layer.name,
                plan.save_rect,
                channels.len()
            );
            records.push(LayerRecord {
                info,
                bitmap: EncodedBitmap {
                    bitmap_count,
                    channels
                }
            });
        }
        write_layer_block(&mut writer, &records, version)?;

        Ok(writer.into_inner())
    }

    /// Everything that can be rejected before a byte is produced
    fn validate(&self) -> Result<(), PspEncodeErrors> {
        let document = self.document;
        let version = self.options.version;

        if !(PSP_MAJOR_VERSION_5..=PSP_MAJOR_VERSION_7).contains(&version.major) {
            return Err(PspEncodeErrors::UnsupportedVersion(version.major));
        }
        if self.options.compression == Compression::JPEG {
            return Err(PspEncodeErrors::UnsupportedCompression(
                self.options.compression
            ));
        }
        if document.layers.is_empty() {
            return Err(PspEncodeErrors::NoLayers);
        }
        if let Some(limit) = version.max_layers() {
            if document.layers.len() > limit {
                return Err(PspEncodeErrors::TooManyLayers {
                    limit,
                    found: document.layers.len()
                });
            }
        }
        for dimension in [document.width, document.height] {
            if i32::try_from(dimension).is_err() {
                return Err(PspEncodeErrors::TooLargeDimensions(dimension));
            }
        }
        if document.width == 0 || document.height == 0 {
            return Err(PspEncodeErrors::Generic("Cannot encode an empty canvas"));
        }
        for (index, layer) in document.layers.iter().enumerate() {
            if layer.width() != document.width || layer.height() != document.height {
                return Err(PspEncodeErrors::LayerDimensionMismatch {
                    layer:    index,
                    expected: (document.width, document.height),
                    found:    (layer.width(), layer.height())
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PspLayer;

    fn document(layers: usize) -> PspDocument {
        let mut document = PspDocument::new(4, 4);
        for i in 0..layers {
            document.layers.push(PspLayer::new(&format!("Layer {i}"), 4, 4));
        }
        document
    }

    #[test]
    fn options_builder() {
        let options = PspEncoderOptions::default()
            .set_version(3)
            .set_compression(Compression::RLE)
            .set_jpeg_quality(0);

        assert_eq!(options.version().major, 3);
        assert_eq!(options.compression(), Compression::RLE);
        assert_eq!(options.jpeg_quality(), 1);
        assert_eq!(PspEncoderOptions::default().set_jpeg_quality(200).jpeg_quality(), 100);
    }

    #[test]
    fn layer_limits() {
        let legacy = PspEncoderOptions::default().set_version(3);

        let doc = document(64);
        assert!(PspEncoder::new(&doc, legacy).encode().is_ok());

        let doc = document(65);
        let result = PspEncoder::new(&doc, legacy).encode();
        assert!(matches!(
            result,
            Err(PspEncodeErrors::TooManyLayers { limit: 64, found: 65 })
        ));

        let doc = document(101);
        let result = PspEncoder::new(&doc, PspEncoderOptions::default()).encode();
        assert!(matches!(
            result,
            Err(PspEncodeErrors::TooManyLayers { limit: 100, .. })
        ));
    }

    #[test]
    fn rejected_options() {
        let doc = document(1);

        let result = PspEncoder::new(&doc, PspEncoderOptions::default().set_version(6)).encode();
        assert!(matches!(result, Err(PspEncodeErrors::UnsupportedVersion(6))));

        let options = PspEncoderOptions::default().set_compression(Compression::JPEG);
        let result = PspEncoder::new(&doc, options).encode();
        assert!(matches!(
            result,
            Err(PspEncodeErrors::UnsupportedCompression(Compression::JPEG))
        ));
    }

    #[test]
    fn layer_size_must_match() {
        let mut doc = document(1);
        doc.layers.push(PspLayer::new("small", 2, 4));

        let result = PspEncoder::new(&doc, PspEncoderOptions::default()).encode();
        assert!(matches!(
            result,
            Err(PspEncodeErrors::LayerDimensionMismatch { layer: 1, .. })
        ));
    }

    #[test]
    fn empty_document_is_rejected() {
        let doc = document(0);

        for major in [3, 5] {
            let options = PspEncoderOptions::default().set_version(major);
            let result = PspEncoder::new(&doc, options).encode();
            assert!(matches!(result, Err(PspEncodeErrors::NoLayers)));
        }
    }

    #[test]
    fn progress_reaches_100() {
        let mut doc = document(2);
        doc.layers[0].set_pixel(0, 0, [1, 2, 3, 255]);
        doc.layers[1].set_pixel(1, 1, [1, 2, 3, 100]);

        let mut reports = Vec::new();
        {
            let mut encoder = PspEncoder::new(&doc, PspEncoderOptions::default());
            encoder.set_progress_callback(|x| reports.push(x));
            encoder.encode().unwrap();
        }
        // 3 + 4 layer channels and 4 composite channels
        assert_eq!(reports.len(), 11);
        assert_eq!(reports.last(), Some(&100));
        assert!(reports.windows(2).all(|x| x[0] <= x[1]));
    }

    #[test]
    fn encode_to_writer() {
        let doc = document(1);
        let mut sink = Vec::new();
        let written = PspEncoder::new(&doc, PspEncoderOptions::default())
            .encode_to(&mut sink)
            .unwrap();
        assert_eq!(written, sink.len());
        assert_eq!(&sink[..PSP_SIGNATURE.len()], &PSP_SIGNATURE);
    }
}
