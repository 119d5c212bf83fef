/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Paint Shop Pro file decoding
use log::{debug, trace, warn};
use zune_core::bit_depth::BitDepth;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;

use crate::attributes::ImageAttributes;
use crate::block::BlockHeader;
use crate::bytestream::ByteReader;
use crate::composite::{CompositeImageBank, PspPreview, ThumbnailBlock};
use crate::constants::{
    BlockId, ResolutionMetric, PSP_SIGNATURE, PSP_SIGNATURE_CHECK_LENGTH, PSP_V5_THUMBNAIL_BLOCK
};
use crate::creator::{CreatorMetadata, CREATOR_METADATA_KEY};
use crate::document::{PspDocument, PspLayer, Resolution, ResolutionUnit};
use crate::errors::PspDecodeErrors;
use crate::extended::ExtendedData;
use crate::layer::{read_layer_block, RasterLayer, Rect};
use crate::palette::ColorPalette;
use crate::pixels::PixelSource;
use crate::render::flatten;
use crate::version::FormatVersion;

/// A Paint Shop Pro image decoder
///
/// Reads every raster layer of a file into a [`PspDocument`], along with the
/// creator metadata and the previews stored in the file.
///
/// # Example
/// ```no_run
/// use zune_psp::PspDecoder;
///
/// let data = std::fs::read("image.pspimage").unwrap();
/// let mut decoder = PspDecoder::new(&data);
/// let document = decoder.decode().unwrap();
///
/// for layer in &document.layers {
///     println!("{} {}x{}", layer.name, layer.width(), layer.height());
/// }
/// ```
pub struct PspDecoder<'a> {
    data:           &'a [u8],
    options:        DecoderOptions,
    decoded_header: bool,
    version:        Option<FormatVersion>,
    attributes:     Option<ImageAttributes>,
    creator:        Option<CreatorMetadata>,
    palette:        Option<ColorPalette>,
    extended:       Option<ExtendedData>,
    layers:         Vec<RasterLayer>,
    composite:      Option<PspPreview>,
    jpeg_thumbnail: Option<Vec<u8>>,
    thumbnail:      Option<PspPreview>,
    width:          usize,
    height:         usize
}

impl<'a> PspDecoder<'a> {
    /// Create a decoder reading from `data`
    ///
    /// The decoder is lenient, out of range palette indices and missing
    /// layers are tolerated. Use [`new_with_options`](Self::new_with_options)
    /// with strict mode set to turn them into errors.
    pub fn new(data: &'a [u8]) -> PspDecoder<'a> {
        PspDecoder::new_with_options(data, DecoderOptions::default().set_strict_mode(false))
    }

    /// Create a decoder with options that influence decoding
    ///
    /// The maximum width and height bound the document size, strict mode
    /// turns tolerated anomalies into errors.
    pub fn new_with_options(data: &'a [u8], options: DecoderOptions) -> PspDecoder<'a> {
        PspDecoder {
            data,
            options,
            decoded_header: false,
            version: None,
            attributes: None,
            creator: None,
            palette: None,
            extended: None,
            layers: Vec::new(),
            composite: None,
            jpeg_thumbnail: None,
            thumbnail: None,
            width: 0,
            height: 0
        }
    }

    /// Read the signature, the version and every top level block
    ///
    /// Layer pixels are decompressed here but only reconstructed by
    /// [`decode`](Self::decode).
    pub fn decode_headers(&mut self) -> Result<(), PspDecodeErrors> {
        if self.decoded_header {
            return Ok(());
        }
        let strict = self.options.get_strict_mode();
        let mut reader = ByteReader::new(self.data);

        if self.data.len() < PSP_SIGNATURE.len()
            || self.data[..PSP_SIGNATURE_CHECK_LENGTH] != PSP_SIGNATURE[..PSP_SIGNATURE_CHECK_LENGTH]
        {
            return Err(PspDecodeErrors::InvalidSignature);
        }
        reader.skip(PSP_SIGNATURE.len())?;

        let version = FormatVersion::new(reader.get_u16_le_err()?, reader.get_u16_le_err()?);
        let framing = version.framing();

        trace!("Version {}.{}, {framing:?} framing", version.major, version.minor);

        let mut attributes: Option<ImageAttributes> = None;
        let mut layers = None;
        let mut composite_bank = None;
        let mut thumbnail = None;

        while !reader.eof() {
            let header = BlockHeader::read(&mut reader, framing)?;

            match BlockId::from_int(header.id) {
                Some(BlockId::ImageAttributes) => {
                    attributes = Some(ImageAttributes::read(&mut reader, version)?);
                }
                Some(BlockId::Creator) => {
                    self.creator = Some(CreatorMetadata::read(&mut reader, &header)?);
                }
                Some(BlockId::ColorPalette) => {
                    self.palette = Some(ColorPalette::read(&mut reader, version)?);
                }
                Some(BlockId::ExtendedData) => {
                    self.extended = Some(ExtendedData::read(&mut reader, &header)?);
                }
                Some(BlockId::LayerStart) => {
                    let attributes = attributes
                        .as_ref()
                        .ok_or(PspDecodeErrors::MissingBlock("General Image Attributes"))?;

                    layers = Some(read_layer_block(
                        &mut reader,
                        &header,
                        attributes,
                        version,
                        strict
                    )?);
                }
                Some(BlockId::CompositeImageBank) if !version.is_legacy() => {
                    let bank = CompositeImageBank::read(&mut reader, &header, version, strict)?;
                    composite_bank = Some((header.offset, bank));
                }
                _ if header.id == PSP_V5_THUMBNAIL_BLOCK && version.is_legacy() => {
                    let block = ThumbnailBlock::read(&mut reader, &header, strict)?;
                    thumbnail = Some((header.offset, block));
                }
                _ => debug!("Skipping block {} at offset {}", header.id, header.offset)
            }

            if reader.position() > header.body_end() {
                return Err(PspDecodeErrors::CorruptBlock {
                    offset: header.offset,
                    reason: "block data overruns its declared length"
                });
            }
            reader.set_position(header.body_end())?;
        }

        let attributes =
            attributes.ok_or(PspDecodeErrors::MissingBlock("General Image Attributes"))?;
        let layers = layers.ok_or(PspDecodeErrors::MissingBlock("Layer Start"))?;

        if attributes.bit_depth <= 8 && self.palette.is_none() {
            return Err(PspDecodeErrors::ColorPaletteNotFound);
        }

        let (width, height) = document_size(&attributes, &layers);

        if width <= 0 || height <= 0 {
            return Err(PspDecodeErrors::InvalidDimensions(width, height));
        }
        let (width, height) = (width as usize, height as usize);

        if width > self.options.get_max_width() {
            return Err(PspDecodeErrors::LargeDimensions(
                self.options.get_max_width(),
                width
            ));
        }
        if height > self.options.get_max_height() {
            return Err(PspDecodeErrors::LargeDimensions(
                self.options.get_max_height(),
                height
            ));
        }

        let transparency_index = self.transparency_index_for(&attributes);

        if let Some((offset, bank)) = composite_bank {
            match bank.decode_composite(transparency_index, strict, offset) {
                Ok(composite) => self.composite = composite,
                Err(err) if !strict => warn!("Ignoring undecodable composite image: {err:?}"),
                Err(err) => return Err(err)
            }
            self.jpeg_thumbnail = bank.jpeg.map(|x| x.data);
        }
        if let Some((offset, block)) = thumbnail {
            match block.decode(strict, offset) {
                Ok(preview) => self.thumbnail = Some(preview),
                Err(err) if !strict => warn!("Ignoring undecodable thumbnail: {err:?}"),
                Err(err) => return Err(err)
            }
        }

        self.version = Some(version);
        self.attributes = Some(attributes);
        self.layers = layers;
        self.width = width;
        self.height = height;
        self.decoded_header = true;

        Ok(())
    }

    /// Decode every raster layer into a document
    pub fn decode(&mut self) -> Result<PspDocument, PspDecodeErrors> {
        self.decode_headers()?;

        let attributes = self
            .attributes
            .as_ref()
            .ok_or(PspDecodeErrors::Generic("Headers not decoded"))?;
        let strict = self.options.get_strict_mode();
        let transparency_index = self.transparency_index_for(attributes);
        let canvas = Rect::new(0, 0, self.width as i32, self.height as i32);

        let mut document = PspDocument::new(self.width, self.height);
        document.resolution = resolution(attributes);

        for layer in &self.layers {
            let info = &layer.info;
            let mut output = PspLayer::new(&info.name, self.width, self.height);

            output.opacity = info.opacity;
            output.blend_mode = info.blend_mode;
            output.visible = info.is_visible();

            if let Some(bitmap) = &layer.bitmap {
                let source = PixelSource {
                    width: info.save_rect.width(),
                    height: info.save_rect.height(),
                    bit_depth: attributes.bit_depth,
                    bitmap_count: bitmap.bitmap_count,
                    channels: &bitmap.channels,
                    palette: self.palette.as_ref(),
                    transparency_index,
                    strict,
                    offset: layer.offset
                };
                let pixels = source.reconstruct()?;

                place(&mut output, &pixels, info.save_rect, canvas);
            }
            document.layers.push(output);
        }

        if let Some(creator) = &self.creator {
            match creator.to_json() {
                Ok(json) => {
                    document
                        .metadata
                        .insert(CREATOR_METADATA_KEY.to_string(), json);
                }
                Err(err) => warn!("Could not store creator metadata: {err}")
            }
        }
        Ok(document)
    }

    /// Decode and flatten the visible layers into RGBA pixels
    ///
    /// Layers are merged with source-over compositing using their opacity,
    /// blend modes are ignored.
    pub fn decode_raw(&mut self) -> Result<Vec<u8>, PspDecodeErrors> {
        let document = self.decode()?;
        Ok(flatten(
            &document.layers,
            document.width,
            document.height,
            [0, 0, 0, 0]
        ))
    }

    /// Format version, available after the headers are decoded
    pub const fn version(&self) -> Option<FormatVersion> {
        self.version
    }

    pub const fn attributes(&self) -> Option<&ImageAttributes> {
        self.attributes.as_ref()
    }

    /// Document width and height, available after the headers are decoded
    pub const fn dimensions(&self) -> Option<(usize, usize)> {
        if !self.decoded_header {
            return None;
        }
        Some((self.width, self.height))
    }

    /// Layers are always returned as RGBA
    pub const fn colorspace(&self) -> ColorSpace {
        ColorSpace::RGBA
    }

    /// Layers are always returned with 8 bits per channel
    pub const fn depth(&self) -> BitDepth {
        BitDepth::Eight
    }

    pub const fn creator(&self) -> Option<&CreatorMetadata> {
        self.creator.as_ref()
    }

    pub const fn palette(&self) -> Option<&ColorPalette> {
        self.palette.as_ref()
    }

    /// The palette index drawn fully transparent
    pub fn transparency_index(&self) -> Option<usize> {
        self.extended.as_ref().and_then(|x| x.transparency_index())
    }

    /// The full size composite of a modern file
    pub const fn composite(&self) -> Option<&PspPreview> {
        self.composite.as_ref()
    }

    /// The JPEG thumbnail stream of a modern file
    pub fn jpeg_thumbnail(&self) -> Option<&[u8]> {
        self.jpeg_thumbnail.as_deref()
    }

    /// The thumbnail of a legacy file
    pub const fn thumbnail(&self) -> Option<&PspPreview> {
        self.thumbnail.as_ref()
    }

    /// The transparency index only applies to palette images
    fn transparency_index_for(&self, attributes: &ImageAttributes) -> Option<usize> {
        if attributes.bit_depth < 24 {
            self.transparency_index()
        } else {
            None
        }
    }
}

/// The canvas size, large enough for the attributes and every saved layer
fn document_size(attributes: &ImageAttributes, layers: &[RasterLayer]) -> (i64, i64) {
    layers.iter().fold(
        (i64::from(attributes.width), i64::from(attributes.height)),
        |(w, h), layer| {
            let rect = layer.info.save_rect;
            (w.max(rect.width() as i64), h.max(rect.height() as i64))
        }
    )
}

fn resolution(attributes: &ImageAttributes) -> Option<Resolution> {
    if attributes.resolution <= 0.0 {
        return None;
    }
    let unit = match attributes.resolution_unit {
        ResolutionMetric::Inch => ResolutionUnit::Inch,
        ResolutionMetric::Centimeter => ResolutionUnit::Centimeter,
        ResolutionMetric::Undefined => return None
    };
    Some(Resolution {
        value: attributes.resolution,
        unit
    })
}

/// Copy the pixels of `save_rect` into the layer, dropping whatever lies off the canvas
fn place(layer: &mut PspLayer, pixels: &[u8], save_rect: Rect, canvas: Rect) {
    let visible = save_rect.intersect(&canvas);

    if visible.is_empty() {
        debug!("Layer {:?} lies outside the canvas", layer.name);
        return;
    }
    if visible != save_rect {
        debug!(
            "Clipping layer {:?} from {save_rect:?} to {visible:?}",
            layer.name
        );
    }
    let canvas_width = layer.width();
    let source_width = save_rect.width();
    let row_bytes = visible.width() * 4;
    let skip_x = (visible.left - save_rect.left) as usize;
    let target = layer.pixels_mut();

    for y in visible.top..visible.bottom {
        let src_row = (y - save_rect.top) as usize;
        let src = (src_row * source_width + skip_x) * 4;
        let dst = (y as usize * canvas_width + visible.left as usize) * 4;

        target[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::write_block;
    use crate::bytestream::ByteWriter;
    use crate::channel::EncodedChannel;
    use crate::constants::{
        BlendMode, ChannelType, Compression, DibType, ExtendedDataId, PSP_X2_LAYER_MARKER_BLOCK
    };
    use crate::extended::write_extended_block;
    use crate::layer::{write_layer_block, EncodedBitmap, LayerInfo, LayerRecord};
    use crate::palette::PaletteEntry;
    use crate::version::Framing;

    struct Synthetic {
        version:    FormatVersion,
        attributes: ImageAttributes,
        palette:    Option<ColorPalette>,
        extended:   Option<Vec<(u16, Vec<u8>)>>
    }

    impl Synthetic {
        fn new(major: u16, width: i32, height: i32, bit_depth: u16) -> Synthetic {
            let mut attributes = ImageAttributes::new(width, height, Compression::LZ77, 1);
            attributes.bit_depth = bit_depth;

            Synthetic {
                version: FormatVersion::new(major, 0),
                attributes,
                palette: None,
                extended: None
            }
        }

        fn header(&self) -> ByteWriter {
            let mut writer = ByteWriter::new();
            writer.write_all(&PSP_SIGNATURE);
            writer.write_u16_le(self.version.major);
            writer.write_u16_le(self.version.minor);

            self.attributes.write(&mut writer, self.version).unwrap();

            if let Some(palette) = &self.palette {
                palette.write(&mut writer, self.version).unwrap();
            }
            if let Some(fields) = &self.extended {
                write_extended_block(&mut writer, self.version, fields);
            }
            writer
        }

        fn file(&self, layers: &[LayerRecord]) -> Vec<u8> {
            let mut writer = self.header();
            write_layer_block(&mut writer, layers, self.version).unwrap();
            writer.into_inner()
        }
    }

    /// A layer whose planes are stored as given, tagged red, green, blue and alpha
    fn layer(save_rect: Rect, planes: &[Vec<u8>], framing: Framing) -> LayerRecord {
        let types = [
            (DibType::Image, ChannelType::Red),
            (DibType::Image, ChannelType::Green),
            (DibType::Image, ChannelType::Blue),
            (DibType::TransparencyMask, ChannelType::Composite)
        ];
        let channels: Vec<EncodedChannel> = planes
            .iter()
            .zip(types)
            .map(|(plane, (bitmap, channel))| {
                EncodedChannel::compress(plane, Compression::LZ77, bitmap, channel).unwrap()
            })
            .collect();

        layer_record(save_rect, channels, framing)
    }

    /// A palette layer with one index plane and an optional mask plane
    fn palette_layer(save_rect: Rect, planes: &[Vec<u8>], framing: Framing) -> LayerRecord {
        let types = [DibType::Image, DibType::TransparencyMask];
        let channels: Vec<EncodedChannel> = planes
            .iter()
            .zip(types)
            .map(|(plane, bitmap)| {
                EncodedChannel::compress(plane, Compression::LZ77, bitmap, ChannelType::Composite)
                    .unwrap()
            })
            .collect();

        layer_record(save_rect, channels, framing)
    }

    fn layer_record(save_rect: Rect, channels: Vec<EncodedChannel>, framing: Framing) -> LayerRecord {
        let bitmap_count = if channels
            .iter()
            .any(|x| x.bitmap_type == DibType::TransparencyMask)
        {
            2
        } else {
            1
        };
        let mut info = LayerInfo::new_raster(
            "synthetic",
            save_rect,
            save_rect,
            255,
            BlendMode::Normal,
            true
        );
        if framing == Framing::Legacy {
            info.legacy_bitmap_count = bitmap_count;
            info.legacy_channel_count = channels.len() as u16;
        }
        LayerRecord {
            info,
            bitmap: EncodedBitmap {
                bitmap_count,
                channels
            }
        }
    }

    fn primaries() -> ColorPalette {
        ColorPalette::new(vec![
            PaletteEntry::new(255, 0, 0),
            PaletteEntry::new(0, 255, 0),
            PaletteEntry::new(0, 0, 255),
            PaletteEntry::new(255, 255, 255)
        ])
    }

    fn pixels(document: &PspDocument) -> Vec<[u8; 4]> {
        document.layers[0]
            .pixels()
            .chunks_exact(4)
            .map(|x| [x[0], x[1], x[2], x[3]])
            .collect()
    }

    #[test]
    fn eight_bit_with_transparent_index() {
        for major in [3, 5] {
            let mut synthetic = Synthetic::new(major, 2, 2, 8);
            synthetic.palette = Some(primaries());

            synthetic.extended = Some(vec![(
                ExtendedDataId::TransparencyIndex as u16,
                1_i16.to_le_bytes().to_vec()
            )]);

            let framing = synthetic.version.framing();
            let bytes = synthetic.file(&[palette_layer(
                Rect::new(0, 0, 2, 2),
                &[vec![0, 1, 2, 1]],
                framing
            )]);

            let mut decoder = PspDecoder::new(&bytes);
            let document = decoder.decode().unwrap();

            assert_eq!(decoder.transparency_index(), Some(1));
            assert_eq!(decoder.palette().map(ColorPalette::len), Some(4));
            assert_eq!(
                pixels(&document),
                [[255, 0, 0, 255], [0, 255, 0, 0], [0, 0, 255, 255], [0, 255, 0, 0]]
            );
        }
    }

    #[test]
    fn eight_bit_mask_uses_palette_red() {
        let mut synthetic = Synthetic::new(5, 2, 1, 8);
        synthetic.palette = Some(ColorPalette::new(vec![
            PaletteEntry::new(10, 20, 30),
            PaletteEntry::new(128, 0, 0)
        ]));
        let bytes = synthetic.file(&[palette_layer(
            Rect::new(0, 0, 2, 1),
            &[vec![0, 0], vec![1, 0]],
            Framing::Modern
        )]);

        let document = PspDecoder::new(&bytes).decode().unwrap();
        assert_eq!(pixels(&document), [[10, 20, 30, 128], [10, 20, 30, 10]]);
    }

    #[test]
    fn packed_palette_depths() {
        // rows are byte aligned
        let four_bit = vec![0x12, 0x30, 0x21, 0x00];
        let one_bit = vec![0b1010_0000, 0b0100_0000];

        for (depth, plane, expected) in [
            (4, four_bit, [1, 2, 3, 2, 1, 0]),
            (1, one_bit, [1, 0, 1, 0, 1, 0])
        ] {
            let mut synthetic = Synthetic::new(3, 3, 2, depth);
            synthetic.palette = Some(primaries());

            let bytes =
                synthetic.file(&[palette_layer(Rect::new(0, 0, 3, 2), &[plane], Framing::Legacy)]);
            let document = PspDecoder::new(&bytes).decode().unwrap();

            let palette = primaries();
            let expected: Vec<[u8; 4]> = expected
                .iter()
                .map(|x| {
                    let entry = palette.get(*x).unwrap();
                    [entry.red, entry.green, entry.blue, 255]
                })
                .collect();
            assert_eq!(pixels(&document), expected, "{depth} bit");
        }
    }

    #[test]
    fn palette_is_required_for_indexed_images() {
        let synthetic = Synthetic::new(5, 1, 1, 8);
        let bytes = synthetic.file(&[palette_layer(Rect::new(0, 0, 1, 1), &[vec![0]], Framing::Modern)]);

        assert!(matches!(
            PspDecoder::new(&bytes).decode(),
            Err(PspDecodeErrors::ColorPaletteNotFound)
        ));
    }

    #[test]
    fn out_of_range_index() {
        let mut synthetic = Synthetic::new(5, 2, 1, 8);
        synthetic.palette = Some(ColorPalette::new(vec![
            PaletteEntry::new(9, 9, 9),
            PaletteEntry::new(7, 7, 7)
        ]));
        let bytes = synthetic.file(&[palette_layer(Rect::new(0, 0, 2, 1), &[vec![1, 5]], Framing::Modern)]);

        let document = PspDecoder::new(&bytes).decode().unwrap();
        assert_eq!(pixels(&document), [[7, 7, 7, 255], [0, 0, 0, 255]]);

        let options = DecoderOptions::default().set_strict_mode(true);
        assert!(matches!(
            PspDecoder::new_with_options(&bytes, options).decode(),
            Err(PspDecodeErrors::InvalidPaletteIndex(5, 2))
        ));
    }

    #[test]
    fn plain_constructor_is_lenient() {
        let mut synthetic = Synthetic::new(5, 1, 1, 8);
        synthetic.palette = Some(ColorPalette::new(vec![PaletteEntry::new(1, 2, 3)]));
        let bytes = synthetic.file(&[palette_layer(Rect::new(0, 0, 1, 1), &[vec![3]], Framing::Modern)]);

        assert!(!PspDecoder::new(&bytes).options.get_strict_mode());
        assert!(PspDecoder::new(&bytes).decode().is_ok());
        // library defaults are strict
        assert!(PspDecoder::new_with_options(&bytes, DecoderOptions::default())
            .decode()
            .is_err());
    }

    #[test]
    fn forty_eight_bit_rgb() {
        let red: Vec<u8> = [0xFFFF_u16, 0x0000].iter().flat_map(|x| x.to_le_bytes()).collect();
        let green: Vec<u8> = [0x8000_u16, 0x0101].iter().flat_map(|x| x.to_le_bytes()).collect();
        let blue: Vec<u8> = [0x0000_u16, 0xFFFF].iter().flat_map(|x| x.to_le_bytes()).collect();
        let alpha = vec![255, 64];

        let synthetic = Synthetic::new(4, 2, 1, 48);
        let bytes = synthetic.file(&[layer(
            Rect::new(0, 0, 2, 1),
            &[red, green, blue, alpha],
            Framing::Modern
        )]);

        let document = PspDecoder::new(&bytes).decode().unwrap();
        assert_eq!(pixels(&document), [[255, 127, 0, 255], [0, 1, 255, 64]]);
    }

    #[test]
    fn save_rect_is_placed_on_the_canvas() {
        let synthetic = Synthetic::new(5, 4, 3, 24);
        let plane = vec![200_u8; 2];
        let bytes = synthetic.file(&[layer(
            Rect::new(2, 1, 4, 2),
            &[plane.clone(), plane.clone(), plane],
            Framing::Modern
        )]);

        let document = PspDecoder::new(&bytes).decode().unwrap();
        let layer = &document.layers[0];

        assert_eq!(layer.pixel(2, 1), Some([200, 200, 200, 255]));
        assert_eq!(layer.pixel(3, 1), Some([200, 200, 200, 255]));
        assert_eq!(layer.pixel(1, 1), Some([0, 0, 0, 0]));
        assert_eq!(layer.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn layer_marker_block_is_skipped() {
        let synthetic = Synthetic::new(10, 2, 1, 24);
        let version = synthetic.version;
        let record = layer(
            Rect::new(0, 0, 2, 1),
            &[vec![1, 2], vec![3, 4], vec![5, 6]],
            Framing::Modern
        );

        let mut writer = synthetic.header();
        write_block(&mut writer, BlockId::LayerStart as u16, Framing::Modern, 0, |w| {
            write_block(w, BlockId::Layer as u16, Framing::Modern, 0, |w| {
                record.info.write(w, version)?;
                write_block(w, PSP_X2_LAYER_MARKER_BLOCK, Framing::Modern, 0, |w| {
                    w.write_all(&[0xEE; 6]);
                    Ok(())
                })?;
                record.bitmap.write(w, Framing::Modern)
            })?;
            Ok(())
        })
        .unwrap();
        let bytes = writer.into_inner();

        let document = PspDecoder::new(&bytes).decode().unwrap();
        assert_eq!(pixels(&document), [[1, 3, 5, 255], [2, 4, 6, 255]]);
    }

    #[test]
    fn declared_layers_missing() {
        let mut synthetic = Synthetic::new(5, 1, 1, 24);
        synthetic.attributes.layer_count = 2;

        let plane = vec![1_u8];
        let bytes = synthetic.file(&[layer(
            Rect::new(0, 0, 1, 1),
            &[plane.clone(), plane.clone(), plane],
            Framing::Modern
        )]);

        let document = PspDecoder::new(&bytes).decode().unwrap();
        assert_eq!(document.layers.len(), 1);

        let options = DecoderOptions::default().set_strict_mode(true);
        assert!(matches!(
            PspDecoder::new_with_options(&bytes, options).decode(),
            Err(PspDecodeErrors::CorruptBlock { .. })
        ));
    }

    #[test]
    fn reencoding_keeps_pixels_of_any_depth() {
        let mut packed = Synthetic::new(3, 3, 2, 4);
        packed.palette = Some(primaries());
        let packed = packed.file(&[palette_layer(
            Rect::new(0, 0, 3, 2),
            &[vec![0x12, 0x30, 0x21, 0x00]],
            Framing::Legacy
        )]);

        let deep = Synthetic::new(5, 1, 2, 48).file(&[layer(
            Rect::new(0, 0, 1, 2),
            &[vec![0, 0, 0xFF, 0xFF], vec![0x34, 0x12, 0, 0x80], vec![9, 9, 9, 9]],
            Framing::Modern
        )]);

        for bytes in [packed, deep] {
            let document = PspDecoder::new(&bytes).decode().unwrap();

            for major in [3, 5] {
                let options = crate::PspEncoderOptions::default().set_version(major);
                let encoded = crate::PspEncoder::new(&document, options).encode().unwrap();
                let decoded = PspDecoder::new(&encoded).decode().unwrap();

                assert_eq!(pixels(&decoded), pixels(&document), "version {major}");
            }
        }
    }

    #[test]
    fn place_clips_to_canvas() {
        let mut layer = PspLayer::new("clip", 3, 3);
        let save_rect = Rect::new(1, 1, 5, 3);
        let pixels: Vec<u8> = (0..save_rect.width() * save_rect.height())
            .flat_map(|x| [x as u8, 0, 0, 255])
            .collect();

        let canvas = layer.bounds();
        place(&mut layer, &pixels, save_rect, canvas);

        assert_eq!(layer.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(layer.pixel(1, 1), Some([0, 0, 0, 255]));
        assert_eq!(layer.pixel(2, 1), Some([1, 0, 0, 255]));
        assert_eq!(layer.pixel(1, 2), Some([4, 0, 0, 255]));
        assert_eq!(layer.pixel(2, 2), Some([5, 0, 0, 255]));
    }

    #[test]
    fn resolution_requires_a_unit() {
        let mut attributes = ImageAttributes::new(1, 1, Default::default(), 1);
        attributes.resolution = 300.0;
        assert_eq!(resolution(&attributes), None);

        attributes.resolution_unit = ResolutionMetric::Centimeter;
        assert_eq!(
            resolution(&attributes),
            Some(Resolution {
                value: 300.0,
                unit:  ResolutionUnit::Centimeter
            })
        );
        attributes.resolution = 0.0;
        assert_eq!(resolution(&attributes), None);
    }

    #[test]
    fn short_input_is_not_a_psp_file() {
        let mut decoder = PspDecoder::new(b"Paint Shop Pro");
        assert!(matches!(
            decoder.decode_headers(),
            Err(PspDecodeErrors::InvalidSignature)
        ));
        assert!(decoder.dimensions().is_none());
    }
}
