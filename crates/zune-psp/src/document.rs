/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The in memory image a decoder produces and an encoder consumes
use std::collections::BTreeMap;

use crate::constants::BlendMode;
use crate::creator::{CreatorMetadata, CREATOR_METADATA_KEY};
use crate::errors::PspDecodeErrors;
use crate::layer::Rect;
use crate::pixels;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResolutionUnit {
    Inch,
    Centimeter
}

/// Pixels per [`ResolutionUnit`]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Resolution {
    pub value: f64,
    pub unit:  ResolutionUnit
}

/// A layer of a document, its pixel buffer always covers the whole canvas
///
/// Pixels are RGBA with 8 bits per channel, not premultiplied.
#[derive(Debug, Clone, PartialEq)]
pub struct PspLayer {
    pub name:       String,
    pub opacity:    u8,
    pub blend_mode: BlendMode,
    pub visible:    bool,
    width:          usize,
    height:         usize,
    pixels:         Vec<u8>
}

impl PspLayer {
    /// A fully transparent, visible layer
    pub fn new(name: &str, width: usize, height: usize) -> PspLayer {
        PspLayer {
            name: name.to_string(),
            opacity: 255,
            blend_mode: BlendMode::Normal,
            visible: true,
            width,
            height,
            pixels: vec![0; width * height * 4]
        }
    }

    /// A visible layer holding `pixels`, which must be `width * height * 4` bytes
    pub fn from_rgba(
        name: &str, width: usize, height: usize, pixels: Vec<u8>
    ) -> Result<PspLayer, PspDecodeErrors> {
        if pixels.len() != width * height * 4 {
            return Err(PspDecodeErrors::Generic(
                "Pixel buffer does not match the layer dimensions"
            ));
        }
        let mut layer = PspLayer::new(name, 0, 0);
        layer.width = width;
        layer.height = height;
        layer.pixels = pixels;

        Ok(layer)
    }

    pub const fn width(&self) -> usize {
        self.width
    }

    pub const fn height(&self) -> usize {
        self.height
    }

    /// The canvas rectangle
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, clamp_i32(self.width), clamp_i32(self.height))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// The pixel at `x`, `y`, `None` outside the canvas
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y * self.width + x) * 4;
        let pix = &self.pixels[start..start + 4];

        Some([pix[0], pix[1], pix[2], pix[3]])
    }

    /// Set one pixel, writes outside the canvas are ignored
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let start = (y * self.width + x) * 4;
        self.pixels[start..start + 4].copy_from_slice(&rgba);
    }

    /// The smallest rectangle holding every pixel that is not fully transparent,
    /// empty when the layer has no visible content
    pub fn save_rectangle(&self) -> Rect {
        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0;
        let mut max_y = 0;

        if self.width == 0 {
            return Rect::empty();
        }

        for (y, row) in self.pixels.chunks_exact(self.width * 4).enumerate() {
            for (x, pix) in row.chunks_exact(4).enumerate() {
                if pix[3] > 0 {
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }
        if min_x == usize::MAX {
            return Rect::empty();
        }
        Rect::new(
            clamp_i32(min_x),
            clamp_i32(min_y),
            clamp_i32(max_x + 1),
            clamp_i32(max_y + 1)
        )
    }

    /// Whether any pixel inside `rect` is not fully opaque
    pub fn has_transparency(&self, rect: Rect) -> bool {
        let rect = rect.intersect(&self.bounds());
        pixels::has_transparency(&self.pixels, self.width, rect)
    }
}

fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// A decoded or to be encoded image
#[derive(Debug, Clone, PartialEq)]
pub struct PspDocument {
    pub width:      usize,
    pub height:     usize,
    pub resolution: Option<Resolution>,
    /// Bottom layer first
    pub layers:     Vec<PspLayer>,
    /// Opaque key value store, carries the creator record between loads and saves
    pub metadata:   BTreeMap<String, String>
}

impl PspDocument {
    /// An empty document, layers are added by the caller
    pub fn new(width: usize, height: usize) -> PspDocument {
        PspDocument {
            width,
            height,
            resolution: None,
            layers: Vec::new(),
            metadata: BTreeMap::new()
        }
    }

    /// Creator record stored in the metadata, if present and readable
    pub fn creator(&self) -> Option<CreatorMetadata> {
        self.metadata
            .get(CREATOR_METADATA_KEY)
            .and_then(|json| CreatorMetadata::from_json(json))
    }

    pub fn set_creator(&mut self, creator: &CreatorMetadata) -> Result<(), serde_json::Error> {
        let json = creator.to_json()?;
        self.metadata.insert(CREATOR_METADATA_KEY.to_string(), json);
        Ok(())
    }
}
