/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! A Paint Shop Pro (`.psp`, `.pspimage`) decoder and encoder
//!
//! The decoder reads every raster layer of Paint Shop Pro 5 through X-era
//! files into RGBA layers, along with the creator metadata and the stored
//! previews. The encoder writes version 5, 6 and 7 files with one 24 bit
//! raster layer per document layer.
//!
//! Supported on decode
//! - 1, 4 and 8 bit palette images, with transparency masks and a transparent index
//! - 24 bit and 48 bit RGB images, with transparency masks
//! - Uncompressed, RLE and LZ77 channels
//!
//! Vector, adjustment, group and mask layers are skipped, blend modes are
//! carried but never applied.
//!
//! # Example
//! Decode a file and inspect its layers
//! ```no_run
//! use zune_psp::PspDecoder;
//!
//! let data = std::fs::read("image.pspimage").unwrap();
//! let mut decoder = PspDecoder::new(&data);
//! let document = decoder.decode().unwrap();
//!
//! println!("{}x{}, {} layers", document.width, document.height, document.layers.len());
//! ```
//!
//! Write a document as a Paint Shop Pro 6 file
//! ```
//! use zune_psp::constants::Compression;
//! use zune_psp::{PspDecoder, PspDocument, PspEncoder, PspEncoderOptions, PspLayer};
//!
//! let mut document = PspDocument::new(8, 8);
//! let mut layer = PspLayer::new("Background", 8, 8);
//! layer.set_pixel(1, 1, [0, 128, 255, 255]);
//! document.layers.push(layer);
//!
//! let options = PspEncoderOptions::default()
//!     .set_version(4)
//!     .set_compression(Compression::RLE);
//! let bytes = PspEncoder::new(&document, options).encode().unwrap();
//!
//! let decoded = PspDecoder::new(&bytes).decode().unwrap();
//! assert_eq!(decoded.layers[0].pixel(1, 1), Some([0, 128, 255, 255]));
//! ```
#![forbid(unsafe_code)]

pub extern crate zune_core;

pub use composite::PspPreview;
pub use creator::CreatorMetadata;
pub use decoder::PspDecoder;
pub use document::{PspDocument, PspLayer, Resolution, ResolutionUnit};
pub use encoder::{PspEncoder, PspEncoderOptions};
pub use version::FormatVersion;

pub mod attributes;
mod block;
mod bytestream;
mod channel;
pub mod composite;
pub mod constants;
pub mod creator;
mod decoder;
mod deflate;
mod document;
mod encoder;
pub mod errors;
mod extended;
pub mod layer;
pub mod palette;
mod pixels;
mod render;
mod rle;
pub mod version;
