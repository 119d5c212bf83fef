/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![allow(dead_code)]

use nanorand::{Rng, WyRand};
use zune_psp::constants::BlendMode;
use zune_psp::{PspDocument, PspLayer};

/// Size of the signature and the version that follows it
pub const HEADER_SIZE: usize = 36;

/// Random pixels where fully transparent pixels are all zero, so they survive
/// the trip through a save rectangle unchanged
pub fn noise(width: usize, height: usize, with_alpha: bool, seed: u64) -> Vec<u8> {
    let mut rng = WyRand::new_seed(seed);
    let mut pixels = vec![0_u8; width * height * 4];
    rng.fill(&mut pixels);

    for pix in pixels.chunks_exact_mut(4) {
        if !with_alpha {
            pix[3] = 255;
        } else if pix[3] == 0 {
            pix.fill(0);
        }
    }
    pixels
}

/// Two layers, an opaque background and a partly transparent layer with
/// content in a corner only
pub fn two_layer_document(width: usize, height: usize) -> PspDocument {
    let mut document = PspDocument::new(width, height);

    let background =
        PspLayer::from_rgba("Background", width, height, noise(width, height, false, 7)).unwrap();

    let mut overlay = PspLayer::new("Overlay", width, height);
    let patch = noise(width / 2, height / 2, true, 11);

    for y in 0..height / 2 {
        for x in 0..width / 2 {
            let i = (y * (width / 2) + x) * 4;
            overlay.set_pixel(
                x + width / 4,
                y + height / 4,
                [patch[i], patch[i + 1], patch[i + 2], patch[i + 3]]
            );
        }
    }
    overlay.opacity = 180;
    overlay.blend_mode = BlendMode::Screen;

    document.layers.push(background);
    document.layers.push(overlay);
    document
}

/// Offsets and ids of the top level blocks, checking that every declared
/// length lands on the next block
pub fn walk_blocks(data: &[u8], legacy: bool) -> Vec<(usize, u16)> {
    let header_size = if legacy { 14 } else { 10 };
    let mut blocks = Vec::new();
    let mut position = HEADER_SIZE;

    while position < data.len() {
        assert_eq!(&data[position..position + 4], b"~BK\0", "block at {position}");

        let id = u16::from_le_bytes([data[position + 4], data[position + 5]]);
        let length_at = position + header_size - 4;
        let length = u32::from_le_bytes([
            data[length_at],
            data[length_at + 1],
            data[length_at + 2],
            data[length_at + 3]
        ]) as usize;

        blocks.push((position, id));
        position += header_size + length;
    }
    assert_eq!(position, data.len());
    blocks
}

/// A complete block with an arbitrary id and body
pub fn raw_block(id: u16, body: &[u8], legacy: bool) -> Vec<u8> {
    let mut block = b"~BK\0".to_vec();
    block.extend_from_slice(&id.to_le_bytes());

    if legacy {
        block.extend_from_slice(&(body.len() as u32).to_le_bytes());
    }
    block.extend_from_slice(&(body.len() as u32).to_le_bytes());
    block.extend_from_slice(body);
    block
}
