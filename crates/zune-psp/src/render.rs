/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Flattening and downscaling used for the stored previews
use crate::document::PspLayer;

/// Merge the visible layers of a canvas into one RGBA buffer.
///
/// Layers are drawn bottom to top with source-over compositing, the
/// effective source alpha is the pixel alpha scaled by the layer opacity.
/// Blend modes are not applied. `background` fills the canvas before the
/// first layer is drawn.
///
/// Layers whose buffers do not cover `width * height` pixels contribute
/// only the pixels they have.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn flatten(layers: &[PspLayer], width: usize, height: usize, background: [u8; 4]) -> Vec<u8> {
    let mut canvas = vec![0_u8; width * height * 4];

    canvas
        .chunks_exact_mut(4)
        .for_each(|pix| pix.copy_from_slice(&background));

    for layer in layers.iter().filter(|x| x.visible) {
        let opacity = f32::from(layer.opacity) / 255.0;

        if opacity <= 0.0 {
            continue;
        }

        for (dst, src) in canvas
            .chunks_exact_mut(4)
            .zip(layer.pixels().chunks_exact(4))
        {
            let src_alpha = f32::from(src[3]) / 255.0 * opacity;

            if src_alpha <= 0.0 {
                continue;
            }
            let dst_alpha = f32::from(dst[3]) / 255.0;
            let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

            for (d, s) in dst[..3].iter_mut().zip(&src[..3]) {
                let value = (f32::from(*s) * src_alpha
                    + f32::from(*d) * dst_alpha * (1.0 - src_alpha))
                    / out_alpha;
                *d = value.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
    canvas
}

/// Size of a preview that fits inside a `max` by `max` box keeping the aspect ratio.
///
/// Images already smaller than the box keep their size, degenerate sizes
/// produce a single pixel.
pub fn fit_dimensions(width: usize, height: usize, max: usize) -> (usize, usize) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    if width >= height {
        let new_width = width.min(max).max(1);
        let new_height = (height * new_width / width).max(1);
        (new_width, new_height)
    } else {
        let new_height = height.min(max).max(1);
        let new_width = (width * new_height / height).max(1);
        (new_width, new_height)
    }
}

/// Resize an RGBA buffer with bilinear interpolation
///
/// Sample coordinates are clamped to the source, so the output never reads
/// outside the image whichever direction the resize goes.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation
)]
pub fn resize_rgba(
    rgba: &[u8], in_width: usize, in_height: usize, out_width: usize, out_height: usize
) -> Vec<u8> {
    let mut output = vec![0_u8; out_width * out_height * 4];

    if in_width == 0 || in_height == 0 || out_width == 0 || out_height == 0 {
        return output;
    }
    if in_width == out_width && in_height == out_height {
        let len = output.len();
        output.copy_from_slice(&rgba[..len]);
        return output;
    }

    let w_ratio = in_width as f32 / out_width as f32;
    let h_ratio = in_height as f32 / out_height as f32;

    for (y, out_row) in output.chunks_exact_mut(out_width * 4).enumerate() {
        let new_y = y as f32 * h_ratio;
        let y0 = (new_y.floor() as usize).min(in_height - 1);
        let y1 = (y0 + 1).min(in_height - 1);
        let b = (new_y - y0 as f32).clamp(0.0, 1.0);

        for (x, pix) in out_row.chunks_exact_mut(4).enumerate() {
            let new_x = x as f32 * w_ratio;
            let x0 = (new_x.floor() as usize).min(in_width - 1);
            let x1 = (x0 + 1).min(in_width - 1);
            let a = (new_x - x0 as f32).clamp(0.0, 1.0);

            let p00 = (y0 * in_width + x0) * 4;
            let p10 = (y0 * in_width + x1) * 4;
            let p01 = (y1 * in_width + x0) * 4;
            let p11 = (y1 * in_width + x1) * 4;

            for (c, out) in pix.iter_mut().enumerate() {
                let value = f32::from(rgba[p00 + c]) * (1.0 - a) * (1.0 - b)
                    + f32::from(rgba[p10 + c]) * a * (1.0 - b)
                    + f32::from(rgba[p01 + c]) * (1.0 - a) * b
                    + f32::from(rgba[p11 + c]) * a * b;

                *out = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    output
}
