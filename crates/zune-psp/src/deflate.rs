/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! The "LZ77" compression of the format, a zlib wrapped deflate stream
use std::io::Write;

use flate2::write::ZlibEncoder;
use log::warn;
use zune_inflate::errors::DecodeErrorStatus;
use zune_inflate::{DeflateDecoder, DeflateOptions};

use crate::errors::{PspDecodeErrors, PspEncodeErrors};

/// Inflate a zlib stream into exactly `uncompressed_length` bytes
///
/// Output past `uncompressed_length` is discarded. A stream that ends early
/// is an error in strict mode, otherwise the missing tail is zero filled.
pub fn inflate_zlib(
    data: &[u8], uncompressed_length: usize, strict: bool
) -> Result<Vec<u8>, PspDecodeErrors> {
    if uncompressed_length == 0 {
        return Ok(Vec::new());
    }
    let options = DeflateOptions::default()
        .set_limit(uncompressed_length)
        .set_size_hint(uncompressed_length);

    let mut decoder = DeflateDecoder::new_with_options(data, options);

    let mut output = match decoder.decode_zlib() {
        Ok(output) => output,
        Err(err) => match err.error {
            // the stream holds more than the plane, the rest is ignored
            DecodeErrorStatus::OutputLimitExceeded(_, _)
                if err.data.len() >= uncompressed_length =>
            {
                err.data
            }
            status => {
                return Err(PspDecodeErrors::CompressedDataCorrupt(format!(
                    "{status:?}"
                )))
            }
        }
    };

    if output.len() < uncompressed_length {
        if strict {
            return Err(PspDecodeErrors::CompressedDataCorrupt(format!(
                "stream produced {} bytes, expected {uncompressed_length}",
                output.len()
            )));
        }
        warn!(
            "Deflate stream produced {} bytes, expected {}, padding with zeroes",
            output.len(),
            uncompressed_length
        );
    }
    output.resize(uncompressed_length, 0);

    Ok(output)
}

/// Deflate `data` at the highest compression level
pub fn deflate_zlib(data: &[u8]) -> Result<Vec<u8>, PspEncodeErrors> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2),
        flate2::Compression::best()
    );
    encoder.write_all(data)?;

    Ok(encoder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let data: Vec<u8> = (0..10_000_u32).map(|x| (x % 251) as u8).collect();
        let compressed = deflate_zlib(&data).unwrap();

        assert!(compressed.len() < data.len());
        assert_eq!(inflate_zlib(&compressed, data.len(), true).unwrap(), data);
    }

    #[test]
    fn trailing_output_is_ignored() {
        let data = vec![3_u8; 500];
        let compressed = deflate_zlib(&data).unwrap();

        let output = inflate_zlib(&compressed, 100, true).unwrap();
        assert_eq!(output, vec![3_u8; 100]);
    }

    #[test]
    fn short_stream() {
        let data = vec![9_u8; 50];
        let compressed = deflate_zlib(&data).unwrap();

        assert!(inflate_zlib(&compressed, 80, true).is_err());

        let output = inflate_zlib(&compressed, 80, false).unwrap();
        assert_eq!(&output[..50], &data[..]);
        assert_eq!(&output[50..], &[0; 30]);
    }

    #[test]
    fn garbage_is_corrupt() {
        let result = inflate_zlib(&[0xFF, 0xFF, 0x12, 0x34, 0x56], 16, false);
        assert!(matches!(
            result,
            Err(PspDecodeErrors::CompressedDataCorrupt(_))
        ));
    }
}
