/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Paint Shop Pro run length coding
//!
//! A control byte `n` greater than 128 repeats the following byte `n - 128`
//! times, any other `n` copies the following `n` bytes verbatim.

/// Longest run a single control byte can describe
const MAX_RUN: usize = 127;
/// Longest literal a single control byte can describe
const MAX_LITERAL: usize = 128;
/// Shortest repeat worth encoding as a run
const MIN_RUN: usize = 3;

/// Decompress `input` into `output`
///
/// Decoding stops when either the input is exhausted or the output
/// is full, runs and literals that would overrun either buffer are cut short.
///
/// # Returns
/// The number of bytes written into `output`
pub fn decompress(input: &[u8], output: &mut [u8]) -> usize {
    let mut src = 0;
    let mut dst = 0;

    while src < input.len() && dst < output.len() {
        let control = usize::from(input[src]);
        src += 1;

        if control > 128 {
            let Some(&value) = input.get(src) else {
                break;
            };
            src += 1;

            let len = (control - 128).min(output.len() - dst);
            output[dst..dst + len].fill(value);
            dst += len;
        } else {
            let len = control.min(output.len() - dst).min(input.len() - src);

            output[dst..dst + len].copy_from_slice(&input[src..src + len]);
            src += len;
            dst += len;

            if len < control {
                break;
            }
        }
    }
    dst
}

/// Compress `input` so that [`decompress`] restores it exactly
pub fn compress(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len() + input.len() / MAX_LITERAL + 1);
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < input.len() {
        let value = input[pos];
        let run = input[pos..]
            .iter()
            .take(MAX_RUN)
            .take_while(|x| **x == value)
            .count();

        if run >= MIN_RUN {
            flush_literals(&input[literal_start..pos], &mut output);

            output.push((128 + run) as u8);
            output.push(value);
            pos += run;
            literal_start = pos;
        } else {
            pos += run;
        }
    }
    flush_literals(&input[literal_start..], &mut output);

    output
}

fn flush_literals(literals: &[u8], output: &mut Vec<u8>) {
    for chunk in literals.chunks(MAX_LITERAL) {
        output.push(chunk.len() as u8);
        output.extend_from_slice(chunk);
    }
}

#[cfg(test)]
mod tests {
    use nanorand::Rng;

    use super::*;

    #[test]
    fn decode_run_and_literal() {
        // 3 x 0x55, then literal [1, 2]
        let input = [131, 0x55, 2, 1, 2];
        let mut output = [0; 5];

        assert_eq!(decompress(&input, &mut output), 5);
        assert_eq!(output, [0x55, 0x55, 0x55, 1, 2]);
    }

    #[test]
    fn decode_never_overruns_output() {
        // a run of 127 into a 4 byte buffer
        let input = [255, 7, 100, 1, 2, 3];
        let mut output = [0; 4];

        assert_eq!(decompress(&input, &mut output), 4);
        assert_eq!(output, [7; 4]);
    }

    #[test]
    fn decode_truncated_input() {
        // literal claims 10 bytes but only 2 follow, and a run without its value
        let mut output = [0xEE; 8];
        assert_eq!(decompress(&[10, 1, 2], &mut output), 2);
        assert_eq!(&output[..3], &[1, 2, 0xEE]);

        let mut output = [0xEE; 8];
        assert_eq!(decompress(&[1, 9, 200], &mut output), 1);
        assert_eq!(output[0], 9);
    }

    #[test]
    fn round_trip_runs_and_noise() {
        let mut data = vec![0_u8; 4000];
        nanorand::WyRand::new_seed(7).fill(&mut data[..1000]);
        data[1000..2500].fill(42);
        for (i, x) in data[2500..].iter_mut().enumerate() {
            *x = (i / 5) as u8;
        }

        let compressed = compress(&data);
        let mut output = vec![0; data.len()];

        assert_eq!(decompress(&compressed, &mut output), data.len());
        assert_eq!(output, data);
        assert!(compressed.len() < data.len());
    }

    #[test]
    fn round_trip_random() {
        let mut rand = nanorand::WyRand::new();

        for len in [0, 1, 2, 3, 127, 128, 129, 300] {
            let mut data = vec![0_u8; len];
            // small alphabet so runs appear
            for x in data.iter_mut() {
                *x = rand.generate_range(0_u8..3);
            }
            let compressed = compress(&data);
            let mut output = vec![0; len];

            assert_eq!(decompress(&compressed, &mut output), len);
            assert_eq!(output, data);
        }
    }
}
