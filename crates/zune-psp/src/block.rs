/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Block and field framing
//!
//! A block is `signature, id, [initial length], length, body`, the initial
//! length is only present in legacy files. Fields are the key/value entries
//! of the creator and extended data blocks.
use log::trace;

use crate::bytestream::{ByteReader, ByteWriter};
use crate::constants::{PSP_BLOCK_IDENTIFIER, PSP_FIELD_IDENTIFIER};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::version::Framing;

/// A parsed block header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BlockHeader {
    /// Offset of the block signature
    pub offset:         usize,
    /// Raw block id, unknown ids are kept so the block can be skipped
    pub id:             u16,
    /// Legacy only, historically the size of the fixed part of the body
    pub initial_length: Option<u32>,
    /// Size of the body in bytes
    pub length:         u32,
    /// Offset of the first body byte
    pub body_start:     usize
}

impl BlockHeader {
    /// Read a block header at the cursor
    pub fn read(reader: &mut ByteReader, framing: Framing) -> Result<BlockHeader, PspDecodeErrors> {
        let offset = reader.position();
        let signature = reader.get_u32_le_err()?;

        if signature != PSP_BLOCK_IDENTIFIER {
            return Err(PspDecodeErrors::InvalidBlockSignature {
                offset,
                found: signature
            });
        }
        let id = reader.get_u16_le_err()?;

        let initial_length = match framing {
            Framing::Legacy => Some(reader.get_u32_le_err()?),
            Framing::Modern => None
        };
        let length = reader.get_u32_le_err()?;

        trace!("Block {id} at offset {offset}, length {length}");

        Ok(BlockHeader {
            offset,
            id,
            initial_length,
            length,
            body_start: reader.position()
        })
    }

    /// Read a block header and require it to carry `expected` as its id
    pub fn read_expecting(
        reader: &mut ByteReader, framing: Framing, expected: u16
    ) -> Result<BlockHeader, PspDecodeErrors> {
        let header = BlockHeader::read(reader, framing)?;

        if header.id != expected {
            return Err(PspDecodeErrors::UnexpectedBlockType {
                offset: header.offset,
                expected,
                found: header.id
            });
        }
        Ok(header)
    }

    /// Offset one past the last body byte
    pub const fn body_end(&self) -> usize {
        self.body_start + self.length as usize
    }
}

/// Write a block signature and id, plus `initial_length` for legacy files.
///
/// The caller writes the length field next, either as a fixed value or
/// through a length scope.
pub fn write_block_start(writer: &mut ByteWriter, id: u16, framing: Framing, initial_length: u32) {
    writer.write_u32_le(PSP_BLOCK_IDENTIFIER);
    writer.write_u16_le(id);

    if framing == Framing::Legacy {
        writer.write_u32_le(initial_length);
    }
}

/// Write a complete block whose length is computed from what `body` writes
pub fn write_block<F>(
    writer: &mut ByteWriter, id: u16, framing: Framing, initial_length: u32, body: F
) -> Result<usize, PspEncodeErrors>
where
    F: FnOnce(&mut ByteWriter) -> Result<(), PspEncodeErrors>
{
    write_block_start(writer, id, framing, initial_length);
    writer.write_length_scoped(body)
}

/// A parsed field header
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FieldHeader {
    pub id:     u16,
    pub length: u32
}

impl FieldHeader {
    /// Read the next field header of a field list ending at `end`
    ///
    /// Returns `None` once the cursor reaches `end` or the next four bytes
    /// are not a field signature.
    pub fn read_next(reader: &mut ByteReader, end: usize) -> Result<Option<FieldHeader>, PspDecodeErrors> {
        if reader.position() >= end {
            return Ok(None);
        }
        if reader.get_u32_le_err()? != PSP_FIELD_IDENTIFIER {
            return Ok(None);
        }
        let id = reader.get_u16_le_err()?;
        let length = reader.get_u32_le_err()?;

        Ok(Some(FieldHeader { id, length }))
    }
}

/// Write a field carrying `payload`
pub fn write_field(writer: &mut ByteWriter, id: u16, payload: &[u8]) -> Result<(), PspEncodeErrors> {
    let length =
        u32::try_from(payload.len()).map_err(|_| PspEncodeErrors::BlockTooLarge(payload.len()))?;

    writer.write_u32_le(PSP_FIELD_IDENTIFIER);
    writer.write_u16_le(id);
    writer.write_u32_le(length);
    writer.write_all(payload);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_header_carries_initial_length() {
        let mut writer = ByteWriter::new();
        write_block_start(&mut writer, 4, Framing::Legacy, 375);
        writer.write_u32_le(2);
        writer.write_all(&[1, 2]);

        let bytes = writer.into_inner();
        assert_eq!(bytes.len(), 4 + 2 + 4 + 4 + 2);

        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, Framing::Legacy).unwrap();

        assert_eq!(header.id, 4);
        assert_eq!(header.initial_length, Some(375));
        assert_eq!(header.length, 2);
        assert_eq!(header.body_start, 14);
        assert_eq!(header.body_end(), bytes.len());
    }

    #[test]
    fn modern_block_length_is_patched() {
        let mut writer = ByteWriter::new();
        let length = write_block(&mut writer, 0x10, Framing::Modern, 0, |w| {
            w.write_u32_le(8);
            w.write_u32_le(2);
            Ok(())
        })
        .unwrap();
        assert_eq!(length, 8);

        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        let header = BlockHeader::read(&mut reader, Framing::Modern).unwrap();

        assert_eq!(header.initial_length, None);
        assert_eq!(header.length, 8);
        assert_eq!(header.body_end(), bytes.len());
    }

    #[test]
    fn bad_signature_reports_offset() {
        let bytes = [0_u8; 16];
        let mut reader = ByteReader::new(&bytes);
        reader.skip(2).unwrap();

        match BlockHeader::read(&mut reader, Framing::Modern) {
            Err(PspDecodeErrors::InvalidBlockSignature { offset, found }) => {
                assert_eq!(offset, 2);
                assert_eq!(found, 0);
            }
            _ => panic!("Expected an invalid block signature")
        }
    }

    #[test]
    fn unexpected_block_type() {
        let mut writer = ByteWriter::new();
        write_block_start(&mut writer, 2, Framing::Modern, 0);
        writer.write_u32_le(0);
        let bytes = writer.into_inner();

        let mut reader = ByteReader::new(&bytes);
        let err = BlockHeader::read_expecting(&mut reader, Framing::Modern, 5);
        assert!(matches!(
            err,
            Err(PspDecodeErrors::UnexpectedBlockType {
                expected: 5,
                found: 2,
                ..
            })
        ));
    }

    #[test]
    fn field_list_stops_at_end_and_foreign_signature() {
        let mut writer = ByteWriter::new();
        write_field(&mut writer, 3, b"abc").unwrap();
        writer.write_u32_le(PSP_BLOCK_IDENTIFIER);
        let bytes = writer.into_inner();

        let mut reader = ByteReader::new(&bytes);
        let field = FieldHeader::read_next(&mut reader, bytes.len()).unwrap().unwrap();
        assert_eq!(field, FieldHeader { id: 3, length: 3 });
        reader.skip(3).unwrap();

        assert!(FieldHeader::read_next(&mut reader, bytes.len())
            .unwrap()
            .is_none());

        let mut reader = ByteReader::new(&bytes);
        assert!(FieldHeader::read_next(&mut reader, 0).unwrap().is_none());
    }
}
