/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Extended data block
use log::trace;

use crate::block::{BlockHeader, FieldHeader};
use crate::bytestream::ByteReader;
use crate::constants::ExtendedDataId;
use crate::errors::PspDecodeErrors;
#[cfg(test)]
use crate::version::FormatVersion;

/// Keyed fields in file order
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct ExtendedData {
    pub fields: Vec<(u16, Vec<u8>)>
}

impl ExtendedData {
    /// Read fields until the end of the block or a foreign signature
    pub fn read(reader: &mut ByteReader, header: &BlockHeader) -> Result<ExtendedData, PspDecodeErrors> {
        let mut fields = Vec::new();

        while let Some(field) = FieldHeader::read_next(reader, header.body_end())? {
            let payload = reader.read_bytes(field.length as usize)?;
            trace!("Extended data field {}, {} bytes", field.id, field.length);

            fields.push((field.id, payload.to_vec()));
        }
        Ok(ExtendedData { fields })
    }

    /// The palette index rendered fully transparent, if any
    ///
    /// Stored as a signed 16 bit value at the start of the first
    /// transparency index field, negative values mean none.
    pub fn transparency_index(&self) -> Option<usize> {
        self.fields
            .iter()
            .find(|(id, _)| *id == ExtendedDataId::TransparencyIndex as u16)
            .and_then(|(_, payload)| payload.get(..2))
            .map(|x| i16::from_le_bytes([x[0], x[1]]))
            .and_then(|index| usize::try_from(index).ok())
    }
}

/// Write an extended data block holding `fields`
#[cfg(test)]
pub(crate) fn write_extended_block(
    writer: &mut crate::bytestream::ByteWriter, version: FormatVersion, fields: &[(u16, Vec<u8>)]
) {
    use crate::block::{write_block, write_field};
    use crate::constants::BlockId;

    write_block(
        writer,
        BlockId::ExtendedData as u16,
        version.framing(),
        0,
        |w| {
            for (id, payload) in fields {
                write_field(w, *id, payload)?;
            }
            Ok(())
        }
    )
    .unwrap();
}
