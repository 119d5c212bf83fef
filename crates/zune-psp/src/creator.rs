/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Creator block, authorship metadata stored as keyed fields
//!
//! The host document keeps this metadata as an opaque string, see
//! [`CreatorMetadata::to_json`] and [`CreatorMetadata::from_json`].
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::block::{write_block, write_field, BlockHeader, FieldHeader};
use crate::bytestream::{ByteReader, ByteWriter, StringTrim};
use crate::constants::{BlockId, CreatorFieldId};
use crate::errors::{PspDecodeErrors, PspEncodeErrors};
use crate::version::FormatVersion;

/// Metadata key the creator record is stored under in a [`PspDocument`](crate::PspDocument)
pub const CREATOR_METADATA_KEY: &str = "PSPFormatCreatorData2";

/// Authorship metadata
///
/// Dates are seconds since the Unix epoch, zero when absent.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatorMetadata {
    pub title:               String,
    pub create_date:         u32,
    /// Always rewritten with the save time
    #[serde(skip)]
    pub modified_date:       u32,
    pub artist:              String,
    pub copyright:           String,
    pub description:         String,
    #[serde(skip)]
    pub application_id:      Option<u32>,
    #[serde(skip)]
    pub application_version: Option<u32>
}

/// Current time as seconds since the Unix epoch
pub fn unix_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|x| u32::try_from(x.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

impl CreatorMetadata {
    /// A record for a document created now
    pub fn new() -> CreatorMetadata {
        CreatorMetadata {
            create_date: unix_timestamp(),
            ..Default::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a record produced by [`to_json`](Self::to_json), `None` if it is malformed
    pub fn from_json(json: &str) -> Option<CreatorMetadata> {
        match serde_json::from_str(json) {
            Ok(creator) => Some(creator),
            Err(err) => {
                debug!("Ignoring malformed creator metadata: {err}");
                None
            }
        }
    }

    /// Read the creator fields, the cursor must be past the block header
    pub fn read(reader: &mut ByteReader, header: &BlockHeader) -> Result<CreatorMetadata, PspDecodeErrors> {
        let mut creator = CreatorMetadata::default();

        while let Some(field) = FieldHeader::read_next(reader, header.body_end())? {
            let start = reader.position();
            let length = field.length as usize;

            match CreatorFieldId::from_int(field.id) {
                Some(CreatorFieldId::Title) => {
                    creator.title = reader.read_ascii(length, StringTrim::WhiteSpace)?;
                }
                Some(CreatorFieldId::Artist) => {
                    creator.artist = reader.read_ascii(length, StringTrim::WhiteSpace)?;
                }
                Some(CreatorFieldId::Copyright) => {
                    creator.copyright = reader.read_ascii(length, StringTrim::WhiteSpace)?;
                }
                Some(CreatorFieldId::Description) => {
                    creator.description = reader.read_ascii(length, StringTrim::WhiteSpace)?;
                }
                Some(CreatorFieldId::CreateDate) => {
                    creator.create_date = read_u32_field(reader, length)?.unwrap_or(0);
                }
                Some(CreatorFieldId::ModifiedDate) => {
                    creator.modified_date = read_u32_field(reader, length)?.unwrap_or(0);
                }
                Some(CreatorFieldId::ApplicationId) => {
                    creator.application_id = read_u32_field(reader, length)?;
                }
                Some(CreatorFieldId::ApplicationVersion) => {
                    creator.application_version = read_u32_field(reader, length)?;
                }
                None => debug!("Skipping unknown creator field {}", field.id)
            }
            reader.set_position(start.saturating_add(length))?;
        }
        trace!("Creator: {creator:?}");

        Ok(creator)
    }

    /// Write the creator block, the modified date is set to `modified_date`
    pub fn write(
        &self, writer: &mut ByteWriter, version: FormatVersion, modified_date: u32
    ) -> Result<(), PspEncodeErrors> {
        write_block(
            writer,
            BlockId::Creator as u16,
            version.framing(),
            0,
            |w| {
                if !self.title.is_empty() {
                    write_ascii_field(w, CreatorFieldId::Title, &self.title)?;
                }
                if self.create_date != 0 {
                    write_field(
                        w,
                        CreatorFieldId::CreateDate as u16,
                        &self.create_date.to_le_bytes()
                    )?;
                }
                write_field(
                    w,
                    CreatorFieldId::ModifiedDate as u16,
                    &modified_date.to_le_bytes()
                )?;

                if !self.artist.is_empty() {
                    write_ascii_field(w, CreatorFieldId::Artist, &self.artist)?;
                }
                if !self.copyright.is_empty() {
                    write_ascii_field(w, CreatorFieldId::Copyright, &self.copyright)?;
                }
                if !self.description.is_empty() {
                    write_ascii_field(w, CreatorFieldId::Description, &self.description)?;
                }
                Ok(())
            }
        )?;
        Ok(())
    }
}

/// A 32 bit field value, `None` when the field is too short to hold one
fn read_u32_field(reader: &mut ByteReader, length: usize) -> Result<Option<u32>, PspDecodeErrors> {
    if length < 4 {
        return Ok(None);
    }
    Ok(Some(reader.get_u32_le_err()?))
}

fn write_ascii_field(writer: &mut ByteWriter, id: CreatorFieldId, value: &str) -> Result<(), PspEncodeErrors> {
    let bytes: Vec<u8> = value
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();

    write_field(writer, id as u16, &bytes)
}
