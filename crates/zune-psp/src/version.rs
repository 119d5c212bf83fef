/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! File format versions
//!
//! Paint Shop Pro files come in two incompatible framing families.
//! Version 5 files (major version 3 and below) carry an extra
//! "initial length" in every block header, fixed size layer names and no
//! chunk sizes. Version 6 and later files drop the initial length and
//! prefix every chunk with its size so newer fields can be skipped.
//!
//! Every block codec receives a [`FormatVersion`] and matches on its
//! [`Framing`] instead of comparing major numbers in place.
use crate::constants::{
    PSP_MAJOR_VERSION_12, PSP_MAJOR_VERSION_5, PSP_MAJOR_VERSION_6, PSP_MAJOR_VERSION_7,
    PSP_MAJOR_VERSION_8
};

/// The two block framing conventions
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Framing {
    /// Paint Shop Pro 5 and earlier
    Legacy,
    /// Paint Shop Pro 6 and later
    Modern
}

/// Major and minor version stored after the file signature
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FormatVersion {
    pub major: u16,
    pub minor: u16
}

impl FormatVersion {
    pub const fn new(major: u16, minor: u16) -> FormatVersion {
        FormatVersion { major, minor }
    }

    pub const fn framing(self) -> Framing {
        if self.major <= PSP_MAJOR_VERSION_5 {
            Framing::Legacy
        } else {
            Framing::Modern
        }
    }

    pub const fn is_legacy(self) -> bool {
        matches!(self.framing(), Framing::Legacy)
    }

    /// Layer info chunks carry a highlight color from Paint Shop Pro 8 on
    pub const fn has_layer_highlight(self) -> bool {
        self.major >= PSP_MAJOR_VERSION_8
    }

    /// Paint Shop Pro X2 and later put a marker block before layer bitmaps
    pub const fn has_layer_marker_block(self) -> bool {
        self.major >= PSP_MAJOR_VERSION_12
    }

    /// Highest layer count the encoder may write for this version,
    /// `None` when no limit is known
    pub const fn max_layers(self) -> Option<usize> {
        match self.major {
            PSP_MAJOR_VERSION_5 => Some(64),
            PSP_MAJOR_VERSION_6 | PSP_MAJOR_VERSION_7 => Some(100),
            _ => None
        }
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        FormatVersion::new(PSP_MAJOR_VERSION_7, 0)
    }
}
